//! Transport error mapping shared by every provider call.

pub use oauth2;

// crates.io
use oauth2::HttpClientError;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	obs::OperationKind,
};

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a broker error.
	fn map_transport_error(&self, operation: OperationKind, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		operation: OperationKind,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(operation, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(operation, message),
			_ => map_unknown_transport_error(operation),
		}
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(operation: OperationKind, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Other {
			message: format!("Request timed out during {operation}"),
		}
		.into();
	}

	TransportError::from(err).into()
}

/// Maps [`HttpClientError::Other`] payloads.
pub fn map_generic_transport_error(operation: OperationKind, message: impl Display) -> Error {
	TransportError::Other { message: format!("{message} (during {operation})") }.into()
}

/// Maps transport error variants added after this crate was written.
pub fn map_unknown_transport_error(operation: OperationKind) -> Error {
	TransportError::Other { message: format!("Unrecognized transport failure during {operation}") }
		.into()
}

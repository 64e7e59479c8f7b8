//! Broker-level error types shared across configuration, flows, the dispatcher, and admin calls.

// std
use std::path::PathBuf;
// self
use crate::{_prelude::*, http::ProviderResponse};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Installation descriptor is missing or malformed.
	#[error(transparent)]
	Setup(#[from] SetupError),
	/// Provider discovery document could not be fetched or parsed.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),
	/// Local configuration problem (URLs, request construction, HTTP client).
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// A provider payload could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Provider answered outside the success band while the policy is
	/// [`Raise`](crate::policy::ExceptionPolicy::Raise).
	#[error(transparent)]
	ProviderHttp(#[from] ProviderHttpError),

	/// The session provider has no token callback registered.
	#[error("No session token callback is registered.")]
	CookieTokenNotDefined,
	/// The session provider has no external-attributes callback registered.
	#[error("No external attributes callback is registered.")]
	ExternalAttributesNotDefined,
	/// The session provider reported no active session for an operation that needs one.
	#[error("No active session token is available.")]
	NoActiveSession,
	/// An admin lookup by username or email matched no user.
	#[error("No user matches the login `{login}`.")]
	UserLoginNotFound {
		/// Username or email that was searched.
		login: String,
	},
	/// An admin lookup by client identifier matched no client of the realm.
	#[error("No client matches the client id `{client_id}`.")]
	ClientNotFound {
		/// Client identifier that was searched.
		client_id: String,
	},
	/// The dispatcher was asked for an HTTP verb it does not support.
	#[error("Unsupported HTTP method `{method}`.")]
	InvalidMethod {
		/// Verb that was rejected.
		method: String,
	},
}
impl Error {
	/// Returns `true` for failures that belong to the broker taxonomy.
	///
	/// Role checks propagate typed failures and treat everything else (undecodable payloads,
	/// network failures) as "not signed in".
	pub fn is_typed(&self) -> bool {
		!matches!(self, Self::Decode(_) | Self::Transport(_))
	}

	/// Returns the provider response carried by a [`ProviderHttpError`], if any.
	pub fn provider_response(&self) -> Option<&ProviderResponse> {
		match self {
			Self::ProviderHttp(err) => Some(&err.response),
			_ => None,
		}
	}
}

/// Installation descriptor failures.
#[derive(Debug, ThisError)]
pub enum SetupError {
	/// Descriptor file could not be read.
	#[error("Installation descriptor `{}` could not be read.", .path.display())]
	Missing {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Descriptor JSON does not match the expected shape.
	#[error("Installation descriptor is malformed at `{}`.", .source.path())]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Descriptor carries an unusable server URL.
	#[error("Installation descriptor has an invalid auth-server-url `{url}`.")]
	InvalidServerUrl {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Discovery document failures.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// Discovery endpoint answered with a non-success status.
	#[error("Discovery document request returned HTTP {}.", .response.status)]
	Status {
		/// Raw provider response.
		response: ProviderResponse,
	},
	/// Discovery document JSON does not match the expected shape.
	#[error("Discovery document is malformed at `{}`.", .source.path())]
	Malformed {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and request construction failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A URL derived from the configuration cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A base URL cannot carry path segments.
	#[error("URL `{url}` cannot be used as a base.")]
	CannotBeABase {
		/// Offending URL string.
		url: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Payload decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Provider responded with JSON that does not match the expected shape.
	#[error("Provider returned malformed JSON at `{}`.", .source.path())]
	Json {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Token is not a three-part JWT.
	#[error("Token is not a JWT.")]
	JwtShape,
	/// JWT payload is not valid base64url.
	#[error("JWT payload is not valid base64url.")]
	JwtEncoding(#[source] base64::DecodeError),
}
impl DecodeError {
	pub(crate) fn json(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Json { source }
	}
}

/// Provider answered outside the success band for the operation.
#[derive(Debug, ThisError)]
#[error("Provider returned HTTP {} for {operation}.", .response.status)]
pub struct ProviderHttpError {
	/// Operation label (`token_exchange`, `dispatch`, ...).
	pub operation: &'static str,
	/// Raw provider response.
	pub response: ProviderResponse,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Deserializes `bytes` with path-aware errors.
pub(crate) fn decode_json<T>(
	bytes: &[u8],
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de)
}

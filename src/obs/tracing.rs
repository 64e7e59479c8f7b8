// self
use crate::{_prelude::*, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("keycloak_broker.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a failed service-token release that was not allowed to replace the work result.
pub fn warn_release_failure(err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "service account token release failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Logs a provider response routed through the swallow policy.
pub fn debug_swallowed(kind: OperationKind, status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), status, "provider failure returned to caller");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, status);
	}
}

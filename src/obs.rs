//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `keycloak_broker.operation` with the
//!   `operation` and `stage` (call site) fields, plus warn events for failed token releases.
//! - Enable `metrics` to increment the `keycloak_broker_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Provider operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Well-known discovery document fetch.
	Discovery,
	/// Token endpoint exchange (any grant).
	TokenExchange,
	/// Token introspection.
	Introspection,
	/// Userinfo lookup.
	Userinfo,
	/// End-session (logout or service token release).
	Logout,
	/// Authenticated admin request.
	Dispatch,
	/// Service-account transaction (acquire, use, release).
	ServiceAccount,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Discovery => "discovery",
			OperationKind::TokenExchange => "token_exchange",
			OperationKind::Introspection => "introspection",
			OperationKind::Userinfo => "userinfo",
			OperationKind::Logout => "logout",
			OperationKind::Dispatch => "dispatch",
			OperationKind::ServiceAccount => "service_account",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a broker operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated (or swallowed) back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

//! Exception policy: the single switch between raising on provider failures and handing the
//! raw failing response back to the caller.

// self
use crate::{_prelude::*, error::ProviderHttpError, http::ProviderResponse};

/// How non-success provider responses surface to callers.
///
/// The policy applies uniformly to token exchange, introspection, logout, userinfo, and the
/// admin dispatcher. Setup and session-callback errors always raise regardless of it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionPolicy {
	/// Return `Err(Error::ProviderHttp(..))` for every response outside the success band.
	#[default]
	Raise,
	/// Return `Ok(Outcome::Rejected(..))` carrying the raw response instead.
	Swallow,
}
impl ExceptionPolicy {
	/// Resolves an optional policy; an unset policy means [`ExceptionPolicy::Raise`].
	pub fn resolve(policy: Option<Self>) -> Self {
		policy.unwrap_or_default()
	}

	/// Routes a failing response through the policy.
	pub fn reject<T>(
		self,
		operation: &'static str,
		response: ProviderResponse,
	) -> Result<Outcome<T>> {
		match self {
			Self::Raise => Err(ProviderHttpError { operation, response }.into()),
			Self::Swallow => Ok(Outcome::Rejected(response)),
		}
	}

	/// Routes a transport failure through the policy.
	///
	/// Only the admin dispatcher downgrades transport failures; every other operation
	/// propagates them.
	pub(crate) fn unreachable<T>(self, err: Error) -> Result<Outcome<T>> {
		match self {
			Self::Raise => Err(err),
			Self::Swallow => Ok(Outcome::Unreachable(err.to_string())),
		}
	}
}

/// Result of a provider call once the [`ExceptionPolicy`] has been applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
	/// Provider answered inside the success band.
	Success(T),
	/// Provider answered outside the success band (swallow policy only).
	Rejected(ProviderResponse),
	/// Transport failed before a response arrived (dispatcher under the swallow policy only).
	Unreachable(String),
}
impl<T> Outcome<T> {
	/// Returns the success value, if any.
	pub fn success(self) -> Option<T> {
		match self {
			Self::Success(value) => Some(value),
			_ => None,
		}
	}

	/// Returns `true` for [`Outcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success(_))
	}

	/// Maps the success value.
	pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
		match self {
			Self::Success(value) => Outcome::Success(f(value)),
			Self::Rejected(response) => Outcome::Rejected(response),
			Self::Unreachable(message) => Outcome::Unreachable(message),
		}
	}

	/// Maps the success value through a fallible function.
	pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Outcome<U>> {
		match self {
			Self::Success(value) => f(value).map(Outcome::Success),
			Self::Rejected(response) => Ok(Outcome::Rejected(response)),
			Self::Unreachable(message) => Ok(Outcome::Unreachable(message)),
		}
	}

	/// Converts the outcome back into a plain result, raising on anything but success.
	pub fn into_result(self, operation: &'static str) -> Result<T> {
		match self {
			Self::Success(value) => Ok(value),
			Self::Rejected(response) => Err(ProviderHttpError { operation, response }.into()),
			Self::Unreachable(message) =>
				Err(crate::error::TransportError::Other { message }.into()),
		}
	}
}

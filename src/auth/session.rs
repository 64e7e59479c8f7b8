//! Host session boundary.
//!
//! The broker never stores tokens. Whatever holds the signed-in user's token (a cookie, a
//! server-side session) is exposed through [`SessionProvider`], injected at construction time.

// self
use crate::{_prelude::*, auth::TokenResponse};

type TokenCallback = Arc<dyn Fn() -> Option<String> + Send + Sync>;
type AttributesCallback = Arc<dyn Fn() -> JsonValue + Send + Sync>;

/// Capability the host supplies so the broker can find the current session token and any
/// externally stored user attributes.
///
/// Both hooks default to the "not configured" errors, so an implementation only overrides what
/// it actually provides.
pub trait SessionProvider: Send + Sync {
	/// Current session token; `Ok(None)` when nobody is signed in.
	fn current_token(&self) -> Result<Option<TokenResponse>> {
		Err(Error::CookieTokenNotDefined)
	}

	/// Host-managed attributes for the current user.
	fn external_attributes(&self) -> Result<JsonValue> {
		Err(Error::ExternalAttributesNotDefined)
	}
}

/// Session provider for hosts that registered nothing; every hook fails fast.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredSession;
impl SessionProvider for UnconfiguredSession {}

/// Session provider backed by host closures.
///
/// The token closure returns the serialized token JSON (typically a cookie value), or `None`
/// when there is no session.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
	token: Option<TokenCallback>,
	attributes: Option<AttributesCallback>,
}
impl SessionCallbacks {
	/// Creates a provider with no callbacks registered.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the token callback.
	pub fn with_token<F>(mut self, callback: F) -> Self
	where
		F: 'static + Fn() -> Option<String> + Send + Sync,
	{
		self.token = Some(Arc::new(callback));

		self
	}

	/// Registers the external-attributes callback.
	pub fn with_external_attributes<F>(mut self, callback: F) -> Self
	where
		F: 'static + Fn() -> JsonValue + Send + Sync,
	{
		self.attributes = Some(Arc::new(callback));

		self
	}
}
impl SessionProvider for SessionCallbacks {
	fn current_token(&self) -> Result<Option<TokenResponse>> {
		let callback = self.token.as_ref().ok_or(Error::CookieTokenNotDefined)?;

		match callback() {
			Some(raw) if !raw.trim().is_empty() =>
				TokenResponse::from_json(raw.as_bytes()).map(Some),
			_ => Ok(None),
		}
	}

	fn external_attributes(&self) -> Result<JsonValue> {
		let callback = self.attributes.as_ref().ok_or(Error::ExternalAttributesNotDefined)?;

		Ok(callback())
	}
}
impl Debug for SessionCallbacks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionCallbacks")
			.field("token_set", &self.token.is_some())
			.field("attributes_set", &self.attributes.is_some())
			.finish()
	}
}

/// Session provider holding one fixed token, for scripts and tests.
#[derive(Clone, Debug)]
pub struct StaticSession(pub TokenResponse);
impl SessionProvider for StaticSession {
	fn current_token(&self) -> Result<Option<TokenResponse>> {
		Ok(Some(self.0.clone()))
	}
}

//! Token endpoint response model.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Token endpoint response.
///
/// The broker never retains it: it is handed to the caller (or a service-account unit of work)
/// and storing it is the host's concern. Fields the broker does not model are kept in
/// [`TokenResponse::extra`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// OpenID Connect ID token, when issued.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<TokenSecret>,
	/// Token type (normally `Bearer`).
	#[serde(default)]
	pub token_type: String,
	/// Access token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Provider-specific fields (`refresh_expires_in`, `session_state`, `scope`, ...).
	#[serde(flatten)]
	pub extra: JsonMap<String, JsonValue>,
}
impl TokenResponse {
	/// Parses a serialized token (e.g. a session cookie value).
	pub fn from_json(bytes: &[u8]) -> Result<Self> {
		crate::error::decode_json(bytes).map_err(|e| crate::error::DecodeError::json(e).into())
	}

	/// Refresh token secret, ignoring empty values.
	pub fn refresh_secret(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("access_token", &"<redacted>")
			.field("refresh_token_set", &self.refresh_token.is_some())
			.field("id_token_set", &self.id_token.is_some())
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

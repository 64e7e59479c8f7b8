//! JWT claim inspection.
//!
//! Tokens are decoded without signature verification: callers only inspect claims of tokens the
//! provider has already vouched for through introspection.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{_prelude::*, error::DecodeError};

/// Decoded JWT payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(pub JsonMap<String, JsonValue>);
impl Claims {
	/// Decodes the payload segment of a compact JWT.
	pub fn decode(token: &str) -> Result<Self> {
		let mut parts = token.split('.');
		let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
			(Some(_), Some(payload), Some(_), None) => payload,
			_ => return Err(DecodeError::JwtShape.into()),
		};
		let bytes = URL_SAFE_NO_PAD
			.decode(payload.trim_end_matches('='))
			.map_err(DecodeError::JwtEncoding)?;

		crate::error::decode_json(&bytes).map(Self).map_err(|e| DecodeError::json(e).into())
	}

	/// Returns one claim.
	pub fn get(&self, name: &str) -> Option<&JsonValue> {
		self.0.get(name)
	}

	/// Subject (`sub`).
	pub fn subject(&self) -> Option<&str> {
		self.get("sub").and_then(JsonValue::as_str)
	}

	/// Client-level roles granted for `client_id` (`resource_access.<client>.roles`).
	pub fn client_roles(&self, client_id: &str) -> Vec<&str> {
		self.get("resource_access")
			.and_then(|access| access.get(client_id))
			.and_then(|client| client.get("roles"))
			.and_then(JsonValue::as_array)
			.map(|roles| roles.iter().filter_map(JsonValue::as_str).collect())
			.unwrap_or_default()
	}

	/// Realm-level roles (`realm_access.roles`).
	pub fn realm_roles(&self) -> Vec<&str> {
		self.get("realm_access")
			.and_then(|access| access.get("roles"))
			.and_then(JsonValue::as_array)
			.map(|roles| roles.iter().filter_map(JsonValue::as_str).collect())
			.unwrap_or_default()
	}

	/// Expiry instant (`exp`).
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let exp = self.get("exp").and_then(JsonValue::as_i64)?;

		OffsetDateTime::from_unix_timestamp(exp).ok()
	}

	/// Returns `true` when `exp` is present and not after `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|exp| exp <= now)
	}
}

//! User resources.

// self
use crate::{
	_prelude::*,
	admin::AdminClient,
	dispatch::{AdminReply, Method},
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	policy::Outcome,
};

/// Query parameters accepted by the user listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserQuery {
	/// Exact or partial username.
	pub username: Option<String>,
	/// Exact or partial email.
	pub email: Option<String>,
	/// Free-text search over username, names, and email.
	pub search: Option<String>,
	/// Index of the first result.
	pub first: Option<u32>,
	/// Maximum number of results.
	pub max: Option<u32>,
}
impl UserQuery {
	/// Lookup by username.
	pub fn username(username: impl Into<String>) -> Self {
		Self { username: Some(username.into()), ..Default::default() }
	}

	/// Lookup by email.
	pub fn email(email: impl Into<String>) -> Self {
		Self { email: Some(email.into()), ..Default::default() }
	}

	/// Lookup by username, or by email when `login` contains `@`.
	pub fn login(login: &str) -> Self {
		if login.contains('@') { Self::email(login) } else { Self::username(login) }
	}

	fn pairs(&self) -> [(&'static str, Option<String>); 5] {
		[
			("username", self.username.clone()),
			("email", self.email.clone()),
			("search", self.search.clone()),
			("first", self.first.map(|value| value.to_string())),
			("max", self.max.map(|value| value.to_string())),
		]
	}
}

/// Credential payload for [`AdminClient::reset_password`].
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CredentialRepresentation {
	/// Credential type; always `password` here.
	#[serde(rename = "type")]
	pub kind: &'static str,
	/// Whether the user must change the password at next login.
	pub temporary: bool,
	/// New password.
	pub value: String,
}
impl CredentialRepresentation {
	/// Permanent password credential.
	pub fn password(value: impl Into<String>) -> Self {
		Self { kind: "password", temporary: false, value: value.into() }
	}
}
impl Debug for CredentialRepresentation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRepresentation")
			.field("kind", &self.kind)
			.field("temporary", &self.temporary)
			.finish_non_exhaustive()
	}
}

impl<C, M> AdminClient<'_, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists users matching `query`.
	pub async fn users(&self, query: &UserQuery) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["users"], |request| request.query_opt(query.pairs())).await
	}

	/// Creates a user from its JSON representation.
	pub async fn create_user(&self, user: &JsonValue) -> Result<Outcome<AdminReply>> {
		self.send(Method::Post, ["users"], |request| request.body(user.clone())).await
	}

	/// Number of users in the realm.
	pub async fn count_users(&self) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["users", "count"], |request| request).await
	}

	/// One user by id.
	pub async fn user(&self, user_id: &str) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["users", user_id], |request| request).await
	}

	/// Replaces fields of a user.
	pub async fn update_user(
		&self,
		user_id: &str,
		user: &JsonValue,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Put, ["users", user_id], |request| request.body(user.clone())).await
	}

	/// Deletes a user.
	pub async fn delete_user(&self, user_id: &str) -> Result<Outcome<AdminReply>> {
		self.send(Method::Delete, ["users", user_id], |request| request).await
	}

	/// Revokes the consent (and offline tokens) the user granted to `client_id`.
	pub async fn revoke_consent(
		&self,
		user_id: &str,
		client_id: &str,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Delete, ["users", user_id, "consents", client_id], |request| request)
			.await
	}

	/// Emails the user a link to perform `actions` (e.g. `UPDATE_PASSWORD`).
	pub async fn execute_actions_email(
		&self,
		user_id: &str,
		actions: &[&str],
		redirect_uri: Option<&str>,
		client_id: Option<&str>,
	) -> Result<Outcome<AdminReply>> {
		let body = JsonValue::from(actions.to_vec());

		self.send(Method::Put, ["users", user_id, "execute-actions-email"], |request| {
			request
				.query_opt([
					("redirect_uri", redirect_uri.filter(|value| !value.is_empty())),
					("client_id", client_id),
				])
				.body(body)
		})
		.await
	}

	/// All role mappings of a user.
	pub async fn role_mappings(&self, user_id: &str) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["users", user_id, "role-mappings"], |request| request).await
	}

	/// Sets a new password.
	pub async fn reset_password(
		&self,
		user_id: &str,
		credential: &CredentialRepresentation,
	) -> Result<Outcome<AdminReply>> {
		let request_body = serde_json::to_value(credential)
			.map_err(crate::error::ConfigError::BodySerialize)?;

		self.send(Method::Put, ["users", user_id, "reset-password"], |request| {
			request.body(request_body)
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_picks_email_when_it_looks_like_one() {
		assert_eq!(UserQuery::login("ada@example.com").email.as_deref(), Some("ada@example.com"));
		assert_eq!(UserQuery::login("ada").username.as_deref(), Some("ada"));
	}

	#[test]
	fn credential_serializes_keycloak_shape() {
		assert_eq!(
			serde_json::to_value(CredentialRepresentation::password("pw"))
				.expect("Credential should serialize."),
			serde_json::json!({ "type": "password", "temporary": false, "value": "pw" }),
		);
		let debug = format!("{:?}", CredentialRepresentation::password("hunter2"));

		assert!(!debug.contains("hunter2"));
	}
}

//! Account helpers that run as the broker's service account.
//!
//! Each helper is one [`Broker::run_as_service`] transaction: the service token is acquired,
//! used for the admin calls, and released before the helper returns. Admin replies inside a
//! transaction must succeed; a rejection ends the transaction with
//! [`Error::ProviderHttp`].

// self
use crate::{
	_prelude::*,
	admin::{
		ADMIN_OPERATION,
		users::{CredentialRepresentation, UserQuery},
	},
	auth::TokenSecret,
	dispatch::AdminReply,
	flows::Broker,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	policy::Outcome,
};

/// Required action that makes the user choose a new password.
pub const UPDATE_PASSWORD_ACTION: &str = "UPDATE_PASSWORD";

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Emails the user a password-update link returning to `redirect_uri`.
	pub async fn change_password(
		&self,
		user_id: &str,
		redirect_uri: Option<&str>,
	) -> Result<Outcome<AdminReply>> {
		self.run_as_service(|token| async move {
			let config = self.configuration().await?;

			self.admin(&token.access_token)
				.execute_actions_email(
					user_id,
					&[UPDATE_PASSWORD_ACTION],
					redirect_uri,
					Some(config.client_id.as_str()),
				)
				.await?
				.into_result(ADMIN_OPERATION)
		})
		.await
	}

	/// Looks the user up by username or email, then sends the password-update email.
	pub async fn forgot_password(
		&self,
		login: &str,
		redirect_uri: Option<&str>,
	) -> Result<Outcome<AdminReply>> {
		let user = match self.find_user(login).await? {
			Outcome::Success(user) => user,
			Outcome::Rejected(response) => return Ok(Outcome::Rejected(response)),
			Outcome::Unreachable(message) => return Ok(Outcome::Unreachable(message)),
		};
		let user_id = user_id(&user, login)?;

		self.change_password(&user_id, redirect_uri).await
	}

	/// Users whose username (or email, when `login` contains `@`) matches `login`.
	///
	/// Fails with [`Error::UserLoginNotFound`] when nothing matches.
	pub async fn search_users(&self, login: &str) -> Result<Outcome<Vec<JsonValue>>> {
		self.run_as_service(|token| async move {
			self.lookup_users(&token.access_token, login).await
		})
		.await
	}

	/// The user whose username or email is exactly `login`.
	///
	/// Fails with [`Error::UserLoginNotFound`] when no listed user matches exactly.
	pub async fn find_user(&self, login: &str) -> Result<Outcome<JsonValue>> {
		self.run_as_service(|token| async move {
			let users = self.lookup_users(&token.access_token, login).await?;

			exact_match(users, login)
		})
		.await
	}

	/// Admin representation of the signed-in user (resolved through userinfo `sub`).
	pub async fn logged_user_info(&self) -> Result<Outcome<JsonValue>> {
		self.run_as_service(|token| async move {
			let info = self.userinfo(None).await?.into_result("userinfo")?;
			let subject = info
				.get("sub")
				.and_then(JsonValue::as_str)
				.ok_or(Error::NoActiveSession)?;

			self.admin(&token.access_token)
				.user(subject)
				.await?
				.into_result(ADMIN_OPERATION)?
				.json()
		})
		.await
	}

	/// Returns `true` when the signed-in user comes from a federated user store.
	pub async fn is_logged_federation_user(&self) -> Result<Outcome<bool>> {
		Ok(self
			.logged_user_info()
			.await?
			.map(|user| user.get("federationLink").is_some_and(|link| !link.is_null())))
	}

	/// Creates `username` (or reuses it when it already exists), sets its password, and maps
	/// the named client roles. Returns the user representation.
	pub async fn create_starter_user(
		&self,
		username: &str,
		password: &str,
		email: &str,
		client_role_names: &[&str],
	) -> Result<Outcome<JsonValue>> {
		let existing = match self.find_user(username).await {
			Ok(Outcome::Success(user)) => Some(user),
			Ok(Outcome::Rejected(response)) => return Ok(Outcome::Rejected(response)),
			Ok(Outcome::Unreachable(message)) => return Ok(Outcome::Unreachable(message)),
			Err(Error::UserLoginNotFound { .. }) => None,
			Err(err) => return Err(err),
		};

		self.run_as_service(|token| async move {
			let config = self.configuration().await?;
			let admin = self.admin(&token.access_token);
			let user = match existing {
				Some(user) => user,
				None => {
					let representation = serde_json::json!({
						"username": username,
						"email": email,
						"enabled": true,
					});

					admin.create_user(&representation).await?.into_result(ADMIN_OPERATION)?;

					let users = self.lookup_users(&token.access_token, username).await?;

					exact_match(users, username)?
				},
			};
			let id = user_id(&user, username)?;

			admin
				.reset_password(&id, &CredentialRepresentation::password(password))
				.await?
				.into_result(ADMIN_OPERATION)?;

			let client_uuid =
				admin.client_uuid(&config.client_id).await?.into_result(ADMIN_OPERATION)?;
			let mut roles = Vec::new();

			for name in client_role_names.iter().filter(|name| !name.is_empty()) {
				let role: JsonValue = admin
					.client_role(&client_uuid, name)
					.await?
					.into_result(ADMIN_OPERATION)?
					.json()?;

				roles.push(role);
			}

			if !roles.is_empty() {
				admin
					.add_client_roles_to_user(&id, &client_uuid, &roles.into())
					.await?
					.into_result(ADMIN_OPERATION)?;
			}

			Ok(user)
		})
		.await
	}

	async fn lookup_users(&self, token: &TokenSecret, login: &str) -> Result<Vec<JsonValue>> {
		let users: Vec<JsonValue> = self
			.admin(token)
			.users(&UserQuery::login(login))
			.await?
			.into_result(ADMIN_OPERATION)?
			.json()?;

		if users.is_empty() {
			return Err(Error::UserLoginNotFound { login: login.to_owned() });
		}

		Ok(users)
	}
}

fn exact_match(users: Vec<JsonValue>, login: &str) -> Result<JsonValue> {
	users
		.into_iter()
		.find(|user| {
			["username", "email"]
				.iter()
				.any(|field| user.get(*field).and_then(JsonValue::as_str) == Some(login))
		})
		.ok_or_else(|| Error::UserLoginNotFound { login: login.to_owned() })
}

fn user_id(user: &JsonValue, login: &str) -> Result<String> {
	user.get("id")
		.and_then(JsonValue::as_str)
		.map(ToOwned::to_owned)
		.ok_or_else(|| Error::UserLoginNotFound { login: login.to_owned() })
}

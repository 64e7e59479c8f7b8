//! Token inspection: introspection, sign-in and role checks, claim decoding, and userinfo.
//!
//! Every operation accepts an explicit token and otherwise falls back to the host session
//! token supplied by the [`SessionProvider`](crate::auth::SessionProvider).

// self
use crate::{
	_prelude::*,
	auth::{Claims, TokenSecret},
	flows::{Broker, common},
	http::{ProviderHttpClient, SuccessBand},
	oauth::TransportErrorMapper,
	obs::OperationKind,
	policy::Outcome,
};

/// Introspection verdict plus whatever claims the provider reported alongside it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Introspection {
	/// Whether the token is currently valid.
	#[serde(default)]
	pub active: bool,
	/// Remaining introspection fields (`sub`, `exp`, `resource_access`, ...).
	#[serde(flatten)]
	pub claims: Claims,
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Asks the provider whether `token` (or the session access token) is active.
	///
	/// Statuses 200 through 399 count as success. An empty success body (no content, redirect)
	/// is reported as an inactive token.
	pub async fn introspect(&self, token: Option<&str>) -> Result<Outcome<Introspection>> {
		const KIND: OperationKind = OperationKind::Introspection;

		let token = self.access_token_or_session(token)?;

		common::observe(KIND, "introspect", Outcome::is_success, async move {
			let config = self.configuration().await?;
			let form = [("token".to_owned(), token.expose().to_owned())];
			let authorization =
				common::basic_authorization(&config.client_id, &config.client_secret);
			let outcome = self
				.submit_form(
					KIND,
					&config.endpoints.introspection,
					&form,
					Some(authorization),
					SuccessBand::Through399,
				)
				.await?;

			outcome.try_map(|response| {
				if response.body.trim().is_empty() {
					Ok(Introspection::default())
				} else {
					response.json()
				}
			})
		})
		.await
	}

	/// Returns `true` when introspection reports the token active.
	///
	/// Typed broker failures (provider rejections under the raise policy, setup and session
	/// errors) propagate. Undecodable replies and transport failures read as "not signed in".
	pub async fn is_signed_in(&self, token: Option<&str>) -> Result<bool> {
		if token.is_none_or(str::is_empty) && self.current_token()?.is_none() {
			return Ok(false);
		}

		match self.introspect(token).await {
			Ok(Outcome::Success(introspection)) => Ok(introspection.active),
			Ok(_) => Ok(false),
			Err(err) if err.is_typed() => Err(err),
			Err(_) => Ok(false),
		}
	}

	/// Returns `true` when the token is active and grants `role` for this client.
	pub async fn has_role(&self, role: &str, token: Option<&str>) -> Result<bool> {
		if !self.is_signed_in(token).await? {
			return Ok(false);
		}

		let config = self.configuration().await?;
		let claims = self.decoded_access_token(token)?;

		Ok(claims.client_roles(&config.client_id).contains(&role))
	}

	/// Claims of `token` (or the session access token).
	pub fn decoded_access_token(&self, token: Option<&str>) -> Result<Claims> {
		Claims::decode(self.access_token_or_session(token)?.expose())
	}

	/// Claims of `token` (or the session ID token).
	pub fn decoded_id_token(&self, token: Option<&str>) -> Result<Claims> {
		match token.filter(|value| !value.is_empty()) {
			Some(token) => Claims::decode(token),
			None => {
				let session = self.session_token()?;
				let id_token = session.id_token.as_ref().ok_or(Error::NoActiveSession)?;

				Claims::decode(id_token.expose())
			},
		}
	}

	/// Claims of `token` (or the session refresh token).
	pub fn decoded_refresh_token(&self, token: Option<&str>) -> Result<Claims> {
		match token.filter(|value| !value.is_empty()) {
			Some(token) => Claims::decode(token),
			None => {
				let session = self.session_token()?;
				let refresh = session.refresh_secret().ok_or(Error::NoActiveSession)?;

				Claims::decode(refresh.expose())
			},
		}
	}

	/// One claim of the access token, if present.
	pub fn attribute(&self, name: &str, token: Option<&str>) -> Result<Option<JsonValue>> {
		Ok(self.decoded_access_token(token)?.get(name).cloned())
	}

	/// Profile of the token's owner from the userinfo endpoint (HTTP 200 only).
	pub async fn userinfo(&self, access_token: Option<&str>) -> Result<Outcome<JsonValue>> {
		const KIND: OperationKind = OperationKind::Userinfo;

		let token = self.access_token_or_session(access_token)?;

		common::observe(KIND, "userinfo", Outcome::is_success, async move {
			let config = self.configuration().await?;
			let form = [("access_token".to_owned(), token.expose().to_owned())];
			let outcome = self
				.submit_form(KIND, &config.endpoints.userinfo, &form, None, SuccessBand::Exact200)
				.await?;

			outcome.try_map(|response| response.json())
		})
		.await
	}

	pub(crate) fn access_token_or_session(&self, token: Option<&str>) -> Result<TokenSecret> {
		match token.filter(|value| !value.is_empty()) {
			Some(token) => Ok(TokenSecret::new(token)),
			None => Ok(self.session_token()?.access_token),
		}
	}
}

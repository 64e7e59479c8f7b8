//! Token endpoint exchanges.
//!
//! Every grant shape goes through [`Broker::exchange_token`]: the [`GrantRequest`] variant only
//! decides which form fields are posted. Success is HTTP 200 exactly; the body is parsed into a
//! [`TokenResponse`] and handed to the caller without being retained.

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	flows::{Broker, common},
	http::{ProviderHttpClient, SuccessBand},
	oauth::TransportErrorMapper,
	obs::OperationKind,
	policy::Outcome,
	provider::GrantRequest,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges `grant` at the token endpoint.
	pub async fn exchange_token(&self, grant: &GrantRequest) -> Result<Outcome<TokenResponse>> {
		const KIND: OperationKind = OperationKind::TokenExchange;

		common::observe(KIND, grant.grant_type().as_str(), Outcome::is_success, async move {
			let config = self.configuration().await?;
			let form = grant.form(&config.client_id, &config.client_secret);
			let outcome = self
				.submit_form(KIND, &config.endpoints.token, &form, None, SuccessBand::Exact200)
				.await?;

			outcome.try_map(|response| TokenResponse::from_json(response.body.as_bytes()))
		})
		.await
	}

	/// Resource-owner password credentials grant.
	pub async fn token_by_password(
		&self,
		username: &str,
		password: &str,
	) -> Result<Outcome<TokenResponse>> {
		self.exchange_token(&GrantRequest::password(username, password)).await
	}

	/// Authorization code grant for a code delivered to `redirect_uri`.
	pub async fn token_by_code(
		&self,
		code: &str,
		redirect_uri: &str,
	) -> Result<Outcome<TokenResponse>> {
		self.exchange_token(&GrantRequest::authorization_code(code, redirect_uri)).await
	}

	/// Refresh token grant.
	///
	/// Without an explicit (non-empty) refresh token, the current session's refresh token is
	/// used; [`Error::NoActiveSession`] is returned when there is none.
	pub async fn token_by_refresh_token(
		&self,
		refresh_token: Option<&str>,
	) -> Result<Outcome<TokenResponse>> {
		let grant = match refresh_token.filter(|token| !token.is_empty()) {
			Some(token) => GrantRequest::refresh_token(token),
			None => {
				let session = self.session_token()?;
				let secret = session.refresh_secret().ok_or(Error::NoActiveSession)?;

				GrantRequest::RefreshToken { refresh_token: secret.clone() }
			},
		};

		self.exchange_token(&grant).await
	}

	/// Client credentials grant for the broker's own service account.
	pub async fn token_by_client_credentials(&self) -> Result<Outcome<TokenResponse>> {
		self.exchange_token(&GrantRequest::ClientCredentials).await
	}
}

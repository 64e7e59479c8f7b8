//! End-session calls: user logout and service token release.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	flows::{Broker, common},
	http::{ProviderHttpClient, SuccessBand},
	oauth::TransportErrorMapper,
	obs::OperationKind,
	policy::Outcome,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Ends the provider session bound to `refresh_token` (or the session's refresh token).
	///
	/// Succeeds without contacting the provider when there is neither an explicit refresh token
	/// nor a current session. `redirect_uri` is appended to the end-session URL when given.
	pub async fn logout(
		&self,
		redirect_uri: Option<&str>,
		refresh_token: Option<&str>,
	) -> Result<Outcome<()>> {
		let refresh = match refresh_token.filter(|value| !value.is_empty()) {
			Some(token) => Some(TokenSecret::new(token)),
			None => self.current_token()?.and_then(|token| token.refresh_secret().cloned()),
		};
		let Some(refresh) = refresh else {
			return Ok(Outcome::Success(()));
		};

		self.end_session(redirect_uri, Some(&refresh), "logout").await
	}

	/// Posts the client credentials and `refresh_token` (when there is one) to the end-session
	/// endpoint.
	pub(crate) async fn end_session(
		&self,
		redirect_uri: Option<&str>,
		refresh_token: Option<&TokenSecret>,
		stage: &'static str,
	) -> Result<Outcome<()>> {
		const KIND: OperationKind = OperationKind::Logout;

		common::observe(KIND, stage, Outcome::is_success, async move {
			let config = self.configuration().await?;
			let mut form = vec![
				("client_id".to_owned(), config.client_id.clone()),
				("client_secret".to_owned(), config.client_secret.expose().to_owned()),
			];

			if let Some(refresh_token) = refresh_token {
				form.push(("refresh_token".to_owned(), refresh_token.expose().to_owned()));
			}

			let url = config.end_session_url(redirect_uri);
			let outcome =
				self.submit_form(KIND, &url, &form, None, SuccessBand::Through399).await?;

			Ok(outcome.map(|_| ()))
		})
		.await
	}
}

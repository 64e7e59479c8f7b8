//! Service-account transactions.
//!
//! [`Broker::run_as_service`] acquires a client-credentials token, hands it to a unit of work,
//! and releases it through the end-session endpoint on every exit path. Each call performs
//! exactly one acquisition and, once a token was issued, exactly one release.

// self
use crate::{
	_prelude::*,
	auth::TokenResponse,
	flows::{Broker, common},
	http::{ProviderHttpClient, SuccessBand},
	oauth::TransportErrorMapper,
	obs::{self, OperationKind},
	policy::Outcome,
	provider::GrantRequest,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs `work` with a freshly acquired service-account token.
	///
	/// The client-credentials grant accepts statuses 200 through 399. Once `work` finishes the
	/// token is released, with its refresh token when one was issued. A failure from `work` is
	/// returned as is, even if the release fails too; a release failure after successful work is
	/// logged and does not replace the result.
	pub async fn run_as_service<T, F, Fut>(&self, work: F) -> Result<Outcome<T>>
	where
		F: FnOnce(TokenResponse) -> Fut,
		Fut: Future<Output = Result<T>>,
	{
		const KIND: OperationKind = OperationKind::ServiceAccount;

		common::observe(KIND, "run_as_service", Outcome::is_success, async move {
			let token = match self.acquire_service_token().await? {
				Outcome::Success(token) => token,
				Outcome::Rejected(response) => return Ok(Outcome::Rejected(response)),
				Outcome::Unreachable(message) => return Ok(Outcome::Unreachable(message)),
			};
			let result = work(token.clone()).await;
			let release = self.release_service_token(&token).await;

			match (result, release) {
				(Err(err), _) => Err(err),
				// A rejected release under the swallow policy was already logged when settled.
				(Ok(value), Ok(_)) => Ok(Outcome::Success(value)),
				(Ok(value), Err(err)) => {
					obs::warn_release_failure(&err);

					Ok(Outcome::Success(value))
				},
			}
		})
		.await
	}

	async fn acquire_service_token(&self) -> Result<Outcome<TokenResponse>> {
		let config = self.configuration().await?;
		let form = GrantRequest::ClientCredentials.form(&config.client_id, &config.client_secret);
		let outcome = self
			.submit_form(
				OperationKind::TokenExchange,
				&config.endpoints.token,
				&form,
				None,
				SuccessBand::Through399,
			)
			.await?;

		outcome.try_map(|response| TokenResponse::from_json(response.body.as_bytes()))
	}

	async fn release_service_token(&self, token: &TokenResponse) -> Result<Outcome<()>> {
		self.end_session(None, token.refresh_secret(), "release_service_token").await
	}
}

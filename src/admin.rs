//! Realm admin REST catalog.
//!
//! [`AdminClient`] is a thin layer over [`Broker::dispatch`]: each method names one admin
//! resource under `{server}/admin/realms/{realm}/` and returns the dispatcher's
//! [`Outcome<AdminReply>`] untouched. Account helpers that need a service-account token live in
//! [`account`].

pub mod account;
pub mod roles;
pub mod users;

pub use account::UPDATE_PASSWORD_ACTION;
pub use roles::RoleReconciliation;
pub use users::{CredentialRepresentation, UserQuery};

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	dispatch::{AdminReply, AuthenticatedRequest, Method},
	flows::Broker,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	policy::Outcome,
};

/// Operation label used when admin outcomes are turned back into errors.
pub(crate) const ADMIN_OPERATION: &str = "admin";

/// Admin API client bound to one bearer token.
pub struct AdminClient<'b, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	broker: &'b Broker<C, M>,
	token: TokenSecret,
}
impl<'b, C, M> AdminClient<'b, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Broker the client dispatches through.
	pub fn broker(&self) -> &'b Broker<C, M> {
		self.broker
	}

	/// Lists clients, filtered by `client_id` when given.
	pub async fn clients(&self, client_id: Option<&str>) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["clients"], |request| {
			request.query_opt([("clientId", client_id)])
		})
		.await
	}

	/// Roles defined by the client with internal id `client_uuid`.
	pub async fn client_roles(&self, client_uuid: &str) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["clients", client_uuid, "roles"], |request| request).await
	}

	/// One role of the client with internal id `client_uuid`.
	pub async fn client_role(
		&self,
		client_uuid: &str,
		role_name: &str,
	) -> Result<Outcome<AdminReply>> {
		self.send(Method::Get, ["clients", client_uuid, "roles", role_name], |request| request)
			.await
	}

	/// `GET` any admin resource, e.g. `["groups"]` or `["users", id, "groups"]`.
	pub async fn get<'s, I>(
		&self,
		segments: I,
		query: &[(&str, &str)],
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		self.generic(Method::Get, segments, query, None).await
	}

	/// `POST` to any admin resource.
	pub async fn post<'s, I>(
		&self,
		segments: I,
		query: &[(&str, &str)],
		body: Option<JsonValue>,
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		self.generic(Method::Post, segments, query, body).await
	}

	/// `PUT` to any admin resource.
	pub async fn put<'s, I>(
		&self,
		segments: I,
		query: &[(&str, &str)],
		body: Option<JsonValue>,
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		self.generic(Method::Put, segments, query, body).await
	}

	/// `DELETE` any admin resource; some mapping endpoints take the entries to drop as `body`.
	pub async fn delete<'s, I>(
		&self,
		segments: I,
		query: &[(&str, &str)],
		body: Option<JsonValue>,
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		self.generic(Method::Delete, segments, query, body).await
	}

	async fn generic<'s, I>(
		&self,
		method: Method,
		segments: I,
		query: &[(&str, &str)],
		body: Option<JsonValue>,
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		self.send(method, segments, |request| {
			let request =
				query.iter().fold(request, |request, (key, value)| request.query(*key, *value));

			match body {
				Some(body) => request.body(body),
				None => request,
			}
		})
		.await
	}

	/// Builds and dispatches one request against the admin resource named by `segments`.
	pub(crate) async fn send<'s, I>(
		&self,
		method: Method,
		segments: I,
		customize: impl FnOnce(AuthenticatedRequest) -> AuthenticatedRequest,
	) -> Result<Outcome<AdminReply>>
	where
		I: IntoIterator<Item = &'s str>,
	{
		let config = self.broker.configuration().await?;
		let url = config.admin_url(segments)?;
		let request = customize(AuthenticatedRequest::new(method, url, self.token.clone()));

		self.broker.dispatch(request).await
	}
}
impl<C, M> Debug for AdminClient<'_, C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AdminClient").field("broker", self.broker).finish_non_exhaustive()
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Admin client authenticated with `token`.
	pub fn admin(&self, token: &TokenSecret) -> AdminClient<'_, C, M> {
		AdminClient { broker: self, token: token.clone() }
	}

	/// Admin client authenticated with the current session's access token.
	pub fn session_admin(&self) -> Result<AdminClient<'_, C, M>> {
		let token = self.session_token()?;

		Ok(self.admin(&token.access_token))
	}
}

/// Unwraps an [`Outcome::Success`] or returns the non-success outcome from the enclosing
/// function as `Ok(..)`.
macro_rules! try_outcome {
	($outcome:expr) => {
		match $outcome {
			$crate::policy::Outcome::Success(value) => value,
			$crate::policy::Outcome::Rejected(response) =>
				return Ok($crate::policy::Outcome::Rejected(response)),
			$crate::policy::Outcome::Unreachable(message) =>
				return Ok($crate::policy::Outcome::Unreachable(message)),
		}
	};
}
pub(crate) use try_outcome;

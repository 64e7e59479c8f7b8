//! Broker object and the provider flows it drives.
//!
//! [`Broker`] replaces process-wide state: it owns the transport, the configuration resolver,
//! the injected [`SessionProvider`], and the [`ExceptionPolicy`]. Flow modules add the
//! operations: grant exchanges, introspection and role checks, logout, and the service-account
//! transaction wrapper.

pub mod common;
pub mod grant;
pub mod introspection;
pub mod logout;
pub mod service_account;

pub use introspection::Introspection;

// self
use crate::{
	_prelude::*,
	auth::{SessionProvider, TokenResponse, UnconfiguredSession},
	error::DiscoveryError,
	http::{ProviderHttpClient, ProviderResponse, SuccessBand},
	oauth::TransportErrorMapper,
	obs::OperationKind,
	policy::ExceptionPolicy,
	provider::{ConfigurationResolver, DiscoveryDocument, InstallationSource, ProviderConfiguration},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Client for one realm/client pair of the identity provider.
///
/// Construct it once and share it (it is cheap to clone). Provider configuration is
/// discovered lazily on first use and cached until
/// [`invalidate_configuration`](Broker::invalidate_configuration).
pub struct Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Cached provider configuration.
	pub resolver: Arc<ConfigurationResolver>,
	/// Host session boundary.
	pub session: Arc<dyn SessionProvider>,
	exception_policy: Option<ExceptionPolicy>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		source: impl Into<InstallationSource>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			resolver: Arc::new(ConfigurationResolver::new(source)),
			session: Arc::new(UnconfiguredSession),
			exception_policy: None,
		}
	}

	/// Sets the host session provider.
	pub fn with_session(mut self, session: Arc<dyn SessionProvider>) -> Self {
		self.session = session;

		self
	}

	/// Sets the exception policy.
	pub fn with_exception_policy(mut self, policy: ExceptionPolicy) -> Self {
		self.exception_policy = Some(policy);

		self
	}

	/// Effective exception policy; [`ExceptionPolicy::Raise`] unless set otherwise.
	pub fn exception_policy(&self) -> ExceptionPolicy {
		ExceptionPolicy::resolve(self.exception_policy)
	}

	/// Resolves (once) and returns the provider configuration.
	pub async fn configuration(&self) -> Result<Arc<ProviderConfiguration>> {
		self.resolver.resolve(|_, well_known| self.discover(well_known)).await
	}

	/// Drops the cached configuration; the next call rediscovers it.
	pub fn invalidate_configuration(&self) {
		self.resolver.invalidate();
	}

	/// Current session token from the host, if a session exists.
	pub fn current_token(&self) -> Result<Option<TokenResponse>> {
		self.session.current_token()
	}

	/// Current session token, failing with [`Error::NoActiveSession`] when nobody is signed in.
	pub fn session_token(&self) -> Result<TokenResponse> {
		self.current_token()?.ok_or(Error::NoActiveSession)
	}

	/// Host-managed attributes for the current user.
	pub fn external_attributes(&self) -> Result<JsonValue> {
		self.session.external_attributes()
	}

	/// Interactive login URL for `redirect_uri` (`response_type` defaults to `code`).
	pub async fn login_redirect_url(
		&self,
		redirect_uri: &str,
		response_type: Option<&str>,
	) -> Result<Url> {
		let config = self.configuration().await?;

		Ok(config.login_redirect_url(redirect_uri, response_type.unwrap_or("code")))
	}

	/// Self-service account console of the realm.
	pub async fn account_url(&self) -> Result<Url> {
		Ok(self.configuration().await?.account_url()?)
	}

	async fn discover(&self, well_known: Url) -> Result<DiscoveryDocument> {
		let request = common::get_request(&well_known)?;
		let response = self.send(OperationKind::Discovery, request).await?;
		let response = ProviderResponse::from_http(&response);

		if !SuccessBand::Status2xx.contains(response.status) {
			return Err(DiscoveryError::Status { response }.into());
		}

		Ok(DiscoveryDocument::from_json(response.body.as_bytes())?)
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker over the default reqwest transport (no redirects, no proxy).
	///
	/// Use [`Broker::with_http_client`] with [`ReqwestHttpClient::builder`] when the provider is
	/// only reachable through a proxy.
	pub fn new(source: impl Into<InstallationSource>) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			source,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			resolver: self.resolver.clone(),
			session: self.session.clone(),
			exception_policy: self.exception_policy,
		}
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("installation", self.resolver.source())
			.field("configuration_cached", &self.resolver.cached().is_some())
			.field("exception_policy", &self.exception_policy())
			.finish()
	}
}

//! Transport primitives shared by every provider call.
//!
//! The module exposes [`ProviderHttpClient`] so downstream crates can bring their own HTTP
//! stack, plus [`ProviderResponse`] (the raw reply handed back under the swallow policy) and
//! [`SuccessBand`] (the status window each operation treats as success).

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpResponse};
#[cfg(feature = "reqwest")] use oauth2::HttpRequest;
use oauth2::http::{HeaderMap, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Abstraction over HTTP transports capable of executing provider calls.
///
/// The trait is the broker's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so they can be shared across broker clones, and the handles they
/// return must own whatever state is required so their request futures remain `Send`.
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle used for a single provider call.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Returns a handle ready to execute one request.
	fn handle(&self) -> Self::Handle;
}

/// Status window an operation treats as success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuccessBand {
	/// Only HTTP 200 (token exchange, userinfo).
	Exact200,
	/// Any 2xx (discovery).
	Status2xx,
	/// HTTP 200 through 399 (introspection, logout, admin calls).
	Through399,
}
impl SuccessBand {
	/// Returns `true` when `status` falls inside the band.
	pub fn contains(self, status: u16) -> bool {
		match self {
			Self::Exact200 => status == 200,
			Self::Status2xx => (200..300).contains(&status),
			Self::Through399 => (200..400).contains(&status),
		}
	}
}

/// Raw provider reply, kept intact so callers can inspect failures themselves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body decoded as UTF-8 (lossy).
	pub body: String,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ProviderResponse {
	/// Captures status, body, and retry hint from a transport response.
	pub fn from_http(response: &HttpResponse) -> Self {
		Self {
			status: response.status().as_u16(),
			body: String::from_utf8_lossy(response.body()).into_owned(),
			retry_after: parse_retry_after(response.headers()),
		}
	}

	/// Returns `true` when the body is empty.
	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}

	/// Deserializes the body with path-aware errors.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		crate::error::decode_json(self.body.as_bytes())
			.map_err(|e| crate::error::DecodeError::json(e).into())
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Provider calls must not follow redirects: introspection, logout, and admin calls treat 3xx
/// as success, so the status has to reach the broker untouched. Configure any custom
/// [`ReqwestClient`] passed to [`ReqwestHttpClient::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds the default transport (no redirects, no proxy).
	pub fn new() -> Result<Self, ConfigError> {
		Self::builder().build()
	}

	/// Starts a builder for transports that need a proxy or timeouts.
	pub fn builder() -> ReqwestHttpClientBuilder {
		ReqwestHttpClientBuilder::default()
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self) -> Self::Handle {
		ReqwestHandle(Arc::new(self.0.clone()))
	}
}

/// Builder for [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClientBuilder {
	proxy: Option<String>,
	timeout: Option<std::time::Duration>,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClientBuilder {
	/// Routes every provider call through `proxy` (e.g. `http://proxy.internal:3128`).
	pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
		self.proxy = Some(proxy.into());

		self
	}

	/// Applies a transport-level timeout to every request.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Builds the transport.
	pub fn build(self) -> Result<ReqwestHttpClient, ConfigError> {
		let mut builder = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none());

		if let Some(proxy) = self.proxy.filter(|value| !value.is_empty()) {
			builder = builder.proxy(reqwest::Proxy::all(proxy)?);
		}
		if let Some(timeout) = self.timeout {
			builder = builder.timeout(timeout);
		}

		Ok(ReqwestHttpClient(builder.build()?))
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`ProviderHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle(Arc<ReqwestClient>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{HeaderValue, StatusCode};
	// self
	use super::*;

	#[test]
	fn success_bands_cover_their_edges() {
		assert!(!SuccessBand::Through399.contains(199));
		assert!(SuccessBand::Through399.contains(200));
		assert!(SuccessBand::Through399.contains(302));
		assert!(SuccessBand::Through399.contains(399));
		assert!(!SuccessBand::Through399.contains(400));
		assert!(SuccessBand::Exact200.contains(200));
		assert!(!SuccessBand::Exact200.contains(204));
		assert!(SuccessBand::Status2xx.contains(204));
		assert!(!SuccessBand::Status2xx.contains(302));
	}

	#[test]
	fn provider_response_captures_retry_after() {
		let mut response = HttpResponse::new(b"slow down".to_vec());

		*response.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
		response.headers_mut().insert(RETRY_AFTER, HeaderValue::from_static("7"));

		let captured = ProviderResponse::from_http(&response);

		assert_eq!(captured.status, 503);
		assert_eq!(captured.body, "slow down");
		assert_eq!(captured.retry_after, Some(Duration::seconds(7)));
	}
}

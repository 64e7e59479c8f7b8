//! Shared helpers for flow implementations (request construction, sending, policy settling,
//! and observation).

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	flows::Broker,
	http::{ProviderHttpClient, ProviderResponse, SuccessBand},
	oauth::TransportErrorMapper,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	policy::Outcome,
};

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Executes one request and maps transport failures through the broker's mapper.
	pub(crate) async fn send(
		&self,
		operation: OperationKind,
		request: HttpRequest,
	) -> Result<HttpResponse> {
		let handle = self.http_client.handle();

		handle
			.call(request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(operation, err))
	}

	/// Posts `form` to `url` and settles the reply against `band` and the exception policy.
	pub(crate) async fn submit_form(
		&self,
		operation: OperationKind,
		url: &Url,
		form: &[(String, String)],
		authorization: Option<String>,
		band: SuccessBand,
	) -> Result<Outcome<ProviderResponse>> {
		let request = form_request(url, form, authorization)?;
		let response = self.send(operation, request).await?;

		self.settle(operation, band, ProviderResponse::from_http(&response))
	}

	/// Applies the success band, routing anything outside it through the exception policy.
	pub(crate) fn settle(
		&self,
		operation: OperationKind,
		band: SuccessBand,
		response: ProviderResponse,
	) -> Result<Outcome<ProviderResponse>> {
		if band.contains(response.status) {
			return Ok(Outcome::Success(response));
		}

		obs::debug_swallowed(operation, response.status);

		self.exception_policy().reject(operation.as_str(), response)
	}
}

/// Runs `fut` inside an operation span and records attempt plus success or failure.
pub(crate) async fn observe<T, Fut>(
	kind: OperationKind,
	stage: &'static str,
	succeeded: fn(&T) -> bool,
	fut: Fut,
) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	obs::record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(value) if succeeded(value) =>
			obs::record_operation_outcome(kind, OperationOutcome::Success),
		_ => obs::record_operation_outcome(kind, OperationOutcome::Failure),
	}

	result
}

/// `GET url` asking for JSON.
pub(crate) fn get_request(url: &Url) -> Result<HttpRequest, ConfigError> {
	Ok(Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(ACCEPT, JSON_CONTENT_TYPE)
		.body(Vec::new())?)
}

/// Form-encoded `POST url`, optionally carrying an `Authorization` header.
pub(crate) fn form_request(
	url: &Url,
	form: &[(String, String)],
	authorization: Option<String>,
) -> Result<HttpRequest, ConfigError> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(form).finish();
	let mut builder = Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_CONTENT_TYPE);

	if let Some(value) = authorization {
		builder = builder.header(AUTHORIZATION, value);
	}

	Ok(builder.body(body.into_bytes())?)
}

/// `Basic` credentials header value for the client.
pub(crate) fn basic_authorization(client_id: &str, client_secret: &TokenSecret) -> String {
	format!("Basic {}", STANDARD.encode(format!("{client_id}:{}", client_secret.expose())))
}

/// `Bearer` header value.
pub(crate) fn bearer_authorization(token: &TokenSecret) -> String {
	format!("Bearer {}", token.expose())
}

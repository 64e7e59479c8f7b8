//! Uniformly authenticated dispatcher for the realm admin REST surface.
//!
//! Every admin call goes through [`Broker::dispatch`]: the query string is appended for every
//! verb, a bearer header is always sent, and `POST`/`PUT` (and `DELETE` when it carries a body)
//! send JSON. Statuses 200 through 399 are success; an empty success body becomes
//! [`AdminReply::Done`].

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		self, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	flows::{
		Broker,
		common::{self, JSON_CONTENT_TYPE},
	},
	http::{ProviderHttpClient, ProviderResponse, SuccessBand},
	oauth::TransportErrorMapper,
	obs::OperationKind,
	policy::Outcome,
};

/// HTTP verbs the dispatcher supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}

	fn to_http(self) -> http::Method {
		match self {
			Method::Get => http::Method::GET,
			Method::Post => http::Method::POST,
			Method::Put => http::Method::PUT,
			Method::Delete => http::Method::DELETE,
		}
	}
}
impl FromStr for Method {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.trim().to_ascii_uppercase().as_str() {
			"GET" => Ok(Method::Get),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			"DELETE" => Ok(Method::Delete),
			_ => Err(Error::InvalidMethod { method: s.to_owned() }),
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One admin request: verb, absolute URL, query parameters, optional JSON body, bearer token.
#[derive(Clone, PartialEq)]
pub struct AuthenticatedRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute resource URL.
	pub url: Url,
	/// Query parameters appended to `url` in insertion order.
	pub query: Vec<(String, String)>,
	/// JSON body (ignored for `GET`).
	pub body: Option<JsonValue>,
	/// Bearer token sent in the `Authorization` header.
	pub bearer: TokenSecret,
}
impl AuthenticatedRequest {
	/// Starts a request without query or body.
	pub fn new(method: Method, url: Url, bearer: TokenSecret) -> Self {
		Self { method, url, query: Vec::new(), body: None, bearer }
	}

	/// Appends one query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends query parameters, skipping `None` values.
	pub fn query_opt<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, Option<V>)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query
			.extend(params.into_iter().filter_map(|(k, v)| v.map(|v| (k.into(), v.into()))));

		self
	}

	/// Sets the JSON body.
	pub fn body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` as the JSON body.
	pub fn json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(self.body(serde_json::to_value(body).map_err(ConfigError::BodySerialize)?))
	}

	/// URL with the query string applied.
	pub fn full_url(&self) -> Url {
		let mut url = self.url.clone();

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		url
	}

	fn to_http(&self) -> Result<HttpRequest, ConfigError> {
		let builder = Request::builder()
			.method(self.method.to_http())
			.uri(self.full_url().as_str())
			.header(ACCEPT, JSON_CONTENT_TYPE)
			.header(AUTHORIZATION, common::bearer_authorization(&self.bearer));
		let (builder, body) = match (self.method, &self.body) {
			(Method::Get, _) | (Method::Delete, None) => (builder, Vec::new()),
			(Method::Post | Method::Put, None) =>
				(builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE), Vec::new()),
			(Method::Post | Method::Put | Method::Delete, Some(body)) => (
				builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE),
				serde_json::to_vec(body).map_err(ConfigError::BodySerialize)?,
			),
		};

		Ok(builder.body(body)?)
	}
}
impl Debug for AuthenticatedRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("query", &self.query)
			.field("body_set", &self.body.is_some())
			.finish()
	}
}

/// Successful admin reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdminReply {
	/// Empty success body (`201`, `204`, redirects).
	Done,
	/// Non-empty success body, verbatim.
	Body(String),
}
impl AdminReply {
	fn from_response(response: ProviderResponse) -> Self {
		if response.body.trim().is_empty() { Self::Done } else { Self::Body(response.body) }
	}

	/// Raw body, if any.
	pub fn body(&self) -> Option<&str> {
		match self {
			Self::Done => None,
			Self::Body(body) => Some(body),
		}
	}

	/// Deserializes the body; an empty body decodes as JSON `null`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let bytes = self.body().unwrap_or("null").as_bytes();

		crate::error::decode_json(bytes).map_err(|e| crate::error::DecodeError::json(e).into())
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends an authenticated admin request.
	///
	/// Under the swallow policy, a reply outside 200..=399 comes back as
	/// [`Outcome::Rejected`] and a transport failure as [`Outcome::Unreachable`].
	pub async fn dispatch(&self, request: AuthenticatedRequest) -> Result<Outcome<AdminReply>> {
		const KIND: OperationKind = OperationKind::Dispatch;

		common::observe(KIND, request.method.as_str(), Outcome::is_success, async move {
			self.configuration().await?;

			let http_request = request.to_http()?;
			let response = match self.send(KIND, http_request).await {
				Ok(response) => response,
				Err(err) => return self.exception_policy().unreachable(err),
			};
			let outcome = self.settle(
				KIND,
				SuccessBand::Through399,
				ProviderResponse::from_http(&response),
			)?;

			Ok(outcome.map(AdminReply::from_response))
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request(method: Method) -> AuthenticatedRequest {
		let url = Url::parse("https://sso.example.com/admin/realms/acme/users")
			.expect("URL should parse.");

		AuthenticatedRequest::new(method, url, TokenSecret::new("at"))
	}

	#[test]
	fn method_parsing_is_case_insensitive() {
		assert_eq!("get".parse::<Method>().expect("GET should parse."), Method::Get);
		assert_eq!("Delete".parse::<Method>().expect("DELETE should parse."), Method::Delete);
		assert!(matches!(
			"PATCH".parse::<Method>(),
			Err(Error::InvalidMethod { ref method }) if method == "PATCH"
		));
	}

	#[test]
	fn query_is_appended_for_every_verb() {
		for method in [Method::Get, Method::Post, Method::Put, Method::Delete] {
			let http = request(method)
				.query("username", "ada")
				.query_opt([("max", Some("5")), ("first", None)])
				.to_http()
				.expect("Request should build.");

			assert_eq!(
				http.uri().to_string(),
				"https://sso.example.com/admin/realms/acme/users?username=ada&max=5",
			);
			assert_eq!(http.headers()[AUTHORIZATION], "Bearer at");
		}
	}

	#[test]
	fn get_ignores_body_and_delete_sends_it_only_when_present() {
		let get = request(Method::Get)
			.body(serde_json::json!({ "ignored": true }))
			.to_http()
			.expect("GET should build.");

		assert!(get.body().is_empty());
		assert!(get.headers().get(CONTENT_TYPE).is_none());

		let delete = request(Method::Delete).to_http().expect("DELETE should build.");

		assert!(delete.body().is_empty());
		assert!(delete.headers().get(CONTENT_TYPE).is_none());

		let delete = request(Method::Delete)
			.body(serde_json::json!([{ "id": "r1" }]))
			.to_http()
			.expect("DELETE with body should build.");

		assert_eq!(delete.body().as_slice(), br#"[{"id":"r1"}]"#);
		assert_eq!(delete.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
	}

	#[test]
	fn post_serializes_json() {
		let post = request(Method::Post)
			.json(&serde_json::json!({ "username": "ada" }))
			.expect("Body should serialize.")
			.to_http()
			.expect("POST should build.");

		assert_eq!(post.body().as_slice(), br#"{"username":"ada"}"#);
		assert_eq!(post.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
	}

	#[test]
	fn empty_reply_is_done() {
		let done = AdminReply::from_response(ProviderResponse {
			status: 204,
			body: String::new(),
			retry_after: None,
		});

		assert_eq!(done, AdminReply::Done);
		assert_eq!(done.json::<Option<JsonValue>>().expect("Null should decode."), None);
		assert_eq!(AdminReply::Body("7".into()).json::<u32>().expect("Count should decode."), 7);
	}
}

// crates.io
use httpmock::prelude::*;
// self
use keycloak_broker::{
	_preludet::*,
	auth::{StaticSession, TokenResponse, TokenSecret, UnconfiguredSession},
	dispatch::{AdminReply, AuthenticatedRequest, Method},
	policy::{ExceptionPolicy, Outcome},
};

async fn mount_discovery(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(GET).path(discovery_path());
			then.status(200).body(discovery_document(&server.base_url()));
		})
		.await;
}

fn broker(server: &MockServer, policy: ExceptionPolicy) -> ReqwestTestBroker {
	build_reqwest_test_broker(&server.base_url(), Arc::new(UnconfiguredSession), policy)
}

fn users_url(server: &MockServer) -> Url {
	Url::parse(&server.url(admin_path("users"))).expect("Admin URL should parse.")
}

#[tokio::test]
async fn get_appends_query_and_sends_bearer_only() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let users = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(admin_path("users"))
				.query_param("username", "ada")
				.query_param("max", "5")
				.header("authorization", "Bearer admin-token");
			then.status(200).body(r#"[{"id":"u-1","username":"ada"}]"#);
		})
		.await;
	let request = AuthenticatedRequest::new(
		Method::Get,
		users_url(&server),
		TokenSecret::new("admin-token"),
	)
	.query("username", "ada")
	.query("max", "5");
	let reply = broker(&server, ExceptionPolicy::Raise)
		.dispatch(request)
		.await
		.expect("Dispatch should succeed.")
		.success()
		.expect("200 is a success.");

	users.assert_calls_async(1).await;

	let listed: Vec<JsonValue> = reply.json().expect("Body should be JSON.");

	assert_eq!(listed[0]["id"], "u-1");
}

#[tokio::test]
async fn post_sends_json_body_and_empty_reply_is_done() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(admin_path("users"))
				.header("content-type", "application/json")
				.header("authorization", "Bearer admin-token")
				.json_body(serde_json::json!({ "username": "ada", "enabled": true }));
			then.status(201);
		})
		.await;
	let request = AuthenticatedRequest::new(
		Method::Post,
		users_url(&server),
		TokenSecret::new("admin-token"),
	)
	.body(serde_json::json!({ "username": "ada", "enabled": true }));
	let outcome =
		broker(&server, ExceptionPolicy::Raise).dispatch(request).await.expect("POST should pass.");

	create.assert_calls_async(1).await;

	assert_eq!(outcome, Outcome::Success(AdminReply::Done));
}

#[tokio::test]
async fn non_empty_success_body_is_returned_verbatim() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	server
		.mock_async(|when, then| {
			when.method(PUT).path(admin_path("users/u-1"));
			then.status(200).body("ok");
		})
		.await;

	let url = Url::parse(&server.url(admin_path("users/u-1"))).expect("URL should parse.");
	let request = AuthenticatedRequest::new(Method::Put, url, TokenSecret::new("admin-token"))
		.body(serde_json::json!({ "firstName": "Ada" }));
	let outcome =
		broker(&server, ExceptionPolicy::Raise).dispatch(request).await.expect("PUT should pass.");

	assert_eq!(outcome, Outcome::Success(AdminReply::Body("ok".into())));
}

#[tokio::test]
async fn delete_without_body_and_redirects_count_as_success() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path(admin_path("users/u-1"));
			then.status(302);
		})
		.await;
	let url = Url::parse(&server.url(admin_path("users/u-1"))).expect("URL should parse.");
	let request = AuthenticatedRequest::new(Method::Delete, url, TokenSecret::new("admin-token"));
	let outcome = broker(&server, ExceptionPolicy::Raise)
		.dispatch(request)
		.await
		.expect("DELETE should pass.");

	delete.assert_calls_async(1).await;

	assert_eq!(outcome, Outcome::Success(AdminReply::Done));
}

#[tokio::test]
async fn failures_follow_the_exception_policy() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users"));
			then.status(403).body(r#"{"error":"forbidden"}"#);
		})
		.await;

	let request =
		AuthenticatedRequest::new(Method::Get, users_url(&server), TokenSecret::new("weak"));
	let err = broker(&server, ExceptionPolicy::Raise)
		.dispatch(request.clone())
		.await
		.expect_err("403 must raise.");

	assert!(matches!(err, Error::ProviderHttp(ref inner) if inner.response.status == 403));

	let outcome = broker(&server, ExceptionPolicy::Swallow)
		.dispatch(request)
		.await
		.expect("Swallow policy should not raise.");

	assert!(matches!(outcome, Outcome::Rejected(ref response) if response.status == 403));
}

#[tokio::test]
async fn transport_failure_is_downgraded_only_under_swallow() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let dead = Url::parse("http://127.0.0.1:9/admin/realms/test-realm/users")
		.expect("URL should parse.");
	let request = AuthenticatedRequest::new(Method::Get, dead, TokenSecret::new("admin-token"));
	let outcome = broker(&server, ExceptionPolicy::Swallow)
		.dispatch(request.clone())
		.await
		.expect("Swallow policy should not raise transport failures.");

	assert!(matches!(outcome, Outcome::Unreachable(ref message) if !message.is_empty()));

	let err = broker(&server, ExceptionPolicy::Raise)
		.dispatch(request)
		.await
		.expect_err("Raise policy should surface the transport failure.");

	assert!(!err.is_typed());
}

#[test]
fn invalid_method_fails_before_any_request() {
	assert!(matches!("PATCH".parse::<Method>(), Err(Error::InvalidMethod { .. })));
}

#[tokio::test]
async fn session_admin_uses_the_session_access_token() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let count = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(admin_path("users/count"))
				.header("authorization", "Bearer session-token");
			then.status(200).body("42");
		})
		.await;
	let token = TokenResponse::from_json(br#"{"access_token":"session-token"}"#)
		.expect("Token should parse.");
	let broker = build_reqwest_test_broker(
		&server.base_url(),
		Arc::new(StaticSession(token)),
		ExceptionPolicy::Raise,
	);
	let total: u64 = broker
		.session_admin()
		.expect("Session admin should build.")
		.count_users()
		.await
		.expect("Count should succeed.")
		.into_result("count_users")
		.expect("Count should be a success.")
		.json()
		.expect("Count should be a number.");

	count.assert_calls_async(1).await;

	assert_eq!(total, 42);
}

#[tokio::test]
async fn session_admin_reaches_any_admin_resource() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let groups = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(admin_path("groups"))
				.query_param("search", "ops")
				.header("authorization", "Bearer session-token");
			then.status(200).body(r#"[{"id":"g-1","name":"ops"}]"#);
		})
		.await;
	let join = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path(admin_path("users/u-1/groups/g-1"))
				.header("authorization", "Bearer session-token");
			then.status(204);
		})
		.await;
	let child = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(admin_path("groups/g-1/children"))
				.json_body(serde_json::json!({ "name": "oncall" }));
			then.status(201);
		})
		.await;
	let leave = server
		.mock_async(|when, then| {
			when.method(DELETE).path(admin_path("users/u-1/groups/g-1"));
			then.status(204);
		})
		.await;
	let token = TokenResponse::from_json(br#"{"access_token":"session-token"}"#)
		.expect("Token should parse.");
	let broker = build_reqwest_test_broker(
		&server.base_url(),
		Arc::new(StaticSession(token)),
		ExceptionPolicy::Raise,
	);
	let admin = broker.session_admin().expect("Session admin should build.");
	let listed: Vec<JsonValue> = admin
		.get(["groups"], &[("search", "ops")])
		.await
		.expect("GET should succeed.")
		.into_result("groups")
		.expect("GET should be a success.")
		.json()
		.expect("Groups should be JSON.");

	assert_eq!(listed[0]["id"], "g-1");
	assert_eq!(
		admin.put(["users", "u-1", "groups", "g-1"], &[], None).await.expect("PUT should pass."),
		Outcome::Success(AdminReply::Done),
	);
	assert_eq!(
		admin
			.post(["groups", "g-1", "children"], &[], Some(serde_json::json!({ "name": "oncall" })))
			.await
			.expect("POST should pass."),
		Outcome::Success(AdminReply::Done),
	);
	assert!(
		admin
			.delete(["users", "u-1", "groups", "g-1"], &[], None)
			.await
			.expect("DELETE should pass.")
			.is_success()
	);

	groups.assert_calls_async(1).await;
	join.assert_calls_async(1).await;
	child.assert_calls_async(1).await;
	leave.assert_calls_async(1).await;
}

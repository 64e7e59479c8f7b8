// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::{Mock, prelude::*};
// self
use keycloak_broker::{
	_preludet::*,
	admin::RoleReconciliation,
	auth::UnconfiguredSession,
	policy::{ExceptionPolicy, Outcome},
};

const SERVICE_TOKEN: &str =
	r#"{"access_token":"svc-at","refresh_token":"svc-rt","token_type":"Bearer","expires_in":60}"#;

async fn mount_discovery(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(GET).path(discovery_path());
			then.status(200).body(discovery_document(&server.base_url()));
		})
		.await;
}

async fn mount_service_token<'a>(
	server: &'a MockServer,
	status: u16,
	body: &'static str,
) -> Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(protocol_path("token"))
				.body_includes("grant_type=client_credentials")
				.body_includes(format!("client_id={TEST_CLIENT_ID}"));
			then.status(status).body(body);
		})
		.await
}

async fn mount_release(server: &MockServer, status: u16) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path(protocol_path("logout")).body_includes("refresh_token=svc-rt");
			then.status(status);
		})
		.await
}

fn broker(server: &MockServer, policy: ExceptionPolicy) -> ReqwestTestBroker {
	build_reqwest_test_broker(&server.base_url(), Arc::new(UnconfiguredSession), policy)
}

#[tokio::test]
async fn service_token_is_acquired_used_and_released_once() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let grant = mount_service_token(&server, 200, SERVICE_TOKEN).await;
	let release = mount_release(&server, 204).await;
	let outcome = broker(&server, ExceptionPolicy::Raise)
		.run_as_service(|token| async move { Ok(token.access_token.expose().to_owned()) })
		.await
		.expect("Service transaction should succeed.");

	assert_eq!(outcome, Outcome::Success("svc-at".to_owned()));

	grant.assert_calls_async(1).await;
	release.assert_calls_async(1).await;
}

#[tokio::test]
async fn failing_work_still_releases_and_its_error_wins() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;

	let grant = mount_service_token(&server, 200, SERVICE_TOKEN).await;
	let release = mount_release(&server, 500).await;
	let err = broker(&server, ExceptionPolicy::Raise)
		.run_as_service(|_| async move {
			Err::<(), _>(Error::UserLoginNotFound { login: "ghost".into() })
		})
		.await
		.expect_err("Work failure must propagate.");

	assert!(matches!(err, Error::UserLoginNotFound { ref login } if login == "ghost"));

	grant.assert_calls_async(1).await;
	release.assert_calls_async(1).await;
}

#[tokio::test]
async fn release_failure_after_success_keeps_the_result() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;

	let release = mount_release(&server, 500).await;
	let outcome = broker(&server, ExceptionPolicy::Raise)
		.run_as_service(|_| async move { Ok(7_u8) })
		.await
		.expect("Release failure must not replace the work result.");

	assert_eq!(outcome, Outcome::Success(7));

	release.assert_calls_async(1).await;
}

#[tokio::test]
async fn token_without_refresh_token_is_still_released_once() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(
		&server,
		200,
		r#"{"access_token":"svc-at","token_type":"Bearer","expires_in":300}"#,
	)
	.await;

	let release = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(protocol_path("logout"))
				.body_includes(format!("client_id={TEST_CLIENT_ID}"))
				.body_includes(format!("client_secret={TEST_CLIENT_SECRET}"))
				.body_excludes("refresh_token");
			then.status(204);
		})
		.await;
	let broker = broker(&server, ExceptionPolicy::Raise);
	let outcome = broker
		.run_as_service(|_| async move { Ok(()) })
		.await
		.expect("Service transaction should succeed.");

	assert!(outcome.is_success());

	release.assert_calls_async(1).await;

	let err = broker
		.run_as_service(|_| async move { Err::<(), _>(Error::NoActiveSession) })
		.await
		.expect_err("Work failure must propagate.");

	assert!(matches!(err, Error::NoActiveSession));

	release.assert_calls_async(2).await;
}

#[tokio::test]
async fn service_grant_accepts_redirect_band_and_rejections_skip_the_work() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 401, r#"{"error":"unauthorized_client"}"#).await;

	let calls = Arc::new(AtomicUsize::new(0));
	let work_calls = calls.clone();
	let outcome = broker(&server, ExceptionPolicy::Swallow)
		.run_as_service(|_| async move {
			work_calls.fetch_add(1, Ordering::SeqCst);

			Ok(())
		})
		.await
		.expect("Swallow policy should not raise.");

	assert!(matches!(outcome, Outcome::Rejected(ref response) if response.status == 401));
	assert_eq!(calls.load(Ordering::SeqCst), 0);

	let redirected = MockServer::start_async().await;

	mount_discovery(&redirected).await;
	mount_service_token(&redirected, 302, SERVICE_TOKEN).await;
	mount_release(&redirected, 204).await;

	let outcome = broker(&redirected, ExceptionPolicy::Raise)
		.run_as_service(|_| async move { Ok(()) })
		.await
		.expect("302 is inside the service grant band.");

	assert!(outcome.is_success());
}

#[tokio::test]
async fn role_reconciliation_applies_only_the_difference() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;
	mount_release(&server, 204).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("clients")).query_param("clientId", TEST_CLIENT_ID);
			then.status(200).body(r#"[{"id":"c-uuid","clientId":"broker-client"}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users/u-1/role-mappings/clients/c-uuid"));
			then.status(200)
				.body(r#"[{"id":"r-admin","name":"admin"},{"id":"r-legacy","name":"legacy"}]"#);
		})
		.await;

	let lookup = server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("clients/c-uuid/roles/viewer"));
			then.status(200).body(r#"{"id":"r-viewer","name":"viewer"}"#);
		})
		.await;
	let removal = server
		.mock_async(|when, then| {
			when.method(DELETE)
				.path(admin_path("users/u-1/role-mappings/clients/c-uuid"))
				.json_body(serde_json::json!([{ "id": "r-legacy", "name": "legacy" }]));
			then.status(204);
		})
		.await;
	let addition = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(admin_path("users/u-1/role-mappings/clients/c-uuid"))
				.json_body(serde_json::json!([{ "id": "r-viewer", "name": "viewer" }]));
			then.status(204);
		})
		.await;
	let broker = &broker(&server, ExceptionPolicy::Raise);
	let reconciliation = broker
		.run_as_service(|token| async move {
			broker
				.admin(&token.access_token)
				.update_effective_user_roles("u-1", TEST_CLIENT_ID, &["admin", "viewer", ""])
				.await?
				.into_result("update_effective_user_roles")
		})
		.await
		.expect("Reconciliation should succeed.")
		.success()
		.expect("Reconciliation should be a success.");

	assert_eq!(
		reconciliation,
		RoleReconciliation { added: vec!["viewer".into()], removed: vec!["legacy".into()] },
	);

	lookup.assert_calls_async(1).await;
	removal.assert_calls_async(1).await;
	addition.assert_calls_async(1).await;
}

#[tokio::test]
async fn role_reconciliation_is_idempotent() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;
	mount_release(&server, 204).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("clients"));
			then.status(200).body(r#"[{"id":"c-uuid","clientId":"broker-client"}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users/u-1/role-mappings/clients/c-uuid"));
			then.status(200).body(r#"[{"id":"r-admin","name":"admin"}]"#);
		})
		.await;

	let removal = server
		.mock_async(|when, then| {
			when.method(DELETE).path(admin_path("users/u-1/role-mappings/clients/c-uuid"));
			then.status(204);
		})
		.await;
	let addition = server
		.mock_async(|when, then| {
			when.method(POST).path(admin_path("users/u-1/role-mappings/clients/c-uuid"));
			then.status(204);
		})
		.await;
	let broker = &broker(&server, ExceptionPolicy::Raise);
	let reconciliation = broker
		.run_as_service(|token| async move {
			broker
				.admin(&token.access_token)
				.update_effective_user_roles("u-1", TEST_CLIENT_ID, &["admin"])
				.await?
				.into_result("update_effective_user_roles")
		})
		.await
		.expect("Reconciliation should succeed.")
		.success()
		.expect("Reconciliation should be a success.");

	assert!(reconciliation.is_unchanged());

	removal.assert_calls_async(0).await;
	addition.assert_calls_async(0).await;
}

#[tokio::test]
async fn forgot_password_finds_the_exact_user_and_sends_the_action_email() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;

	let release = mount_release(&server, 204).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users")).query_param("email", "ada@example.com");
			then.status(200).body(
				r#"[{"id":"u-0","username":"adam","email":"adam.ada@example.com"},
				   {"id":"u-1","username":"ada","email":"ada@example.com"}]"#,
			);
		})
		.await;

	let email = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path(admin_path("users/u-1/execute-actions-email"))
				.query_param("redirect_uri", "https://app.example.com/done")
				.query_param("client_id", TEST_CLIENT_ID)
				.json_body(serde_json::json!(["UPDATE_PASSWORD"]));
			then.status(204);
		})
		.await;
	let outcome = broker(&server, ExceptionPolicy::Raise)
		.forgot_password("ada@example.com", Some("https://app.example.com/done"))
		.await
		.expect("Password reset should succeed.");

	assert!(outcome.is_success());

	email.assert_calls_async(1).await;
	// One transaction for the lookup, one for the email.
	release.assert_calls_async(2).await;
}

#[tokio::test]
async fn unknown_login_is_a_typed_error() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;
	mount_release(&server, 204).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users")).query_param("username", "ghost");
			then.status(200).body("[]");
		})
		.await;

	let err = broker(&server, ExceptionPolicy::Raise)
		.find_user("ghost")
		.await
		.expect_err("Unknown login must fail.");

	assert!(matches!(err, Error::UserLoginNotFound { ref login } if login == "ghost"));
}

#[tokio::test]
async fn starter_user_reuses_existing_account_and_sets_password_and_roles() {
	let server = MockServer::start_async().await;

	mount_discovery(&server).await;
	mount_service_token(&server, 200, SERVICE_TOKEN).await;
	mount_release(&server, 204).await;

	let lookup = server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("users")).query_param("username", "grace");
			then.status(200).body(r#"[{"id":"u-g","username":"grace"}]"#);
		})
		.await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path(admin_path("users"));
			then.status(201);
		})
		.await;
	let password = server
		.mock_async(|when, then| {
			when.method(PUT).path(admin_path("users/u-g/reset-password")).json_body(
				serde_json::json!({ "type": "password", "temporary": false, "value": "s3cret" }),
			);
			then.status(204);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("clients")).query_param("clientId", TEST_CLIENT_ID);
			then.status(200).body(r#"[{"id":"c-uuid"}]"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(admin_path("clients/c-uuid/roles/viewer"));
			then.status(200).body(r#"{"id":"r-viewer","name":"viewer"}"#);
		})
		.await;

	let roles = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(admin_path("users/u-g/role-mappings/clients/c-uuid"))
				.json_body(serde_json::json!([{ "id": "r-viewer", "name": "viewer" }]));
			then.status(204);
		})
		.await;
	let user = broker(&server, ExceptionPolicy::Raise)
		.create_starter_user("grace", "s3cret", "grace@example.com", &["viewer", ""])
		.await
		.expect("Starter user should be provisioned.")
		.success()
		.expect("Provisioning should be a success.");

	assert_eq!(user["id"], "u-g");

	lookup.assert_calls_async(1).await;
	create.assert_calls_async(0).await;
	password.assert_calls_async(1).await;
	roles.assert_calls_async(1).await;
}

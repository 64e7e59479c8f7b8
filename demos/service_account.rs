//! Runs an admin call inside a service-account transaction against a mock Keycloak realm and
//! shows that the service token is released afterwards.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use keycloak_broker::{flows::ReqwestBroker, policy::ExceptionPolicy, provider::Installation};

const REALM: &str = "demo";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let realm = format!("{}/realms/{REALM}", server.base_url());
	let protocol = format!("{realm}/protocol/openid-connect");

	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/realms/{REALM}/.well-known/openid-configuration"));
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"issuer": realm,
					"authorization_endpoint": format!("{protocol}/auth"),
					"token_endpoint": format!("{protocol}/token"),
					"token_introspection_endpoint": format!("{protocol}/token/introspect"),
					"userinfo_endpoint": format!("{protocol}/userinfo"),
					"end_session_endpoint": format!("{protocol}/logout"),
				})
				.to_string(),
			);
		})
		.await;

	let grant = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/realms/{REALM}/protocol/openid-connect/token"))
				.body_includes("grant_type=client_credentials");
			// Keycloak's default client-credentials reply carries no refresh token.
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"service-access","expires_in":300}"#);
		})
		.await;
	let count = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(format!("/admin/realms/{REALM}/users/count"))
				.header("authorization", "Bearer service-access");
			then.status(200).body("3");
		})
		.await;
	let release = server
		.mock_async(|when, then| {
			when.method(POST).path(format!("/realms/{REALM}/protocol/openid-connect/logout"));
			then.status(204);
		})
		.await;
	let broker = &ReqwestBroker::new(Installation::new(
		REALM,
		server.base_url(),
		"demo-service",
		"super-secret",
	))?
	.with_exception_policy(ExceptionPolicy::Raise);
	let users = broker
		.run_as_service(|token| async move {
			broker
				.admin(&token.access_token)
				.count_users()
				.await?
				.into_result("count_users")?
				.json::<u64>()
		})
		.await?
		.into_result("run_as_service")?;

	println!("The realm has {users} users.");

	grant.assert_async().await;
	count.assert_async().await;
	release.assert_async().await;

	Ok(())
}

//! Checks a client role on a bearer token: the token is introspected first, then its
//! `resource_access` claim is read.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
// self
use keycloak_broker::{flows::ReqwestBroker, provider::Installation};

const REALM: &str = "demo";
const CLIENT_ID: &str = "portal";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let protocol = format!("{}/realms/{REALM}/protocol/openid-connect", server.base_url());

	server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/realms/{REALM}/.well-known/openid-configuration"));
			then.status(200).body(
				serde_json::json!({
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

	let introspect = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(format!("/realms/{REALM}/protocol/openid-connect/token/introspect"));
			then.status(200).body("{\"active\":true}");
		})
		.await;
	let payload = serde_json::json!({
		"sub": "user-1",
		"resource_access": { CLIENT_ID: { "roles": ["editor"] } },
	});
	// Signature is not checked locally; introspection vouches for the token.
	let token = format!(
		"{}.{}.c2ln",
		URL_SAFE_NO_PAD.encode("{\"alg\":\"RS256\"}"),
		URL_SAFE_NO_PAD.encode(payload.to_string()),
	);
	let broker =
		ReqwestBroker::new(Installation::new(REALM, server.base_url(), CLIENT_ID, "secret"))?;

	for role in ["editor", "admin"] {
		println!("Has {role}: {}.", broker.has_role(role, Some(&token)).await?);
	}

	introspect.assert_calls_async(2).await;

	Ok(())
}

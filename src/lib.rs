//! Keycloak OpenID Connect client and admin API broker: grant exchanges, introspection, role
//! checks, and a uniformly authenticated dispatcher for the realm admin REST surface.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod admin;
pub mod auth;
pub mod dispatch;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod policy;
pub mod provider;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::SessionProvider,
		flows::Broker,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		policy::ExceptionPolicy,
		provider::{Installation, InstallationSource},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Realm used by the mock provider fixtures.
	pub const TEST_REALM: &str = "test-realm";
	/// Client identifier used by the mock provider fixtures.
	pub const TEST_CLIENT_ID: &str = "broker-client";
	/// Client secret used by the mock provider fixtures.
	pub const TEST_CLIENT_SECRET: &str = "broker-secret";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests and never follows redirects.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Installation descriptor pointing at a mock provider rooted at `base_url`.
	pub fn test_installation(base_url: &str) -> Installation {
		Installation::new(TEST_REALM, base_url, TEST_CLIENT_ID, TEST_CLIENT_SECRET)
			.with_realm_public_key("MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAtest")
	}

	/// The discovery document a Keycloak realm served from `base_url` publishes.
	pub fn discovery_document(base_url: &str) -> String {
		let realm = format!("{base_url}/realms/{TEST_REALM}/protocol/openid-connect");

		serde_json::json!({
			"issuer": format!("{base_url}/realms/{TEST_REALM}"),
			"authorization_endpoint": format!("{realm}/auth"),
			"token_endpoint": format!("{realm}/token"),
			"token_introspection_endpoint": format!("{realm}/token/introspect"),
			"userinfo_endpoint": format!("{realm}/userinfo"),
			"end_session_endpoint": format!("{realm}/logout"),
		})
		.to_string()
	}

	/// Path of the discovery document on the mock provider.
	pub fn discovery_path() -> String {
		format!("/realms/{TEST_REALM}/.well-known/openid-configuration")
	}

	/// Path of an OIDC protocol endpoint (`token`, `logout`, ...) on the mock provider.
	pub fn protocol_path(endpoint: &str) -> String {
		format!("/realms/{TEST_REALM}/protocol/openid-connect/{endpoint}")
	}

	/// Path of an admin resource on the mock provider.
	pub fn admin_path(resource: &str) -> String {
		format!("/admin/realms/{TEST_REALM}/{resource}")
	}

	/// Constructs a [`Broker`] for the mock provider at `base_url` with the given session and
	/// exception policy.
	pub fn build_reqwest_test_broker(
		base_url: &str,
		session: Arc<dyn SessionProvider>,
		policy: ExceptionPolicy,
	) -> ReqwestTestBroker {
		Broker::with_http_client(
			InstallationSource::Inline(test_installation(base_url)),
			test_reqwest_http_client(),
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_session(session)
		.with_exception_policy(policy)
	}

	/// Encodes `claims` as an unsigned JWT so tests can exercise claim inspection.
	pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
		use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};

//! Discovered provider configuration and the realm URLs derived from it.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, DiscoveryError},
	provider::Installation,
};

/// Subset of the OIDC discovery document the broker relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
	/// Issuer identifier, when published.
	#[serde(default)]
	pub issuer: Option<Url>,
	/// Authorization endpoint used for interactive logins.
	pub authorization_endpoint: Url,
	/// Token endpoint used by every grant.
	pub token_endpoint: Url,
	/// Token introspection endpoint.
	#[serde(alias = "introspection_endpoint")]
	pub token_introspection_endpoint: Url,
	/// Userinfo endpoint.
	pub userinfo_endpoint: Url,
	/// End-session (logout) endpoint.
	pub end_session_endpoint: Url,
}
impl DiscoveryDocument {
	/// Parses a discovery document body.
	pub fn from_json(bytes: &[u8]) -> Result<Self, DiscoveryError> {
		crate::error::decode_json(bytes).map_err(|source| DiscoveryError::Malformed { source })
	}
}

/// Endpoint set discovered from the realm's well-known document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint.
	pub authorization: Url,
	/// Token endpoint.
	pub token: Url,
	/// Token introspection endpoint.
	pub introspection: Url,
	/// Userinfo endpoint.
	pub userinfo: Url,
	/// End-session endpoint.
	pub end_session: Url,
	/// Discovery document the endpoints were read from.
	pub well_known: Url,
}

/// Immutable provider configuration shared by every operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfiguration {
	/// Realm name.
	pub realm: String,
	/// Base server URL without trailing slashes.
	pub server_url: String,
	/// Client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: TokenSecret,
	/// Realm public key, when the descriptor carries one.
	pub realm_public_key: Option<String>,
	/// Discovered endpoints.
	pub endpoints: ProviderEndpoints,
}
impl ProviderConfiguration {
	/// Combines a descriptor with its discovery document.
	pub fn new(installation: &Installation, well_known: Url, document: DiscoveryDocument) -> Self {
		Self {
			realm: installation.realm.clone(),
			server_url: installation.server_url().to_owned(),
			client_id: installation.client_id.clone(),
			client_secret: installation.credentials.secret.clone(),
			realm_public_key: installation.realm_public_key.clone(),
			endpoints: ProviderEndpoints {
				authorization: document.authorization_endpoint,
				token: document.token_endpoint,
				introspection: document.token_introspection_endpoint,
				userinfo: document.userinfo_endpoint,
				end_session: document.end_session_endpoint,
				well_known,
			},
		}
	}

	/// Interactive login URL carrying `response_type`, `client_id`, and `redirect_uri`.
	pub fn login_redirect_url(&self, redirect_uri: &str, response_type: &str) -> Url {
		let mut url = self.endpoints.authorization.clone();

		url.query_pairs_mut()
			.append_pair("response_type", response_type)
			.append_pair("client_id", &self.client_id)
			.append_pair("redirect_uri", redirect_uri);

		url
	}

	/// End-session URL, optionally carrying a post-logout `redirect_uri`.
	pub fn end_session_url(&self, redirect_uri: Option<&str>) -> Url {
		let mut url = self.endpoints.end_session.clone();

		if let Some(redirect) = redirect_uri.filter(|value| !value.is_empty()) {
			url.query_pairs_mut().append_pair("redirect_uri", redirect);
		}

		url
	}

	/// Self-service account console of the realm.
	pub fn account_url(&self) -> Result<Url, ConfigError> {
		let raw = format!("{}/realms/{}/account", self.server_url, self.realm);

		Url::parse(&raw).map_err(|source| ConfigError::invalid_url(raw, source))
	}

	/// Root of the realm admin REST API (`{server}/admin/realms/{realm}`).
	pub fn admin_base(&self) -> Result<Url, ConfigError> {
		let raw = format!("{}/admin/realms/{}", self.server_url, self.realm);

		Url::parse(&raw).map_err(|source| ConfigError::invalid_url(raw, source))
	}

	/// Admin resource URL; every segment is percent-encoded on its own.
	pub fn admin_url<I, S>(&self, segments: I) -> Result<Url, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut url = self.admin_base()?;

		url.path_segments_mut()
			.map_err(|_| ConfigError::CannotBeABase { url: self.server_url.clone() })?
			.pop_if_empty()
			.extend(segments);

		Ok(url)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn configuration() -> ProviderConfiguration {
		let installation =
			Installation::new("acme", "https://sso.example.com/auth/", "portal", "s");
		let document = DiscoveryDocument::from_json(
			br#"{
				"issuer": "https://sso.example.com/auth/realms/acme",
				"authorization_endpoint": "https://sso.example.com/auth/realms/acme/protocol/openid-connect/auth",
				"token_endpoint": "https://sso.example.com/auth/realms/acme/protocol/openid-connect/token",
				"introspection_endpoint": "https://sso.example.com/auth/realms/acme/protocol/openid-connect/token/introspect",
				"userinfo_endpoint": "https://sso.example.com/auth/realms/acme/protocol/openid-connect/userinfo",
				"end_session_endpoint": "https://sso.example.com/auth/realms/acme/protocol/openid-connect/logout",
				"grant_types_supported": ["password"]
			}"#,
		)
		.expect("Discovery document should parse.");
		let well_known = installation.well_known_url().expect("Well-known URL should build.");

		ProviderConfiguration::new(&installation, well_known, document)
	}

	#[test]
	fn introspection_alias_is_accepted() {
		assert!(configuration().endpoints.introspection.path().ends_with("/token/introspect"));
	}

	#[test]
	fn login_redirect_carries_client_and_redirect() {
		let url = configuration().login_redirect_url("https://app.example.com/cb?x=1", "code");

		assert_eq!(
			url.query(),
			Some(
				"response_type=code&client_id=portal\
				 &redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb%3Fx%3D1"
			),
		);
	}

	#[test]
	fn admin_url_encodes_each_segment() {
		let url = configuration()
			.admin_url(["clients", "c-1", "roles", "report viewer"])
			.expect("Admin URL should build.");

		assert_eq!(
			url.as_str(),
			"https://sso.example.com/auth/admin/realms/acme/clients/c-1/roles/report%20viewer",
		);
	}

	#[test]
	fn account_and_end_session_urls() {
		let config = configuration();

		assert_eq!(
			config.account_url().expect("Account URL should build.").as_str(),
			"https://sso.example.com/auth/realms/acme/account",
		);
		assert_eq!(
			config.end_session_url(Some("https://app/bye")).query(),
			Some("redirect_uri=https%3A%2F%2Fapp%2Fbye"),
		);
		assert_eq!(config.end_session_url(Some("")).query(), None);
	}
}

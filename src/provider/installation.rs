//! Installation descriptor (`keycloak.json`) loading.

// std
use std::{fs, path::PathBuf};
// self
use crate::{_prelude::*, auth::TokenSecret, error::SetupError};

/// File name Keycloak uses when exporting a client's installation descriptor.
pub const DEFAULT_INSTALLATION_FILE: &str = "keycloak.json";

/// Realm and client identity exported by the provider for one client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
	/// Realm name.
	pub realm: String,
	/// Base server URL (e.g. `https://sso.example.com/auth`).
	#[serde(rename = "auth-server-url")]
	pub auth_server_url: String,
	/// Client identifier.
	#[serde(rename = "resource")]
	pub client_id: String,
	/// Confidential client credentials.
	#[serde(default)]
	pub credentials: InstallationCredentials,
	/// Realm public key (PEM body without armor).
	#[serde(rename = "realm-public-key", default)]
	pub realm_public_key: Option<String>,
}
impl Installation {
	/// Creates an inline descriptor.
	pub fn new(
		realm: impl Into<String>,
		auth_server_url: impl Into<String>,
		client_id: impl Into<String>,
		secret: impl Into<String>,
	) -> Self {
		Self {
			realm: realm.into(),
			auth_server_url: auth_server_url.into(),
			client_id: client_id.into(),
			credentials: InstallationCredentials { secret: TokenSecret::new(secret) },
			realm_public_key: None,
		}
	}

	/// Attaches the realm public key.
	pub fn with_realm_public_key(mut self, key: impl Into<String>) -> Self {
		self.realm_public_key = Some(key.into());

		self
	}

	/// Parses a descriptor from JSON bytes.
	pub fn from_json(bytes: &[u8]) -> Result<Self, SetupError> {
		crate::error::decode_json(bytes).map_err(|source| SetupError::Malformed { source })
	}

	/// Reads and parses a descriptor file.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SetupError> {
		let path = path.into();
		let bytes = fs::read(&path).map_err(|source| SetupError::Missing { path, source })?;

		Self::from_json(&bytes)
	}

	/// Server URL without trailing slashes.
	pub fn server_url(&self) -> &str {
		self.auth_server_url.trim_end_matches('/')
	}

	/// Location of the realm's OIDC discovery document.
	pub fn well_known_url(&self) -> Result<Url, SetupError> {
		let raw = format!(
			"{}/realms/{}/.well-known/openid-configuration",
			self.server_url(),
			self.realm,
		);

		Url::parse(&raw).map_err(|source| SetupError::InvalidServerUrl {
			url: self.auth_server_url.clone(),
			source,
		})
	}
}
impl Debug for Installation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Installation")
			.field("realm", &self.realm)
			.field("auth_server_url", &self.auth_server_url)
			.field("client_id", &self.client_id)
			.field("credentials", &self.credentials)
			.field("realm_public_key_set", &self.realm_public_key.is_some())
			.finish()
	}
}

/// Client credentials block of the descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationCredentials {
	/// Client secret.
	#[serde(default)]
	pub secret: TokenSecret,
}

/// Where the broker obtains its installation descriptor.
#[derive(Clone, Debug)]
pub enum InstallationSource {
	/// Read from a JSON file on first use.
	File(PathBuf),
	/// Supplied directly by the host.
	Inline(Installation),
}
impl InstallationSource {
	/// Loads the descriptor.
	pub fn load(&self) -> Result<Installation, SetupError> {
		match self {
			Self::File(path) => Installation::from_file(path.clone()),
			Self::Inline(installation) => Ok(installation.clone()),
		}
	}
}
impl Default for InstallationSource {
	fn default() -> Self {
		Self::File(PathBuf::from(DEFAULT_INSTALLATION_FILE))
	}
}
impl From<Installation> for InstallationSource {
	fn from(installation: Installation) -> Self {
		Self::Inline(installation)
	}
}

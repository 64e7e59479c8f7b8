//! Grant types and their token endpoint form payloads.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// OAuth 2.0 grant types the broker can exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Resource-owner password credentials.
	Password,
	/// Authorization Code grant.
	AuthorizationCode,
	/// Refresh Token grant.
	RefreshToken,
	/// Client Credentials grant for service-account tokens.
	ClientCredentials,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::Password => "password",
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::ClientCredentials => "client_credentials",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Grant-specific fields posted to the token endpoint.
///
/// The variant only decides which fields are present; every variant goes through the same
/// exchange path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GrantRequest {
	/// Resource-owner password credentials.
	Password {
		/// Username.
		username: String,
		/// Password.
		password: TokenSecret,
	},
	/// Authorization code returned to `redirect_uri`.
	AuthorizationCode {
		/// Authorization code.
		code: String,
		/// Redirect URI used for the authorization request.
		redirect_uri: String,
	},
	/// Refresh token exchange.
	RefreshToken {
		/// Refresh token.
		refresh_token: TokenSecret,
	},
	/// Client credentials (service account).
	ClientCredentials,
}
impl GrantRequest {
	/// Resource-owner password credentials grant.
	pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self::Password { username: username.into(), password: TokenSecret::new(password) }
	}

	/// Authorization code grant.
	pub fn authorization_code(code: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
		Self::AuthorizationCode { code: code.into(), redirect_uri: redirect_uri.into() }
	}

	/// Refresh token grant.
	pub fn refresh_token(refresh_token: impl Into<String>) -> Self {
		Self::RefreshToken { refresh_token: TokenSecret::new(refresh_token) }
	}

	/// Grant type of the payload.
	pub fn grant_type(&self) -> GrantType {
		match self {
			Self::Password { .. } => GrantType::Password,
			Self::AuthorizationCode { .. } => GrantType::AuthorizationCode,
			Self::RefreshToken { .. } => GrantType::RefreshToken,
			Self::ClientCredentials => GrantType::ClientCredentials,
		}
	}

	/// Assembles the form payload, client credentials first.
	pub fn form(&self, client_id: &str, client_secret: &TokenSecret) -> Vec<(String, String)> {
		let mut form = vec![
			("client_id".to_owned(), client_id.to_owned()),
			("client_secret".to_owned(), client_secret.expose().to_owned()),
		];

		match self {
			Self::Password { username, password } => {
				form.push(("username".into(), username.clone()));
				form.push(("password".into(), password.expose().to_owned()));
			},
			Self::AuthorizationCode { code, redirect_uri } => {
				form.push(("code".into(), code.clone()));
				form.push(("redirect_uri".into(), redirect_uri.clone()));
			},
			Self::RefreshToken { refresh_token } => {
				form.push(("refresh_token".into(), refresh_token.expose().to_owned()));
			},
			Self::ClientCredentials => {},
		}

		form.push(("grant_type".into(), self.grant_type().as_str().into()));

		form
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn keys(request: &GrantRequest) -> Vec<String> {
		request
			.form("portal", &TokenSecret::new("s"))
			.into_iter()
			.map(|(key, _)| key)
			.collect()
	}

	#[test]
	fn each_grant_carries_its_field_set() {
		assert_eq!(
			keys(&GrantRequest::password("ada", "pw")),
			["client_id", "client_secret", "username", "password", "grant_type"],
		);
		assert_eq!(
			keys(&GrantRequest::authorization_code("c0de", "https://app/cb")),
			["client_id", "client_secret", "code", "redirect_uri", "grant_type"],
		);
		assert_eq!(
			keys(&GrantRequest::refresh_token("r")),
			["client_id", "client_secret", "refresh_token", "grant_type"],
		);
		assert_eq!(
			keys(&GrantRequest::ClientCredentials),
			["client_id", "client_secret", "grant_type"],
		);
	}

	#[test]
	fn grant_type_labels_follow_rfc() {
		assert_eq!(GrantRequest::password("a", "b").grant_type().to_string(), "password");
		assert_eq!(GrantType::ClientCredentials.as_str(), "client_credentials");
	}
}

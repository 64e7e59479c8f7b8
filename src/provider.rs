//! Provider-facing data: the local installation descriptor, the discovered OIDC configuration,
//! the lazily populated resolver that ties them together, and the grant payloads posted to the
//! token endpoint.
//!
//! `installation` reads the `keycloak.json` shape (realm, server URL, client credentials).
//! `configuration` holds the discovered endpoint set and derives realm URLs from it.
//! `resolver` fetches discovery once and caches it until explicitly invalidated.

pub mod configuration;
pub mod grant;
pub mod installation;
pub mod resolver;

pub use configuration::*;
pub use grant::*;
pub use installation::*;
pub use resolver::*;

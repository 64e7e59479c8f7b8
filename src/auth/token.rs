//! Token payloads returned by the provider and the secret wrapper that keeps them out of logs.

pub mod response;
pub mod secret;

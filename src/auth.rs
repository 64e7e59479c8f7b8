//! Auth-domain token models, claim inspection, and the host session boundary.

pub mod claims;
pub mod session;
pub mod token;

pub use claims::*;
pub use session::*;
pub use token::{response::*, secret::*};

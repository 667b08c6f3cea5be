//! Credential and token models for the two-stage SP-API exchange.

pub mod bearer;
pub mod credential;
pub mod secret;

pub use bearer::*;
pub use credential::*;
pub use secret::*;

//! Domain types and models

pub mod credential;
pub mod envelope;
pub mod inspection;

pub use credential::{CredentialKind, CredentialRecord};
pub use envelope::Envelope;
pub use inspection::InspectionResult;

pub mod auth;
pub mod client;
pub mod emit;
pub mod engine;
pub mod fhir;
pub mod normalize;
pub mod parser;

pub use crate::domain::model::{
    CanonicalValueSet, CodeSystemGroup, Concept, Credential, ServiceTicket,
};
pub use crate::domain::ports::CredentialStore;
pub use crate::utils::error::Result;

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::store::FileCredentialStore;
pub use crate::config::Endpoints;
pub use crate::core::emit::OutputFormat;
pub use crate::core::engine::{OutputTarget, VsacEngine};
pub use crate::utils::error::{Result, VsacError};

//! Dailies Core Library
//!
//! This crate provides the shared domain types of the dailies media engine:
//! the unified error type, runtime configuration, fixed layout constants,
//! the stored-artifact chain model, and the owning-entity contract.

pub mod artifact;
pub mod config;
pub mod constants;
pub mod error;
pub mod owner;

// Re-export commonly used types
pub use artifact::StoredArtifact;
pub use config::{file_extension, MediaConfig};
pub use error::{MediaError, MediaResult};
pub use owner::MediaOwner;

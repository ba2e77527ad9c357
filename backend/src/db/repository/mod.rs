//! Repository trait definitions for dataset storage.
//!
//! - [`error`]: Error types for repository operations
//! - [`dataset`]: Storage and retrieval of normalized datasets

pub mod dataset;
pub mod error;

pub use dataset::DatasetRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

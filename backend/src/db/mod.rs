//! Dataset storage.
//!
//! This module provides abstractions for dataset storage via the Repository
//! pattern, so the HTTP layer never depends on a concrete store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Application Layer (REST API, server bootstrap)         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (services.rs)                            │
//! │  - Checksums and deduplication                          │
//! │  - Row normalization and lookup construction            │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Trait (repository/) - Abstract Interface    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────▼──────────────────────────────┐
//!     │             Local Repository                  │
//!     │               (in-memory)                     │
//!     └──────────────────────────────────────────────┘
//! ```

pub mod checksum;
pub mod models;
pub mod repositories;
pub mod repository;
pub mod services;


pub use checksum::{calculate_checksum, dataset_checksum};
pub use models::{Dataset, DatasetInfo};
pub use repositories::LocalRepository;
pub use repository::{DatasetRepository, ErrorContext, RepositoryError, RepositoryResult};
pub use services::DatasetUpload;

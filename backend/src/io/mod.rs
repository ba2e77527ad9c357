//! Data loading utilities.
//!
//! Parses the JSON inputs of a dataset (survey rows, the code reference table
//! and the field catalog) with errors that point at the offending JSON path.
//!
//! # Example
//!
//! ```no_run
//! use segment_insights::io::loaders::DatasetLoader;
//! use std::path::Path;
//!
//! let rows = DatasetLoader::load_records_file(Path::new("segments.json"))
//!     .expect("Failed to load");
//! println!("Loaded {} rows", rows.len());
//! ```

pub mod loaders;


pub use loaders::{
    parse_field_catalog, parse_records, parse_reference_table, DatasetLoader, LoadError,
};

//! Core data model: raw rows, normalized rows, reference tables and
//! dataset identifiers.

pub mod macros;
pub mod lookup;
pub mod record;
pub mod value;

pub use lookup::{CodeLookup, FieldCatalog, ReferenceEntry};
pub use record::{NormalizedRecord, Record};

crate::define_id_type!(i64, DatasetId);

//! Schema layer: schema introspection and the record layout derived from it.
//!
//! This module knows nothing about accumulated records. It owns:
//! - FieldSpec (one flat field of a record, with requiredness and kind)
//! - SchemaLayout (classes, primary class, property order, spatial points)

pub mod field;
pub mod layout;

pub use field::{FieldKind, FieldSpec, IdMode, ID_FIELD};
pub use layout::SchemaLayout;

/// Last path segment of a JSON reference: "#/definitions/Cell" => "Cell".
pub(crate) fn ref_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

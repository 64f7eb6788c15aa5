//! Output rendering for accumulated annotations.

pub mod csv;
pub mod json;

pub use csv::render_csv;
pub use json::render_annotations_json;

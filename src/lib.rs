//! Build and validate schema-shaped annotation records.
//!
//! A [`Guide`] derives a flat record layout from a JSON schema (spatial-point
//! properties become `<prop>_position`), validates every added record against
//! the schema, and exposes the accepted records either schema-shaped
//! ([`Guide::annotations`]) or as a table ([`Guide::annotation_dataframe`]).
//! [`build_guide`] resolves the schema through a table or schema name first.

pub mod config;
pub mod error;
pub mod factory;
pub mod frame;
pub mod guide;
pub mod record;
pub mod render;
pub mod resolver;
pub mod schema;

pub use config::{GuideConfig, GuideOptions};
pub use error::{GuideError, Result};
pub use factory::{GuideFactory, MetadataResolver, SchemaProvider, TableMetadata, build_guide};
pub use frame::AnnotationFrame;
pub use guide::{AnnotationBuilder, Guide};
pub use record::AnnotationRecord;
pub use resolver::{DirectoryResolver, MemoryResolver};
pub use schema::{FieldKind, FieldSpec, SchemaLayout};

//! Resolve a schema by table or schema name and build a [`Guide`] for it.

use crate::config::{GuideConfig, GuideOptions};
use crate::error::{GuideError, Result};
use crate::guide::Guide;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

/// Table metadata as returned by the materialization service. Only `schema`
/// is interpreted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableMetadata {
    #[serde(alias = "schema_type")]
    pub schema: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableMetadata {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            extra: Map::new(),
        }
    }
}

/// Maps a table name to its metadata (and so to its schema name).
pub trait MetadataResolver {
    fn get_table_metadata(&self, table_name: &str) -> anyhow::Result<TableMetadata>;
}

/// Fetches a schema definition by schema name.
pub trait SchemaProvider {
    fn schema_definition(&self, schema_name: &str) -> anyhow::Result<Value>;
}

/// Builder over a client providing both collaborator interfaces.
pub struct GuideFactory<'c, C> {
    client: &'c C,
    table_name: Option<String>,
    schema_name: Option<String>,
    update: bool,
    id_field: bool,
    config: GuideConfig,
}

impl<'c, C> GuideFactory<'c, C>
where
    C: MetadataResolver + SchemaProvider,
{
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            table_name: None,
            schema_name: None,
            update: false,
            id_field: false,
            config: GuideConfig::default(),
        }
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn id_field(mut self, id_field: bool) -> Self {
        self.id_field = id_field;
        self
    }

    pub fn config(mut self, config: GuideConfig) -> Self {
        self.config = config;
        self
    }

    /// A table name takes precedence over a schema name; the table's schema
    /// is looked up through the metadata resolver.
    pub fn build(self) -> Result<Guide> {
        let (obj_name, schema_name) = match (self.table_name, self.schema_name) {
            (Some(table), _) => {
                let metadata = self.client.get_table_metadata(&table)?;
                debug!(table = %table, schema = %metadata.schema, "resolved table schema");
                (table, metadata.schema)
            }
            (None, Some(schema)) => (schema.clone(), schema),
            (None, None) => {
                return Err(GuideError::argument(
                    "must specify either table name or schema name",
                ));
            }
        };

        let schema = self.client.schema_definition(&schema_name)?;
        let options = GuideOptions::named(obj_name)
            .update(self.update)
            .id_field(self.id_field)
            .config(self.config);
        Guide::with_options(schema, options)
    }
}

/// Build an annotation guide for a table or schema.
///
/// Either `table_name` or `schema_name` must be given; when both are, the
/// table's schema wins. The guide is named after whichever was used.
pub fn build_guide<C>(
    client: &C,
    table_name: Option<&str>,
    schema_name: Option<&str>,
    update: bool,
    id_field: bool,
) -> Result<Guide>
where
    C: MetadataResolver + SchemaProvider,
{
    let mut factory = GuideFactory::new(client).update(update).id_field(id_field);
    if let Some(table) = table_name {
        factory = factory.table_name(table);
    }
    if let Some(schema) = schema_name {
        factory = factory.schema_name(schema);
    }
    factory.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn metadata_keeps_extra_keys() {
        let md: TableMetadata = serde_json::from_value(json!({
            "schema": "cell_type_local",
            "voxel_resolution": [4, 4, 40],
            "description": "cell types"
        }))
        .unwrap();
        assert_eq!(md.schema, "cell_type_local");
        assert_eq!(md.extra.get("voxel_resolution"), Some(&json!([4, 4, 40])));
    }

    #[test]
    fn metadata_accepts_schema_type_alias() {
        let md: TableMetadata =
            serde_json::from_value(json!({"schema_type": "bound_tag"})).unwrap();
        assert_eq!(md, TableMetadata::new("bound_tag"));
    }
}

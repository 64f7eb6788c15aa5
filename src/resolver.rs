//! Concrete schema/metadata collaborators that need no schema service.
//!
//! - MemoryResolver: tables and schemas registered up front
//! - DirectoryResolver: a local directory laid out as
//!   <root>/tables.json              {"<table>": {"schema": "<schema>", ...}, ...}
//!   <root>/schemas/<schema>.json    one schema definition per file

use crate::factory::{MetadataResolver, SchemaProvider, TableMetadata};

use anyhow::{Context, anyhow, bail};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    tables: BTreeMap<String, TableMetadata>,
    schemas: BTreeMap<String, Value>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table_name: impl Into<String>, schema_name: impl Into<String>) -> Self {
        self.tables
            .insert(table_name.into(), TableMetadata::new(schema_name));
        self
    }

    pub fn with_schema(mut self, schema_name: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(schema_name.into(), schema);
        self
    }
}

impl MetadataResolver for MemoryResolver {
    fn get_table_metadata(&self, table_name: &str) -> anyhow::Result<TableMetadata> {
        self.tables
            .get(table_name)
            .cloned()
            .ok_or_else(|| anyhow!("no metadata for table '{}'", table_name))
    }
}

impl SchemaProvider for MemoryResolver {
    fn schema_definition(&self, schema_name: &str) -> anyhow::Result<Value> {
        self.schemas
            .get(schema_name)
            .cloned()
            .ok_or_else(|| anyhow!("no schema named '{}'", schema_name))
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tables_path(&self) -> PathBuf {
        self.root.join("tables.json")
    }

    fn schema_path(&self, schema_name: &str) -> anyhow::Result<PathBuf> {
        // Schema names become file names; keep them inside schemas/.
        if schema_name.is_empty()
            || schema_name.contains(['/', '\\'])
            || schema_name.starts_with('.')
        {
            bail!("invalid schema name {:?}", schema_name);
        }
        Ok(self
            .root
            .join("schemas")
            .join(format!("{}.json", schema_name)))
    }
}

impl MetadataResolver for DirectoryResolver {
    fn get_table_metadata(&self, table_name: &str) -> anyhow::Result<TableMetadata> {
        let path = self.tables_path();
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read table metadata {}", path.display()))?;
        let mut tables: BTreeMap<String, TableMetadata> = serde_json::from_str(&text)
            .with_context(|| format!("parse table metadata {}", path.display()))?;
        tables
            .remove(table_name)
            .ok_or_else(|| anyhow!("table '{}' not found in {}", table_name, path.display()))
    }
}

impl SchemaProvider for DirectoryResolver {
    fn schema_definition(&self, schema_name: &str) -> anyhow::Result<Value> {
        let path = self.schema_path(schema_name)?;
        let text = fs::read_to_string(&path)
            .with_context(|| format!("read schema {} from {}", schema_name, path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse schema {}", path.display()))
    }
}

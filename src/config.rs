//! Guide configuration: which schema classes count as spatial points, plus
//! per-guide construction options.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Reference classes treated as spatial points unless configured otherwise.
pub const DEFAULT_SPATIAL_POINT_CLASSES: [&str; 2] = ["SpatialPoint", "BoundSpatialPoint"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuideConfig {
    /// Class names (last `$ref` segment) whose properties get flattened to
    /// `<prop>_position`.
    pub spatial_point_classes: Vec<String>,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            spatial_point_classes: DEFAULT_SPATIAL_POINT_CLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl GuideConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn with_spatial_point_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spatial_point_classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_spatial_point_class(&self, class: &str) -> bool {
        self.spatial_point_classes.iter().any(|c| c == class)
    }
}

/// Options applied when a [`crate::Guide`] is constructed.
#[derive(Debug, Clone, Default)]
pub struct GuideOptions {
    /// Display name; defaults to the schema's primary class.
    pub name: Option<String>,
    /// Records are updates of existing annotations and need an integer `id`.
    pub update: bool,
    /// Carry an optional `id` field even when not updating.
    pub id_field: bool,
    pub config: GuideConfig,
}

impl GuideOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
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
}

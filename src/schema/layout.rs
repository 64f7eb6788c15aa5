//! Record layout derived from an annotation schema.
//!
//! JSON shape:
//! {
//!   "$ref": "#/definitions/Cell",           // primary class
//!   "definitions": {
//!     "Cell": {
//!       "required": ["type"],                // optional, defaults to []
//!       "properties": {
//!         "type": {"type": "string"},
//!         "pt": {"$ref": "#/definitions/SpatialPoint"}
//!       }
//!     },
//!     "SpatialPoint": { ... }
//!   }
//! }
//!
//! Property declaration order is kept (serde_json is built with
//! `preserve_order`), and properties referencing a spatial-point class are
//! renamed `<prop>_position` in the flat layout.

use crate::config::GuideConfig;
use crate::error::{GuideError, Result};
use crate::schema::field::{FieldKind, FieldSpec, IdMode};
use crate::schema::ref_segment;

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Top-level schema keys we read; everything else is left to the validator.
#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,

    definitions: Option<Map<String, Value>>,
}

/// Raw class definition as it appears under `definitions`.
#[derive(Debug, Deserialize)]
struct RawClass {
    #[serde(default)]
    required: Option<Vec<String>>,

    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLayout {
    /// Every class in `definitions` (informational).
    pub classes: Vec<String>,
    /// Primary class named by the top-level `$ref`.
    pub ref_class: String,
    pub required_props: BTreeSet<String>,
    /// Properties of the primary class, in declaration order.
    pub props: Vec<String>,
    /// Spatial-point property -> flat name.
    pub spatial_pts: BTreeMap<String, String>,
    /// Flat name -> spatial-point property.
    pub convert_pts: BTreeMap<String, String>,
    /// Flat field names, parallel to `props`.
    pub prop_names: Vec<String>,
}

impl SchemaLayout {
    /// Introspect `schema` and derive the flat record layout.
    ///
    /// Fails with [`GuideError::InvalidSchema`] when the primary class cannot
    /// be resolved or its definition is malformed.
    pub fn from_schema(schema: &Value, config: &GuideConfig) -> Result<Self> {
        if !schema.is_object() {
            return Err(GuideError::schema("schema must be a JSON object"));
        }
        let raw: RawSchema = serde_json::from_value(schema.clone())
            .map_err(|e| GuideError::schema(format!("bad top-level schema shape: {e}")))?;

        let definitions = raw
            .definitions
            .ok_or_else(|| GuideError::schema("schema has no \"definitions\" mapping"))?;
        let classes: Vec<String> = definitions.keys().cloned().collect();

        let reference = raw
            .reference
            .ok_or_else(|| GuideError::schema("schema has no top-level \"$ref\""))?;
        let ref_class = ref_segment(&reference).to_string();

        let class_def = definitions.get(&ref_class).ok_or_else(|| {
            GuideError::schema(format!(
                "\"$ref\" {reference} names class '{ref_class}' which is not in definitions"
            ))
        })?;
        let class: RawClass = serde_json::from_value(class_def.clone()).map_err(|e| {
            GuideError::schema(format!("bad definition for class '{ref_class}': {e}"))
        })?;

        let required_props: BTreeSet<String> =
            class.required.unwrap_or_default().into_iter().collect();

        let mut props: Vec<String> = Vec::new();
        let mut spatial_pts: BTreeMap<String, String> = BTreeMap::new();
        let mut convert_pts: BTreeMap<String, String> = BTreeMap::new();
        for (prop, def) in class.properties.unwrap_or_default() {
            let target = def.get("$ref").and_then(Value::as_str).map(ref_segment);
            if target.is_some_and(|t| config.is_spatial_point_class(t)) {
                let flat = position_name(&prop);
                spatial_pts.insert(prop.clone(), flat.clone());
                convert_pts.insert(flat, prop.clone());
            }
            props.push(prop);
        }

        let prop_names = props
            .iter()
            .map(|p| spatial_pts.get(p).cloned().unwrap_or_else(|| p.clone()))
            .collect();

        Ok(SchemaLayout {
            classes,
            ref_class,
            required_props,
            props,
            spatial_pts,
            convert_pts,
            prop_names,
        })
    }

    pub fn is_required(&self, prop: &str) -> bool {
        self.required_props.contains(prop)
    }

    /// Field descriptors in record order: the `id` field (if any) first,
    /// then one field per property.
    pub fn field_specs(&self, id: IdMode) -> Vec<FieldSpec> {
        let mut fields = Vec::with_capacity(self.props.len() + 1);
        if id.is_present() {
            fields.push(FieldSpec::id(id == IdMode::Required));
        }
        for (prop, name) in self.props.iter().zip(&self.prop_names) {
            let kind = if self.spatial_pts.contains_key(prop) {
                FieldKind::SpatialPoint
            } else {
                FieldKind::Plain
            };
            fields.push(FieldSpec {
                name: name.clone(),
                property: prop.clone(),
                required: self.is_required(prop),
                kind,
            });
        }
        fields
    }

    /// Restore spatial points to their schema shape:
    /// `pt_position: v` => `pt: {"position": v}`. Other fields pass through.
    pub fn unflatten(&self, flat: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (k, v) in flat {
            match self.convert_pts.get(k) {
                Some(prop) => {
                    let mut point = Map::new();
                    point.insert("position".to_string(), v.clone());
                    out.insert(prop.clone(), Value::Object(point));
                }
                None => {
                    out.insert(k.clone(), v.clone());
                }
            }
        }
        out
    }
}

fn position_name(prop: &str) -> String {
    format!("{prop}_position")
}

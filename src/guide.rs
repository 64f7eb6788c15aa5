//! The annotation guide: validates records against a schema and accumulates
//! them for nested or tabular output.

use crate::config::{GuideConfig, GuideOptions};
use crate::error::{GuideError, Result};
use crate::frame::AnnotationFrame;
use crate::record::AnnotationRecord;
use crate::schema::{FieldSpec, ID_FIELD, IdMode, SchemaLayout};

use jsonschema::Validator;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, info};

pub struct Guide {
    name: String,
    schema: Value,
    update: bool,
    id_mode: IdMode,
    layout: SchemaLayout,
    fields: Vec<FieldSpec>,
    validator: Validator,
    anno_list: Vec<AnnotationRecord>,
}

impl Guide {
    /// Build a guide for `schema`. `name` defaults to the schema's primary
    /// class; `update` adds a required integer `id` field to every record.
    pub fn new(schema: Value, name: Option<&str>, update: bool) -> Result<Self> {
        let mut options = GuideOptions::default().update(update);
        options.name = name.map(str::to_string);
        Self::with_options(schema, options)
    }

    pub fn with_options(schema: Value, options: GuideOptions) -> Result<Self> {
        let layout = SchemaLayout::from_schema(&schema, &options.config)?;
        let validator = jsonschema::validator_for(&validation_schema(&schema, &options.config))
            .map_err(|e| GuideError::schema(format!("schema does not compile: {e}")))?;

        let id_mode = IdMode::new(options.update, options.id_field);
        let fields = layout.field_specs(id_mode);
        let name = options.name.unwrap_or_else(|| layout.ref_class.clone());

        info!(
            guide = %name,
            ref_class = %layout.ref_class,
            update = options.update,
            fields = fields.len(),
            "built annotation guide"
        );

        Ok(Guide {
            name,
            schema,
            update: options.update,
            id_mode,
            layout,
            fields,
            validator,
            anno_list: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update(&self) -> bool {
        self.update
    }

    /// True when records carry an `id` field (always the case in update mode).
    pub fn id_field(&self) -> bool {
        self.id_mode.is_present()
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn layout(&self) -> &SchemaLayout {
        &self.layout
    }

    pub fn classes(&self) -> &[String] {
        &self.layout.classes
    }

    pub fn ref_class(&self) -> &str {
        &self.layout.ref_class
    }

    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Flat field names in record order, `id` first when present.
    pub fn fields(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.anno_list
    }

    pub fn len(&self) -> usize {
        self.anno_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anno_list.is_empty()
    }

    /// Add an annotation given as a JSON object of field name to value.
    pub fn add(&mut self, fields: Value) -> Result<&AnnotationRecord> {
        match fields {
            Value::Object(map) => self.add_record(map),
            other => Err(GuideError::argument(format!(
                "annotation must be a JSON object, got {other}"
            ))),
        }
    }

    /// Add an annotation from values given in [`Guide::fields`] order.
    /// Trailing fields may be left off.
    pub fn add_positional(&mut self, values: Vec<Value>) -> Result<&AnnotationRecord> {
        if values.len() > self.fields.len() {
            return Err(GuideError::argument(format!(
                "{} takes at most {} values, got {}",
                self.name,
                self.fields.len(),
                values.len()
            )));
        }
        let map = self
            .fields
            .iter()
            .map(|f| f.name.clone())
            .zip(values)
            .collect();
        self.add_record(map)
    }

    /// Start a fluent annotation: `guide.record().set("type", "neuron").add()`.
    pub fn record(&mut self) -> AnnotationBuilder<'_> {
        AnnotationBuilder {
            guide: self,
            values: Map::new(),
        }
    }

    /// Validate a candidate mapping and append it on success.
    ///
    /// Null values count as unset. In update mode the `id` field must be an
    /// integer. The schema-shaped form of the record (spatial points nested)
    /// is validated against the full schema; the first violation is returned
    /// and nothing is stored.
    pub fn add_record(&mut self, mut candidate: Map<String, Value>) -> Result<&AnnotationRecord> {
        let mut flat = Map::new();
        for field in &self.fields {
            if let Some(value) = candidate.remove(&field.name) {
                if !value.is_null() {
                    flat.insert(field.name.clone(), value);
                }
            }
        }
        if let Some(unknown) = candidate.keys().next() {
            return Err(GuideError::argument(format!(
                "unknown field '{}' for {}; expected one of {:?}",
                unknown,
                self.name,
                self.fields()
            )));
        }

        self.check_id(&flat)?;

        let nested = Value::Object(self.layout.unflatten(&flat));
        if let Err(err) = self.validator.validate(&nested) {
            let err = GuideError::from(err);
            debug!(guide = %self.name, error = %err, "rejected annotation");
            return Err(err);
        }

        let idx = self.anno_list.len();
        self.anno_list.push(AnnotationRecord::new(flat));
        debug!(guide = %self.name, index = idx, "added annotation");
        Ok(&self.anno_list[idx])
    }

    fn check_id(&self, flat: &Map<String, Value>) -> Result<()> {
        match (self.id_mode, flat.get(ID_FIELD)) {
            (IdMode::Absent, _) => Ok(()),
            (IdMode::Required, None) => Err(GuideError::MissingId),
            (_, Some(id)) if !id.is_i64() => {
                Err(GuideError::InvalidIdType(id.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Schema-shaped records, spatial points restored to
    /// `{prop: {"position": value}}`, in accumulation order.
    pub fn annotations(&self) -> Vec<Map<String, Value>> {
        self.anno_list
            .iter()
            .map(|a| self.layout.unflatten(a.as_flat()))
            .collect()
    }

    /// Flat records as a table.
    pub fn annotation_dataframe(&self) -> AnnotationFrame {
        AnnotationFrame::from_records(&self.anno_list)
    }
}

/// Copy of `schema` in which every configured spatial-point class missing
/// from `definitions` is defined as `{}`, so references to it resolve.
fn validation_schema(schema: &Value, config: &GuideConfig) -> Value {
    let mut schema = schema.clone();
    if let Some(definitions) = schema.get_mut("definitions").and_then(Value::as_object_mut) {
        for class in &config.spatial_point_classes {
            if !definitions.contains_key(class) {
                definitions.insert(class.clone(), Value::Object(Map::new()));
            }
        }
    }
    schema
}

impl fmt::Display for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.update { "Update" } else { "New" };
        write!(
            f,
            "{} annotation helper for {} with {} annotations.",
            kind,
            self.name,
            self.anno_list.len()
        )
    }
}

impl fmt::Debug for Guide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guide")
            .field("name", &self.name)
            .field("update", &self.update)
            .field("id_mode", &self.id_mode)
            .field("layout", &self.layout)
            .field("annotations", &self.anno_list.len())
            .finish_non_exhaustive()
    }
}

/// Fluent builder returned by [`Guide::record`].
pub struct AnnotationBuilder<'g> {
    guide: &'g mut Guide,
    values: Map<String, Value>,
}

impl<'g> AnnotationBuilder<'g> {
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn add(self) -> Result<&'g AnnotationRecord> {
        let AnnotationBuilder { guide, values } = self;
        guide.add_record(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cell_schema() -> Value {
        json!({
            "$ref": "#/definitions/Cell",
            "definitions": {
                "Cell": {
                    "required": ["type"],
                    "properties": {
                        "type": {"type": "string"},
                        "pt": {"$ref": "#/definitions/SpatialPoint"},
                        "note": {"type": "string"}
                    }
                },
                "SpatialPoint": {
                    "type": "object",
                    "required": ["position"],
                    "properties": {
                        "position": {
                            "type": "array",
                            "items": {"type": "number"},
                            "minItems": 3,
                            "maxItems": 3
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn display_summary() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        assert_eq!(guide.to_string(), "New annotation helper for Cell with 0 annotations.");

        guide.add(json!({"type": "neuron"})).unwrap();
        assert_eq!(guide.to_string(), "New annotation helper for Cell with 1 annotations.");

        let guide = Guide::new(cell_schema(), Some("cells_v2"), true).unwrap();
        assert_eq!(
            guide.to_string(),
            "Update annotation helper for cells_v2 with 0 annotations."
        );
    }

    #[test]
    fn null_values_are_unset() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        let record = guide
            .add(json!({"type": "glia", "note": null, "pt_position": null}))
            .unwrap();
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["type"]);
    }

    #[test]
    fn flat_record_keeps_field_order() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        let record = guide
            .add(json!({"note": "n", "pt_position": [0, 0, 1], "type": "neuron"}))
            .unwrap();
        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            vec!["type", "pt_position", "note"]
        );
    }

    #[test]
    fn spatial_point_is_validated_through_its_ref() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        let err = guide
            .add(json!({"type": "neuron", "pt_position": [1, 2]}))
            .unwrap_err();
        assert!(matches!(err, GuideError::SchemaValidation { .. }), "{err}");
        assert!(guide.is_empty());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        let err = guide.add(json!({"type": "neuron", "pt": [1, 2, 3]})).unwrap_err();
        assert!(matches!(err, GuideError::InvalidArgument(_)), "{err}");
        assert!(guide.is_empty());
    }

    #[test]
    fn non_object_is_rejected() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        assert!(matches!(
            guide.add(json!(["neuron"])),
            Err(GuideError::InvalidArgument(_))
        ));
    }

    #[test]
    fn positional_values_follow_fields() {
        let mut guide = Guide::new(cell_schema(), None, true).unwrap();
        assert_eq!(guide.fields(), vec!["id", "type", "pt_position", "note"]);

        let record = guide
            .add_positional(vec![json!(7), json!("neuron"), json!([1, 2, 3])])
            .unwrap();
        assert_eq!(record.id(), Some(7));
        assert_eq!(record.get("note"), None);

        let err = guide
            .add_positional(vec![json!(1), json!("a"), json!(null), json!("b"), json!(0)])
            .unwrap_err();
        assert!(matches!(err, GuideError::InvalidArgument(_)));
        assert_eq!(guide.len(), 1);
    }

    #[test]
    fn builder_adds_record() {
        let mut guide = Guide::new(cell_schema(), None, false).unwrap();
        let record = guide
            .record()
            .set("type", "neuron")
            .set("pt_position", json!([1.5, 2.0, 3.0]))
            .add()
            .unwrap();
        assert_eq!(record.get("type"), Some(&json!("neuron")));
        assert_eq!(guide.len(), 1);
    }

    #[test]
    fn optional_id_field() {
        let options = GuideOptions::default().id_field(true);
        let mut guide = Guide::with_options(cell_schema(), options).unwrap();
        assert!(guide.id_field());
        assert!(!guide.update());
        assert_eq!(guide.fields()[0], "id");
        assert!(!guide.field_specs()[0].required);

        guide.add(json!({"type": "neuron"})).unwrap();
        guide.add(json!({"id": 3, "type": "neuron"})).unwrap();
        let err = guide.add(json!({"id": 3.5, "type": "neuron"})).unwrap_err();
        assert!(matches!(err, GuideError::InvalidIdType(_)));
        assert_eq!(guide.len(), 2);
    }

    #[test]
    fn undefined_spatial_point_class_resolves() {
        let schema = json!({
            "$ref": "#/definitions/Cell",
            "definitions": {
                "Cell": {
                    "properties": {"pt": {"$ref": "#/definitions/BoundSpatialPoint"}}
                }
            }
        });
        let mut guide = Guide::new(schema.clone(), None, false).unwrap();
        guide.add(json!({"pt_position": [4, 5, 6]})).unwrap();
        assert_eq!(guide.len(), 1);
        // The guide keeps the schema it was given.
        assert_eq!(guide.schema(), &schema);

        let validation = validation_schema(&schema, &GuideConfig::default());
        assert_eq!(validation["definitions"]["SpatialPoint"], json!({}));
        assert_eq!(validation["definitions"]["BoundSpatialPoint"], json!({}));
    }

    #[test]
    fn id_must_fit_in_i64() {
        let mut guide = Guide::new(cell_schema(), None, true).unwrap();
        let err = guide
            .add(json!({"id": u64::MAX, "type": "neuron"}))
            .unwrap_err();
        assert!(matches!(err, GuideError::InvalidIdType(_)), "{err}");
        assert!(guide.is_empty());

        let record = guide
            .add(json!({"id": i64::MAX, "type": "neuron"}))
            .unwrap();
        assert_eq!(record.id(), Some(i64::MAX));
    }

    #[test]
    fn rejects_uncompilable_schema() {
        let schema = json!({
            "$ref": "#/definitions/Cell",
            "definitions": {"Cell": {"type": 12, "properties": {}}}
        });
        let err = Guide::new(schema, None, false).unwrap_err();
        assert!(matches!(err, GuideError::InvalidSchema(_)), "{err}");
    }
}

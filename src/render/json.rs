use serde_json::{Map, Value};

/// Pretty JSON array of schema-shaped annotations.
pub fn render_annotations_json(annotations: &[Map<String, Value>]) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(annotations)?;
    json.push('\n');
    Ok(json)
}

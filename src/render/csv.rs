use crate::frame::AnnotationFrame;

use serde_json::Value;
use std::borrow::Cow;

/// Render the annotation table as CSV (header row first).
///
/// Nulls become empty cells; arrays and objects are written as compact JSON,
/// so `pt_position` round-trips as `"[1,2,3]"`.
pub fn render_csv(frame: &AnnotationFrame) -> String {
    let mut out = String::new();
    push_row(&mut out, frame.columns().iter().map(|c| Cow::Borrowed(c.as_str())));
    for row in frame.rows() {
        push_row(&mut out, row.iter().map(cell_text));
    }
    out
}

fn cell_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => "".into(),
        Value::String(s) => s.as_str().into(),
        other => other.to_string().into(),
    }
}

fn push_row<'a, I>(out: &mut String, cells: I)
where
    I: Iterator<Item = Cow<'a, str>>,
{
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guide::Guide;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn renders_header_nulls_and_quoting() {
        let schema = json!({
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
                "SpatialPoint": {"type": "object"}
            }
        });
        let mut guide = Guide::new(schema, None, false).unwrap();
        guide.add(json!({"type": "neuron", "pt_position": [1, 2, 3]})).unwrap();
        guide.add(json!({"type": "glia", "note": "said \"hi\", left"})).unwrap();

        let csv = render_csv(&guide.annotation_dataframe());
        assert_eq!(
            csv,
            "type,pt_position,note\n\
             neuron,\"[1,2,3]\",\n\
             glia,,\"said \"\"hi\"\", left\"\n"
        );
    }

    #[test]
    fn empty_frame_renders_bare_newline() {
        assert_eq!(render_csv(&AnnotationFrame::default()), "\n");
    }
}

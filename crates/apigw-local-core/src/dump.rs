//! Type-annotated rendering of a proxy event.
//!
//! The dump makes JSON types visible so that mismatches between what a local
//! client sends and what the managed gateway would send are easy to spot:
//!
//! ```text
//! ProxyEvent object(12)
//!   body: string(0) ""
//!   headers: object(1)
//!     Host: string(9) "localhost"
//!   isBase64Encoded: bool false
//!   pathParameters: null
//! ```
//!
//! Keys are listed in sorted order so the output is stable.

use apigw_local_model::ProxyEvent;
use serde_json::Value;

const INDENT: &str = "  ";

/// Render `event` as an indented, type-annotated tree.
#[must_use]
pub fn render_event(event: &ProxyEvent) -> String {
    match serde_json::to_value(event) {
        Ok(value) => render_value("ProxyEvent", &value),
        // The event is plain strings, maps and numbers.
        Err(e) => format!("ProxyEvent <unrenderable: {e}>\n"),
    }
}

/// Render any JSON value under a root label.
#[must_use]
pub fn render_value(label: &str, value: &Value) -> String {
    let mut out = String::new();
    out.push_str(label);
    out.push(' ');
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str("null\n"),
        Value::Bool(b) => out.push_str(&format!("bool {b}\n")),
        Value::Number(n) => {
            let kind = if n.is_f64() { "float" } else { "int" };
            out.push_str(&format!("{kind} {n}\n"));
        }
        Value::String(s) => {
            let quoted = serde_json::to_string(s).unwrap_or_default();
            out.push_str(&format!("string({}) {quoted}\n", s.len()));
        }
        Value::Array(items) => {
            out.push_str(&format!("array({})\n", items.len()));
            for (idx, item) in items.iter().enumerate() {
                push_label(out, depth + 1, &format!("[{idx}]"));
                write_value(out, item, depth + 1);
            }
        }
        Value::Object(map) => {
            out.push_str(&format!("object({})\n", map.len()));
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                push_label(out, depth + 1, key);
                write_value(out, &map[key], depth + 1);
            }
        }
    }
}

/// Start a child line: indentation, then `label: `.
fn push_label(out: &mut String, depth: usize, label: &str) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(label);
    out.push_str(": ");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_distinguish_empty_string_from_null() {
        let dump = render_value("v", &json!({"body": "", "pathParameters": null}));
        assert_eq!(
            dump,
            "v object(2)\n  body: string(0) \"\"\n  pathParameters: null\n"
        );
    }

    #[test]
    fn test_should_annotate_scalars() {
        let dump = render_value(
            "v",
            &json!({"flag": false, "epoch": 1_704_067_200_000_i64, "ratio": 0.5}),
        );
        assert!(dump.contains("flag: bool false\n"));
        assert!(dump.contains("epoch: int 1704067200000\n"));
        assert!(dump.contains("ratio: float 0.5\n"));
    }

    #[test]
    fn test_should_nest_arrays_and_objects() {
        let dump = render_value("v", &json!({"h": {"Accept": ["a", "b"]}}));
        let expected = "v object(1)\n  h: object(1)\n    Accept: array(2)\n      [0]: string(1) \"a\"\n      [1]: string(1) \"b\"\n";
        assert_eq!(dump, expected);
    }

    #[test]
    fn test_should_escape_strings() {
        let dump = render_value("s", &json!("say \"hi\"\n"));
        assert_eq!(dump, "s string(9) \"say \\\"hi\\\"\\n\"\n");
    }
}

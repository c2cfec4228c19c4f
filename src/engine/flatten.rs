//! Flattens the nested analysis document into a readable metrics listing
//!
//! Mappings are walked depth-first with keys in sorted order; every
//! non-mapping value becomes one row labelled by its dotted path.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::utils::math::{format_float, round_to};

use super::regions::RegionCategory;

/// Longest string shown before truncation
pub const MAX_STRING_CHARS: usize = 50;
/// Lists up to this length are shown in full (scalars only)
pub const INLINE_LIST_MAX: usize = 4;
/// Lists longer than this collapse to `[N items]`
pub const SUMMARY_LIST_MIN: usize = 10;
/// Elements shown for mid-sized lists
pub const PREVIEW_LIST_LEN: usize = 5;

const ELLIPSIS: &str = "...";

/// One row of the metrics listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedMetric {
    /// Dotted path into the document, kept verbatim
    pub key: String,
    pub display_label: String,
    pub value: String,
    pub region_key: Option<RegionCategory>,
}

impl FlattenedMetric {
    fn new(key: String, value: String) -> Self {
        Self {
            display_label: display_label(&key),
            region_key: RegionCategory::for_metric_path(&key),
            key,
            value,
        }
    }
}

/// Flatten a whole document. Non-mapping roots yield nothing.
pub fn flatten(doc: &Value) -> Vec<FlattenedMetric> {
    flatten_with_prefix(doc, "")
}

/// Flatten `node` with every path prefixed by `prefix` (if non-empty)
pub fn flatten_with_prefix(node: &Value, prefix: &str) -> Vec<FlattenedMetric> {
    let mut out = Vec::new();
    if let Value::Object(map) = node {
        walk(map, prefix, &mut out);
    }
    out
}

fn walk(map: &Map<String, Value>, prefix: &str, out: &mut Vec<FlattenedMetric>) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (key, value) in entries {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(child) => walk(child, &path, out),
            _ => {
                let formatted = format_value(value);
                out.push(FlattenedMetric::new(path, formatted));
            }
        }
    }
}

/// Rows for the report panel: response envelope fields, the face box, the
/// `result` tree (paths relative to `result`), then any `error_detail`.
pub fn panel_items(doc: &Value) -> Vec<FlattenedMetric> {
    let mut out = Vec::new();

    for key in ["error_code", "error_msg", "request_id", "log_id"] {
        if let Some(value) = doc.get(key) {
            out.push(FlattenedMetric::new(key.to_string(), format_value(value)));
        }
    }

    if let Some(face) = doc.get("face_rectangle") {
        if !is_blank(face) {
            out.extend(flatten_with_prefix(face, "face_rectangle"));
        }
    }

    if let Some(result) = doc.get("result") {
        out.extend(flatten(result));
    }

    if let Some(detail) = doc.get("error_detail") {
        out.extend(flatten_with_prefix(detail, "error_detail"));
    }

    out
}

/// Format one value for display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match n.as_i64().map(|i| i.to_string()).or_else(|| n.as_u64().map(|u| u.to_string())) {
            Some(integer) => integer,
            None => format_float(round_to(n.as_f64().unwrap_or_default(), 2)),
        },
        Value::String(s) => truncate(s, MAX_STRING_CHARS),
        Value::Array(items) => format_list(items),
        Value::Object(_) => "{...}".to_string(),
    }
}

fn format_list(items: &[Value]) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    if items.len() <= INLINE_LIST_MAX && items.iter().all(is_scalar) {
        return inline(items);
    }
    if items.len() > SUMMARY_LIST_MIN {
        return format!("[{} items]", items.len());
    }
    let shown = items.len().min(PREVIEW_LIST_LEN);
    let mut text = inline(&items[..shown]);
    if items.len() > PREVIEW_LIST_LEN {
        text.push_str(ELLIPSIS);
    }
    text
}

/// Compact inline rendering; nested values stay as compact JSON
fn inline(items: &[Value]) -> String {
    let parts: Vec<String> = items.iter().map(Value::to_string).collect();
    format!("[{}]", parts.join(", "))
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

/// `result.skin_age.value` → `Result > Skin Age > Value`.
/// The first character of each word is uppercased and the rest kept as is.
pub fn display_label(path: &str) -> String {
    let spaced = path.replace('_', " ").replace('.', " > ");
    let mut label = String::with_capacity(spaced.len());
    let mut prev_is_word = false;
    for c in spaced.chars() {
        let is_word = c.is_alphanumeric();
        if is_word && !prev_is_word {
            label.extend(c.to_uppercase());
        } else {
            label.push(c);
        }
        prev_is_word = is_word;
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_float_label_and_rounding() {
        let rows = flatten(&json!({"a": {"b": 1.005}}));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "a.b");
        assert_eq!(rows[0].display_label, "A > B");
        assert_eq!(rows[0].value, "1.0");
    }

    #[test]
    fn test_sorted_depth_first_order() {
        let doc = json!({"zeta": 1, "alpha": {"y": 2, "b": {"c": 3}}, "mid": "x"});
        let keys: Vec<String> = flatten(&doc).into_iter().map(|m| m.key).collect();
        assert_eq!(keys, vec!["alpha.b.c", "alpha.y", "mid", "zeta"]);

        // Same input, same order
        let again: Vec<String> = flatten(&doc).into_iter().map(|m| m.key).collect();
        assert_eq!(keys, again);
    }

    #[test]
    fn test_list_formatting() {
        let eleven: Vec<i64> = (1..=11).collect();
        assert_eq!(format_value(&json!(eleven)), "[11 items]");
        assert_eq!(format_value(&json!([1, 2, 3])), "[1, 2, 3]");
        assert_eq!(format_value(&json!([])), "[]");
        assert_eq!(format_value(&json!([1, 2, 3, 4, 5, 6, 7])), "[1, 2, 3, 4, 5]...");
        assert_eq!(format_value(&json!([1, 2, 3, 4, 5])), "[1, 2, 3, 4, 5]");
        let ten: Vec<i64> = (1..=10).collect();
        assert_eq!(format_value(&json!(ten)), "[1, 2, 3, 4, 5]...");
    }

    #[test]
    fn test_list_of_mappings_not_flattened() {
        let doc = json!({"spots": {"rectangle": [{"left": 1}, {"left": 2}]}});
        let rows = flatten(&doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, r#"[{"left":1}, {"left":2}]"#);
    }

    #[test]
    fn test_scalar_formatting() {
        assert_eq!(format_value(&Value::Null), "-");
        assert_eq!(format_value(&json!(true)), "True");
        assert_eq!(format_value(&json!(false)), "False");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(2.0)), "2.0");
        assert_eq!(format_value(&json!(3.14159)), "3.14");
        assert_eq!(format_value(&json!({"k": 1})), "{...}");
    }

    #[test]
    fn test_string_truncation() {
        let long = "x".repeat(60);
        let shown = format_value(&json!(long));
        assert_eq!(shown, format!("{}...", "x".repeat(50)));
        assert_eq!(format_value(&json!("x".repeat(50))), "x".repeat(50));
        // multi-byte characters are counted, not bytes
        let accents = "é".repeat(51);
        assert_eq!(format_value(&json!(accents)), format!("{}...", "é".repeat(50)));
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("result.skin_age.value"), "Result > Skin Age > Value");
        assert_eq!(display_label("error_code"), "Error Code");
    }

    #[test]
    fn test_display_label_keeps_inner_capitals() {
        // Only word starts change case, so acronyms are not folded to "Ita"
        assert_eq!(display_label("score_info.ITA"), "Score Info > ITA");
        assert_eq!(display_label("result.rgbA_value"), "Result > RgbA Value");
        assert_eq!(display_label("skin_type.details.0"), "Skin Type > Details > 0");
    }

    #[test]
    fn test_region_keys_attached() {
        let doc = json!({
            "face_rectangle": {"left": 1},
            "result": {"acne": {"count": 2}, "score_info": {"acne_score": 80}}
        });
        let rows = flatten(&doc);
        let region = |key: &str| rows.iter().find(|r| r.key == key).unwrap().region_key;
        assert_eq!(region("face_rectangle.left"), Some(RegionCategory::Face));
        assert_eq!(region("result.acne.count"), Some(RegionCategory::Acne));
        assert_eq!(region("result.score_info.acne_score"), None);
    }

    #[test]
    fn test_non_mapping_root() {
        assert!(flatten(&json!([1, 2])).is_empty());
        assert!(flatten(&json!("x")).is_empty());
    }

    #[test]
    fn test_panel_items_order() {
        let doc = json!({
            "request_id": "abc",
            "error_code": 0,
            "error_msg": {"nested": true},
            "face_rectangle": {"left": 1, "top": 2},
            "result": {"skin_age": {"value": 31}},
            "error_detail": {"status_code": 200}
        });
        let rows = panel_items(&doc);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "error_code",
                "error_msg",
                "request_id",
                "face_rectangle.left",
                "face_rectangle.top",
                "skin_age.value",
                "error_detail.status_code"
            ]
        );
        assert_eq!(rows[1].value, "{...}");
        assert_eq!(rows[5].display_label, "Skin Age > Value");
    }
}

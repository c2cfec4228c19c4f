//! Before/after comparison of two stored analyses

use serde::Serialize;
use serde_json::Value;

use crate::utils::math::round_to;

/// Which direction of numeric change counts as improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Improved,
    Worsened,
    Unchanged,
    Changed,
}

/// One tracked metric
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub polarity: Polarity,
}

const fn metric(key: &'static str, label: &'static str, category: &'static str, polarity: Polarity) -> MetricSpec {
    MetricSpec {
        key,
        label,
        category,
        polarity,
    }
}

use Polarity::{HigherIsBetter as Higher, LowerIsBetter as Lower, Neutral};

/// Tracked metrics in output order
pub const TRACKED_METRICS: &[MetricSpec] = &[
    metric("result.skin_age", "Skin Age", "Skin Properties", Lower),
    metric("result.skin_type.skin_type", "Skin Type", "Skin Properties", Neutral),
    metric("result.skin_color.skin_color_name", "Skin Color", "Skin Properties", Neutral),
    metric("result.skin_color.ita_name", "Skin Color (ITA)", "Skin Properties", Neutral),
    metric("result.skin_color.ha_name", "Skin Tone (HA)", "Skin Properties", Neutral),
    metric("result.score_info.total_score", "Total Score", "Scores", Higher),
    metric("result.score_info.wrinkle_score", "Wrinkle Score", "Scores", Higher),
    metric("result.score_info.pores_score", "Pores Score", "Scores", Higher),
    metric("result.score_info.blackhead_score", "Blackhead Score", "Scores", Higher),
    metric("result.score_info.acne_score", "Acne Score", "Scores", Higher),
    metric("result.score_info.dark_circle_score", "Dark Circle Score", "Scores", Higher),
    metric("result.score_info.sensitivity_score", "Sensitivity Score", "Scores", Higher),
    metric("result.score_info.brown_spot_score", "Brown Spot Score", "Scores", Higher),
    metric("result.score_info.closed_comedones_score", "Comedones Score", "Scores", Higher),
    metric("result.score_info.eye_bag_score", "Eye Bag Score", "Scores", Higher),
    metric("result.score_info.pigmentation_score", "Pigmentation Score", "Scores", Higher),
    metric("result.score_info.mole_score", "Mole Score", "Scores", Higher),
    metric("result.score_info.texture_score", "Texture Score", "Scores", Higher),
    metric("result.score_info.oil_score", "Oil Score", "Scores", Higher),
    metric("result.score_info.moisture_score", "Moisture Score", "Scores", Higher),
    metric("result.acne.count", "Acne Count", "Counts", Lower),
    metric("result.acne_mark.count", "Acne Marks Count", "Counts", Lower),
    metric("result.brown_spot.count", "Brown Spots Count", "Counts", Lower),
    metric("result.closed_comedones.count", "Comedones Count", "Counts", Lower),
    metric("result.mole.count", "Mole Count", "Counts", Neutral),
    metric("result.blackhead.count", "Blackhead Count", "Counts", Lower),
    metric("result.blackhead.severity", "Blackhead Severity", "Severity", Neutral),
    metric("result.sensitivity.area_percentage", "Sensitivity Area %", "Sensitivity", Lower),
    metric("result.sensitivity.intensity", "Sensitivity Intensity", "Sensitivity", Lower),
    metric("result.dark_circle_mark.left_dark_circle_severity", "Dark Circle Severity (Left)", "Eye Area", Neutral),
    metric("result.dark_circle_mark.right_dark_circle_severity", "Dark Circle Severity (Right)", "Eye Area", Neutral),
    metric("result.dark_circle_mark.left_dark_circle_type_name", "Dark Circle Type (Left)", "Eye Area", Neutral),
    metric("result.dark_circle_mark.right_dark_circle_type_name", "Dark Circle Type (Right)", "Eye Area", Neutral),
    metric("result.eye_bag.severity", "Eye Bag Severity", "Eye Area", Neutral),
    metric("result.forehead_wrinkle.severity", "Forehead Wrinkle Severity", "Wrinkles", Neutral),
    metric("result.left_nasolabial_fold.severity", "Nasolabial Fold Severity (Left)", "Wrinkles", Neutral),
    metric("result.right_nasolabial_fold.severity", "Nasolabial Fold Severity (Right)", "Wrinkles", Neutral),
    metric("result.left_crows_feet.severity", "Crow's Feet Severity (Left)", "Wrinkles", Neutral),
    metric("result.right_crows_feet.severity", "Crow's Feet Severity (Right)", "Wrinkles", Neutral),
    metric("result.left_eye_finelines.severity", "Eye Fine Lines Severity (Left)", "Wrinkles", Neutral),
    metric("result.right_eye_finelines.severity", "Eye Fine Lines Severity (Right)", "Wrinkles", Neutral),
    metric("result.glabellar_wrinkle.severity", "Glabellar Wrinkle Severity", "Wrinkles", Neutral),
    metric("result.pores_forehead.severity", "Pore Severity (Forehead)", "Pores", Neutral),
    metric("result.pores_left_cheek.severity", "Pore Severity (Left Cheek)", "Pores", Neutral),
    metric("result.pores_right_cheek.severity", "Pore Severity (Right Cheek)", "Pores", Neutral),
    metric("result.pores_chin.severity", "Pore Severity (Chin)", "Pores", Neutral),
    metric("result.skin_type.oily_severity", "Oiliness Severity", "Skin Properties", Neutral),
];

/// Fallback category for keys outside the table
pub const OTHER_CATEGORY: &str = "Other";

/// One compared metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub key: String,
    pub label: String,
    #[serde(rename = "before")]
    pub before_value: Value,
    #[serde(rename = "after")]
    pub after_value: Value,
    pub verdict: Verdict,
    pub category: String,
    #[serde(rename = "numeric")]
    pub is_numeric: bool,
    pub direction: Polarity,
}

/// Look up the table row for `key`
pub fn metric_spec(key: &str) -> Option<&'static MetricSpec> {
    TRACKED_METRICS.iter().find(|spec| spec.key == key)
}

/// Compare every tracked metric of two analysis documents
pub fn compare(before: &Value, after: &Value) -> Vec<ComparisonRow> {
    let keys: Vec<&str> = TRACKED_METRICS.iter().map(|spec| spec.key).collect();
    compare_keys(before, after, &keys)
}

/// Compare an arbitrary list of dotted paths, in the given order.
///
/// Keys absent from both documents are omitted. Keys outside the tracked
/// table use the raw key as label, category `Other` and neutral polarity.
pub fn compare_keys(before: &Value, after: &Value, keys: &[&str]) -> Vec<ComparisonRow> {
    keys.iter()
        .filter_map(|key| {
            let before_value = lookup_path(before, key);
            let after_value = lookup_path(after, key);
            if before_value.is_none() && after_value.is_none() {
                return None;
            }

            let spec = metric_spec(key);
            let polarity = spec.map(|s| s.polarity).unwrap_or(Polarity::Neutral);
            Some(ComparisonRow {
                key: key.to_string(),
                label: spec.map(|s| s.label).unwrap_or(key).to_string(),
                before_value: display_value(before_value),
                after_value: display_value(after_value),
                verdict: judge(polarity, before_value, after_value),
                category: spec.map(|s| s.category).unwrap_or(OTHER_CATEGORY).to_string(),
                is_numeric: before_value.is_some_and(is_number) || after_value.is_some_and(is_number),
                direction: polarity,
            })
        })
        .collect()
}

/// Walk a dotted path. A missing level or an explicit null both mean absent.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |node, part| node.as_object()?.get(part))
        .filter(|value| !value.is_null())
}

/// Classify the change from `before` to `after`
pub fn judge(polarity: Polarity, before: Option<&Value>, after: Option<&Value>) -> Verdict {
    if values_equal(before, after) {
        return Verdict::Unchanged;
    }
    let (Some(b), Some(a)) = (before.and_then(as_number), after.and_then(as_number)) else {
        return Verdict::Changed;
    };
    match polarity {
        Polarity::HigherIsBetter if a > b => Verdict::Improved,
        Polarity::HigherIsBetter => Verdict::Worsened,
        Polarity::LowerIsBetter if a < b => Verdict::Improved,
        Polarity::LowerIsBetter => Verdict::Worsened,
        Polarity::Neutral => Verdict::Changed,
    }
}

fn values_equal(before: Option<&Value>, after: Option<&Value>) -> bool {
    match (before, after) {
        (None, None) => true,
        (Some(b), Some(a)) => match (as_number(b), as_number(a)) {
            (Some(x), Some(y)) => x == y,
            _ => b == a,
        },
        _ => false,
    }
}

fn is_number(value: &Value) -> bool {
    value.is_number()
}

fn as_number(value: &Value) -> Option<f64> {
    value.as_f64()
}

fn display_value(value: Option<&Value>) -> Value {
    match value {
        None => Value::String("-".to_string()),
        Some(Value::Number(n)) if n.is_f64() => n
            .as_f64()
            .and_then(|f| serde_json::Number::from_f64(round_to(f, 2)))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(other) => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with_age(age: Value) -> Value {
        json!({"result": {"skin_age": age}})
    }

    fn verdict_for(before: Value, after: Value) -> Verdict {
        let rows = compare(&doc_with_age(before), &doc_with_age(after));
        rows.iter().find(|r| r.key == "result.skin_age").unwrap().verdict
    }

    #[test]
    fn test_lower_is_better() {
        assert_eq!(verdict_for(json!(30), json!(25)), Verdict::Improved);
        assert_eq!(verdict_for(json!(25), json!(30)), Verdict::Worsened);
        assert_eq!(verdict_for(json!(28), json!(28)), Verdict::Unchanged);
        assert_eq!(verdict_for(json!(28), json!(28.0)), Verdict::Unchanged);
    }

    #[test]
    fn test_higher_is_better() {
        let before = json!({"result": {"score_info": {"total_score": 70}}});
        let after = json!({"result": {"score_info": {"total_score": 82.5}}});
        let rows = compare(&before, &after);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].verdict, Verdict::Improved);
        assert_eq!(rows[0].direction, Polarity::HigherIsBetter);
        assert_eq!(rows[0].category, "Scores");
    }

    #[test]
    fn test_neutral_numeric_change() {
        let before = json!({"result": {"eye_bag": {"severity": 1}}});
        let after = json!({"result": {"eye_bag": {"severity": 2}}});
        let rows = compare(&before, &after);
        assert_eq!(rows[0].verdict, Verdict::Changed);
        assert_eq!(rows[0].direction, Polarity::Neutral);
        assert!(rows[0].is_numeric);
    }

    #[test]
    fn test_non_numeric_and_one_sided_values() {
        let before = json!({"result": {"skin_type": {"skin_type": "oily"}, "acne": {"count": 3}}});
        let after = json!({"result": {"skin_type": {"skin_type": "dry"}}});
        let rows = compare(&before, &after);

        let skin_type = rows.iter().find(|r| r.key == "result.skin_type.skin_type").unwrap();
        assert_eq!(skin_type.verdict, Verdict::Changed);
        assert!(!skin_type.is_numeric);

        let acne = rows.iter().find(|r| r.key == "result.acne.count").unwrap();
        assert_eq!(acne.verdict, Verdict::Changed);
        assert_eq!(acne.before_value, json!(3));
        assert_eq!(acne.after_value, json!("-"));
        assert!(acne.is_numeric);
    }

    #[test]
    fn test_absent_in_both_omitted_and_order_fixed() {
        let before = json!({"result": {"mole": {"count": 1}, "skin_age": 40, "score_info": {"oil_score": null}}});
        let after = json!({"result": {"mole": {"count": 1}, "skin_age": 39}});
        let keys: Vec<String> = compare(&before, &after).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["result.skin_age", "result.mole.count"]);
    }

    #[test]
    fn test_unknown_key_fallbacks() {
        let before = json!({"result": {"custom": {"x": 1}}});
        let after = json!({"result": {"custom": {"x": 5}}});
        let rows = compare_keys(&before, &after, &["result.custom.x", "result.missing"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "result.custom.x");
        assert_eq!(rows[0].category, OTHER_CATEGORY);
        assert_eq!(rows[0].verdict, Verdict::Changed);
    }

    #[test]
    fn test_lookup_through_non_mapping() {
        let doc = json!({"result": {"skin_age": 30}});
        assert!(lookup_path(&doc, "result.skin_age.value").is_none());
        assert_eq!(lookup_path(&doc, "result.skin_age"), Some(&json!(30)));
    }

    #[test]
    fn test_float_values_rounded_for_display() {
        let before = json!({"result": {"sensitivity": {"area_percentage": 12.3456}}});
        let after = json!({"result": {"sensitivity": {"area_percentage": 10.001}}});
        let rows = compare(&before, &after);
        assert_eq!(rows[0].before_value, json!(12.35));
        assert_eq!(rows[0].after_value, json!(10.0));
        assert_eq!(rows[0].verdict, Verdict::Improved);
    }

    #[test]
    fn test_table_keys_unique() {
        let mut keys: Vec<&str> = TRACKED_METRICS.iter().map(|m| m.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), TRACKED_METRICS.len());
    }

    #[test]
    fn test_row_serialization_shape() {
        let rows = compare(&doc_with_age(json!(30)), &doc_with_age(json!(25)));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["verdict"], "improved");
        assert_eq!(json["direction"], "lower_is_better");
        assert_eq!(json["numeric"], true);
        assert_eq!(json["before"], 30);
    }
}

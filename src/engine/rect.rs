//! Axis-aligned pixel rectangles read from the analysis document

use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELDS: [&str; 4] = ["left", "top", "width", "height"];

/// Bounding box with a top-left origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Rectangle {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Read a rectangle from a JSON mapping.
    ///
    /// Returns `None` unless the value is a mapping carrying at least one of
    /// `left`/`top`/`width`/`height`. Absent fields default to 0 and negative
    /// extents clamp to 0.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if !FIELDS.iter().any(|field| map.contains_key(*field)) {
            return None;
        }
        let field = |name: &str| map.get(name).and_then(number_as_i64).unwrap_or(0);
        Some(Self::new(
            field("left"),
            field("top"),
            field("width"),
            field("height"),
        ))
    }

    /// Read every rectangle of a `{"rectangle": [...]}` node
    pub fn list_from_value(value: Option<&Value>) -> Vec<Self> {
        value
            .and_then(|v| v.get("rectangle"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Zero area, nothing to draw
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i64 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i64 {
        self.top.saturating_add(self.height)
    }
}

fn number_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

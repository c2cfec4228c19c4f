//! Region categories and the per-analysis region index
//!
//! The index maps each detected region category to its bounding boxes so a
//! client can highlight the area behind a clicked metric. Metric paths map
//! to categories through an explicit segment table rather than substring
//! matching, so `score_info.acne_score` does not collide with `acne`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rect::Rectangle;

/// Highlightable region kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionCategory {
    Face,
    DarkCircle,
    BrownSpot,
    Blackhead,
    AcneMark,
    Acne,
    Mole,
    EyePouch,
    AcneNodule,
    AcnePustule,
}

impl RegionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionCategory::Face => "face",
            RegionCategory::DarkCircle => "dark_circle",
            RegionCategory::BrownSpot => "brown_spot",
            RegionCategory::Blackhead => "blackhead",
            RegionCategory::AcneMark => "acne_mark",
            RegionCategory::Acne => "acne",
            RegionCategory::Mole => "mole",
            RegionCategory::EyePouch => "eye_pouch",
            RegionCategory::AcneNodule => "acne_nodule",
            RegionCategory::AcnePustule => "acne_pustule",
        }
    }

    /// Category owning a metric path, decided by the outermost path segment
    /// that names a region-bearing node.
    pub fn for_metric_path(path: &str) -> Option<Self> {
        path.split('.').find_map(Self::for_segment)
    }

    fn for_segment(segment: &str) -> Option<Self> {
        SEGMENT_CATEGORIES
            .iter()
            .find(|(name, _)| *name == segment)
            .map(|(_, category)| *category)
    }
}

/// Document node name → region category
const SEGMENT_CATEGORIES: &[(&str, RegionCategory)] = &[
    ("face_rectangle", RegionCategory::Face),
    ("dark_circle_mark", RegionCategory::DarkCircle),
    ("left_eye_pouch_rect", RegionCategory::EyePouch),
    ("right_eye_pouch_rect", RegionCategory::EyePouch),
    ("brown_spot", RegionCategory::BrownSpot),
    ("closed_comedones", RegionCategory::Blackhead),
    ("acne_mark", RegionCategory::AcneMark),
    ("acne", RegionCategory::Acne),
    ("mole", RegionCategory::Mole),
    ("acne_nodule", RegionCategory::AcneNodule),
    ("acne_pustule", RegionCategory::AcnePustule),
];

/// `result.<key>.rectangle[]` lists and the category they feed
const RECTANGLE_LISTS: &[(&str, RegionCategory)] = &[
    ("brown_spot", RegionCategory::BrownSpot),
    ("closed_comedones", RegionCategory::Blackhead),
    ("acne_mark", RegionCategory::AcneMark),
    ("acne", RegionCategory::Acne),
    ("mole", RegionCategory::Mole),
    ("acne_nodule", RegionCategory::AcneNodule),
    ("acne_pustule", RegionCategory::AcnePustule),
];

/// Category → rectangles, built once per analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionIndex(BTreeMap<RegionCategory, Vec<Rectangle>>);

impl RegionIndex {
    /// Extract every known rectangle-bearing node from an analysis document.
    /// Categories without at least one rectangle are left out.
    pub fn build(doc: &Value) -> Self {
        let mut index = Self::default();
        let result = doc.get("result");
        let node = |key: &str| result.and_then(|r| r.get(key));

        index.insert(
            RegionCategory::Face,
            doc.get("face_rectangle").and_then(Rectangle::from_value).into_iter().collect(),
        );

        let dark_circles = node("dark_circle_mark")
            .map(|mark| {
                ["left_eye_rect", "right_eye_rect"]
                    .iter()
                    .filter_map(|key| mark.get(*key).and_then(Rectangle::from_value))
                    .collect()
            })
            .unwrap_or_default();
        index.insert(RegionCategory::DarkCircle, dark_circles);

        let eye_pouches = ["left_eye_pouch_rect", "right_eye_pouch_rect"]
            .iter()
            .filter_map(|key| node(key).and_then(Rectangle::from_value))
            .collect();
        index.insert(RegionCategory::EyePouch, eye_pouches);

        for (key, category) in RECTANGLE_LISTS {
            index.insert(*category, Rectangle::list_from_value(node(key)));
        }

        index
    }

    fn insert(&mut self, category: RegionCategory, rects: Vec<Rectangle>) {
        if !rects.is_empty() {
            self.0.insert(category, rects);
        }
    }

    pub fn get(&self, category: RegionCategory) -> Option<&[Rectangle]> {
        self.0.get(&category).map(Vec::as_slice)
    }

    pub fn contains(&self, category: RegionCategory) -> bool {
        self.0.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionCategory, &[Rectangle])> {
        self.0.iter().map(|(category, rects)| (*category, rects.as_slice()))
    }
}

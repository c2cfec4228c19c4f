//! Analysis engine
//!
//! Pure image and document processing steps:
//! - upload normalization to RGB JPEG
//! - region annotation and legend drawing
//! - metrics flattening and region indexing
//! - the side-by-side report canvas
//! - before/after comparison

pub mod annotate;
pub mod compare;
pub mod composite;
pub mod flatten;
pub mod font;
pub mod normalize;
pub mod rect;
pub mod regions;

pub use annotate::{annotate, AnnotationStyle};
pub use compare::{compare, compare_keys, ComparisonRow, Polarity, Verdict};
pub use flatten::{flatten, panel_items, FlattenedMetric};
pub use normalize::{normalize, NormalizedImage};
pub use rect::Rectangle;
pub use regions::{RegionCategory, RegionIndex};

//! Draws detected skin regions onto a copy of the analysed photo

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use serde_json::Value;

use crate::config::RenderConfig;

use super::rect::Rectangle;

pub const FACE_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
pub const DARK_CIRCLE_COLOR: Rgb<u8> = Rgb([128, 0, 128]);
pub const BROWN_SPOT_COLOR: Rgb<u8> = Rgb([139, 90, 43]);
pub const COMEDONE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const ACNE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

const LEGEND_BACKGROUND: Rgb<u8> = Rgb([30, 30, 30]);
const LEGEND_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Legend entries, left to right
pub const LEGEND: [(Rgb<u8>, &str); 5] = [
    (FACE_COLOR, "Face"),
    (DARK_CIRCLE_COLOR, "Dark circles"),
    (BROWN_SPOT_COLOR, "Brown spots"),
    (COMEDONE_COLOR, "Comedones"),
    (ACNE_COLOR, "Acne"),
];

/// Stroke and legend geometry
#[derive(Debug, Clone, Copy)]
pub struct AnnotationStyle {
    pub face_stroke: u32,
    pub region_stroke: u32,
    pub legend_height: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for AnnotationStyle {
    fn from(config: &RenderConfig) -> Self {
        Self {
            face_stroke: config.face_stroke.max(1),
            region_stroke: config.region_stroke.max(1),
            legend_height: config.legend_height,
        }
    }
}

/// One rectangle to draw
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub rect: Rectangle,
    pub color: Rgb<u8>,
    pub label: Option<&'static str>,
    pub stroke: u32,
}

/// Collect the rectangles to draw from an analysis document, in drawing order
pub fn directives(doc: &Value, style: &AnnotationStyle) -> Vec<Directive> {
    let mut out = Vec::new();
    let result = doc.get("result");
    let node = |key: &str| result.and_then(|r| r.get(key));

    if let Some(rect) = doc.get("face_rectangle").and_then(Rectangle::from_value) {
        out.push(Directive {
            rect,
            color: FACE_COLOR,
            label: Some("Face"),
            stroke: style.face_stroke,
        });
    }

    if let Some(mark) = node("dark_circle_mark") {
        for (key, label) in [
            ("left_eye_rect", "Dark circle (L)"),
            ("right_eye_rect", "Dark circle (R)"),
        ] {
            if let Some(rect) = mark.get(key).and_then(Rectangle::from_value) {
                out.push(Directive {
                    rect,
                    color: DARK_CIRCLE_COLOR,
                    label: Some(label),
                    stroke: style.region_stroke,
                });
            }
        }
    }

    for (key, color) in [
        ("brown_spot", BROWN_SPOT_COLOR),
        ("closed_comedones", COMEDONE_COLOR),
        ("acne_mark", ACNE_COLOR),
        ("acne", ACNE_COLOR),
    ] {
        for rect in Rectangle::list_from_value(node(key)) {
            out.push(Directive {
                rect,
                color,
                label: None,
                stroke: style.region_stroke,
            });
        }
    }

    out
}

/// Render the annotated image. `source` is left untouched.
pub fn annotate(
    source: &RgbImage,
    doc: &Value,
    style: &AnnotationStyle,
    font: Option<&FontVec>,
) -> RgbImage {
    let mut canvas = source.clone();
    let label_scale = PxScale::from((canvas.width() / 55).clamp(10, 18) as f32);

    for directive in directives(doc, style) {
        let drawn = draw_outline(&mut canvas, &directive.rect, directive.color, directive.stroke);
        if let (true, Some(label), Some(font)) = (drawn, directive.label, font) {
            let (w, h) = (canvas.width() as i64, canvas.height() as i64);
            let x = directive.rect.left.clamp(-w, w) as i32;
            let y = directive.rect.top.saturating_sub(22).clamp(-h, h) as i32;
            draw_text_mut(&mut canvas, directive.color, x, y, label_scale, font, label);
        }
    }

    draw_legend(&mut canvas, style.legend_height, font);
    canvas
}

/// Outline `rect` with `stroke` concentric one-pixel rectangles growing outward.
/// Each outline spans `left - i ..= right + i`. Degenerate and fully
/// off-image rectangles are skipped; returns whether anything was drawn.
pub fn draw_outline(canvas: &mut RgbImage, rect: &Rectangle, color: Rgb<u8>, stroke: u32) -> bool {
    if rect.is_empty() || stroke == 0 {
        return false;
    }
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    let reach = stroke as i64 - 1;
    if rect.right().saturating_add(reach) < 0
        || rect.bottom().saturating_add(reach) < 0
        || rect.left.saturating_sub(reach) >= w
        || rect.top.saturating_sub(reach) >= h
    {
        return false;
    }

    for i in 0..=reach {
        // Edges past the canvas are pulled to just outside it, so they stay invisible
        let x1 = rect.left.saturating_sub(i).clamp(-1, w);
        let y1 = rect.top.saturating_sub(i).clamp(-1, h);
        let x2 = rect.right().saturating_add(i).clamp(-1, w);
        let y2 = rect.bottom().saturating_add(i).clamp(-1, h);
        let outline = Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1 + 1) as u32, (y2 - y1 + 1) as u32);
        draw_hollow_rect_mut(canvas, outline, color);
    }
    true
}

/// Dark bar across the bottom listing colour to category
fn draw_legend(canvas: &mut RgbImage, legend_height: u32, font: Option<&FontVec>) {
    let (w, h) = canvas.dimensions();
    let bar_height = legend_height.min(h);
    if bar_height == 0 || w == 0 {
        return;
    }
    let bar_top = (h - bar_height) as i32;
    draw_filled_rect_mut(canvas, Rect::at(0, bar_top).of_size(w, bar_height), LEGEND_BACKGROUND);

    let swatch = (bar_height / 3).max(1);
    let swatch_top = bar_top + ((bar_height - swatch) / 2) as i32;
    let scale = PxScale::from((w / 55).clamp(10, 18) as f32);
    let mut x = 15i32;

    for (color, name) in LEGEND {
        if x >= w as i32 {
            break;
        }
        draw_filled_rect_mut(canvas, Rect::at(x, swatch_top).of_size(swatch, swatch), color);
        x += swatch as i32 + 6;
        if let Some(font) = font {
            let (text_w, text_h) = text_size(scale, font, name);
            let text_top = bar_top + (bar_height.saturating_sub(text_h) / 2) as i32;
            draw_text_mut(canvas, LEGEND_TEXT, x, text_top, scale, font, name);
            x += text_w as i32;
        }
        x += 18;
    }
}

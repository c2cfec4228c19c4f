//! Side-by-side report canvas: annotated photo on the left, metrics panel on the right

use ab_glyph::{FontVec, PxScale};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use super::flatten::FlattenedMetric;

const BACKGROUND: Rgb<u8> = Rgb([25, 25, 25]);
const TITLE_COLOR: Rgb<u8> = Rgb([100, 200, 255]);
const LABEL_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
const VALUE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const PANEL_MAX_WIDTH: u32 = 580;
const MIN_CANVAS_HEIGHT: u32 = 1200;
const PANEL_MARGIN: i32 = 12;
const VALUE_COLUMN_FROM_RIGHT: i32 = 130;
const LINE_HEIGHT: i32 = 14;
const TITLE_GAP: i32 = 20;

pub const PANEL_TITLE: &str = "FULL JSON RESPONSE (all parameters)";

/// Canvas size for an annotated image of the given size
pub fn canvas_size(image_width: u32, image_height: u32) -> (u32, u32) {
    let panel = PANEL_MAX_WIDTH.min(image_width);
    (image_width + panel, image_height.max(MIN_CANVAS_HEIGHT))
}

/// Lay out `annotated` and a text panel of `items` on one canvas.
///
/// Without a font the panel area is left blank; rows that would fall
/// below the canvas are dropped.
pub fn render(annotated: &RgbImage, items: &[FlattenedMetric], font: Option<&FontVec>) -> RgbImage {
    let (w, h) = annotated.dimensions();
    let (canvas_w, canvas_h) = canvas_size(w, h);
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, BACKGROUND);
    imageops::replace(&mut canvas, annotated, 0, 0);

    let Some(font) = font else {
        return canvas;
    };

    let panel_left = w as i32 + PANEL_MARGIN;
    let value_left = canvas_w as i32 - VALUE_COLUMN_FROM_RIGHT;
    let title_scale = PxScale::from(14.0);
    let row_scale = PxScale::from(12.0);

    let mut y = PANEL_MARGIN;
    draw_text_mut(&mut canvas, TITLE_COLOR, panel_left, y, title_scale, font, PANEL_TITLE);
    y += TITLE_GAP;

    for item in items {
        if y + LINE_HEIGHT > canvas_h as i32 {
            break;
        }
        let label = format!("  {}", item.display_label);
        draw_text_mut(&mut canvas, LABEL_COLOR, panel_left, y, row_scale, font, &label);
        draw_text_mut(&mut canvas, VALUE_COLOR, value_left, y, row_scale, font, &item.value);
        y += LINE_HEIGHT;
    }

    canvas
}

//! Burns an [`OverlayScene`] into an RGB image, for annotated stills.

use image::{Rgb, RgbImage};

use crate::overlay::bitmap_font;
use crate::overlay::overlay_scene::{OverlayLabel, OverlayScene};

/// Box color for a face looking at the camera.
pub const LOOKING_COLOR: Rgb<u8> = Rgb([0, 200, 83]);
/// Box color otherwise.
pub const AWAY_COLOR: Rgb<u8> = Rgb([255, 171, 0]);
pub const LANDMARK_COLOR: Rgb<u8> = Rgb([0, 176, 255]);

pub const LABEL_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
pub const EXPRESSION_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BOX_THICKNESS: u32 = 2;
const LANDMARK_RADIUS: i64 = 1;
/// Caption glyphs are 14 px tall, inside the label band above the box.
const CAPTION_SCALE: u32 = 2;
const EXPRESSION_SCALE: u32 = 2;
const LABEL_PAD: u32 = 2;

pub fn paint(image: &mut RgbImage, scene: &OverlayScene) {
    let color = if scene.is_looking {
        LOOKING_COLOR
    } else {
        AWAY_COLOR
    };
    draw_label(image, &scene.caption, CAPTION_SCALE, color);
    for label in &scene.expressions {
        draw_label(image, label, EXPRESSION_SCALE, EXPRESSION_COLOR);
    }
    // Box last so labels never hide its edges.
    draw_box(
        image,
        scene.bbox.x,
        scene.bbox.y,
        scene.bbox.right(),
        scene.bbox.bottom(),
        color,
    );
    for &(x, y) in &scene.landmarks {
        draw_dot(image, x, y, LANDMARK_COLOR);
    }
}

fn draw_label(image: &mut RgbImage, label: &OverlayLabel, scale: u32, color: Rgb<u8>) {
    if label.text.is_empty() {
        return;
    }
    let (w, h) = bitmap_font::text_size(&label.text, scale);
    let (x, y) = (label.x.round() as i64, label.y.round() as i64);
    let pad = LABEL_PAD as i64;
    bitmap_font::fill(
        image,
        x,
        y,
        w as i64 + 2 * pad,
        h as i64 + 2 * pad,
        LABEL_BACKGROUND,
    );
    bitmap_font::draw_text(image, x + pad, y + pad, &label.text, scale, color);
}

fn draw_box(image: &mut RgbImage, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgb<u8>) {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let clamp_x = |v: f64| (v.round().max(0.0) as u32).min(w - 1);
    let clamp_y = |v: f64| (v.round().max(0.0) as u32).min(h - 1);
    let (x1, x2) = (clamp_x(x1), clamp_x(x2));
    let (y1, y2) = (clamp_y(y1), clamp_y(y2));
    if x2 <= x1 || y2 <= y1 {
        return;
    }

    for t in 0..BOX_THICKNESS {
        for x in x1..=x2 {
            put(image, x, y1 + t, color);
            put(image, x, y2.saturating_sub(t), color);
        }
        for y in y1..=y2 {
            put(image, x1 + t, y, color);
            put(image, x2.saturating_sub(t), y, color);
        }
    }
}

fn draw_dot(image: &mut RgbImage, x: f64, y: f64, color: Rgb<u8>) {
    let (cx, cy) = (x.round() as i64, y.round() as i64);
    for dy in -LANDMARK_RADIUS..=LANDMARK_RADIUS {
        for dx in -LANDMARK_RADIUS..=LANDMARK_RADIUS {
            let (px, py) = (cx + dx, cy + dy);
            if px >= 0 && py >= 0 {
                put(image, px as u32, py as u32, color);
            }
        }
    }
}

fn put(image: &mut RgbImage, x: u32, y: u32, color: Rgb<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}

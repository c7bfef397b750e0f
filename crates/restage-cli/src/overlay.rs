//! Detection overlay rendering: the original photo with stroked
//! rectangles where furniture was found.

use image::{Rgba, RgbaImage};
use tiny_skia::{IntSize, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use restage_pipeline::{BoundingBox, Dimensions};

/// Stroke width for detection rectangles, in pixels.
const BOX_STROKE_WIDTH: f32 = 3.0;

/// Render detection boxes over the photo as red anti-aliased strokes.
///
/// Boxes are drawn at their raw coordinates; parts outside the frame
/// are simply clipped by the canvas. An empty box set returns the photo
/// unchanged (with an opaque alpha channel).
#[allow(clippy::cast_precision_loss)]
pub fn render_overlay(photo: &image::RgbImage, boxes: &[BoundingBox]) -> RgbaImage {
    let Dimensions { width, height } = Dimensions::of(photo);

    // Seed the pixmap with the photo. Alpha is 255 everywhere, so
    // straight and premultiplied RGBA coincide here.
    let mut data = Vec::with_capacity(4 * photo.as_raw().len() / 3);
    for pixel in photo.pixels() {
        data.extend_from_slice(&[pixel.0[0], pixel.0[1], pixel.0[2], 255]);
    }
    let Some(size) = IntSize::from_wh(width, height) else {
        return RgbaImage::new(width, height);
    };
    let Some(mut pixmap) = Pixmap::from_vec(data, size) else {
        return RgbaImage::new(width, height);
    };

    let stroke = Stroke {
        width: BOX_STROKE_WIDTH,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(220, 40, 40, 255);
    paint.anti_alias = true;

    for bbox in boxes {
        let Some(rect) = Rect::from_ltrb(
            bbox.x1 as f32,
            bbox.y1 as f32,
            bbox.x2 as f32,
            bbox.y2 as f32,
        ) else {
            continue;
        };
        let path = PathBuilder::from_rect(rect);
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    // Convert the pixmap (premultiplied RGBA) back to straight RGBA.
    let pixmap_data = pixmap.data();
    let mut img = RgbaImage::new(width, height);
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = pixmap_data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            #[allow(clippy::cast_possible_truncation)]
            let unmul = |c: u8| (u16::from(c) * 255 / u16::from(a)) as u8;
            *pixel = Rgba([
                unmul(pixmap_data[off]),
                unmul(pixmap_data[off + 1]),
                unmul(pixmap_data[off + 2]),
                a,
            ]);
        }
    }
    img
}

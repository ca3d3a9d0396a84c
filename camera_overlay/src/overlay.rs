//! Draws detection boxes and points onto a copy of an image.
//!
//! Normalized coordinates are scaled by the image size and truncated, then
//! clamped to `[0, dim]` with min/max sorted per axis. Drawing is clipped to
//! the canvas, so a coordinate of exactly `1.0` lands one pixel past the edge
//! and is simply not drawn.

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_filled_rect_mut},
    rect::Rect,
};
use vision_client::{NormalizedBox, NormalizedPoint};

pub const DEFAULT_STROKE_WIDTH: u32 = 3;
pub const DEFAULT_POINT_RADIUS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub box_color: Rgb<u8>,
    pub stroke_width: u32,
    pub point_color: Rgb<u8>,
    pub point_radius: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            box_color: Rgb([255, 0, 0]),
            stroke_width: DEFAULT_STROKE_WIDTH,
            point_color: Rgb([0, 0, 255]),
            point_radius: DEFAULT_POINT_RADIUS,
        }
    }
}

/// Rectangle in pixel space; both corners are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

fn scale(coord: f64, dim: u32) -> i64 {
    let dim = dim as f64;
    // NaN survives the clamp and casts to 0
    (coord * dim).clamp(0.0, dim).floor() as i64
}

pub fn scale_box(bbox: &NormalizedBox, width: u32, height: u32) -> PixelRect {
    let (x0, x1) = (scale(bbox.x_min, width), scale(bbox.x_max, width));
    let (y0, y1) = (scale(bbox.y_min, height), scale(bbox.y_max, height));
    PixelRect {
        left: x0.min(x1),
        top: y0.min(y1),
        right: x0.max(x1),
        bottom: y0.max(y1),
    }
}

pub fn scale_point(point: &NormalizedPoint, width: u32, height: u32) -> PixelPoint {
    PixelPoint {
        x: scale(point.x, width),
        y: scale(point.y, height),
    }
}

fn to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn fill(canvas: &mut RgbImage, x: i64, y: i64, width: i64, height: i64, color: Rgb<u8>) {
    if width <= 0 || height <= 0 {
        return;
    }
    let rect = Rect::at(to_i32(x), to_i32(y)).of_size(to_u32(width), to_u32(height));
    draw_filled_rect_mut(canvas, rect, color);
}

fn draw_outline(canvas: &mut RgbImage, rect: PixelRect, stroke: u32, color: Rgb<u8>) {
    let width = rect.right - rect.left + 1;
    let height = rect.bottom - rect.top + 1;
    let stroke = i64::from(stroke.max(1));

    if stroke * 2 >= width.min(height) {
        fill(canvas, rect.left, rect.top, width, height, color);
        return;
    }

    let inner = height - 2 * stroke;
    fill(canvas, rect.left, rect.top, width, stroke, color);
    fill(canvas, rect.left, rect.bottom - stroke + 1, width, stroke, color);
    fill(canvas, rect.left, rect.top + stroke, stroke, inner, color);
    fill(canvas, rect.right - stroke + 1, rect.top + stroke, stroke, inner, color);
}

pub fn render_overlay(
    image: &RgbImage,
    boxes: &[NormalizedBox],
    points: &[NormalizedPoint],
) -> RgbImage {
    render_overlay_with_style(image, boxes, points, &OverlayStyle::default())
}

/// Returns an annotated copy of `image`; the input is left untouched.
pub fn render_overlay_with_style(
    image: &RgbImage,
    boxes: &[NormalizedBox],
    points: &[NormalizedPoint],
    style: &OverlayStyle,
) -> RgbImage {
    let mut canvas = image.clone();
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return canvas;
    }

    for bbox in boxes {
        let rect = scale_box(bbox, width, height);
        draw_outline(&mut canvas, rect, style.stroke_width, style.box_color);
    }

    let radius = to_i32(i64::from(style.point_radius));
    for point in points {
        let center = scale_point(point, width, height);
        draw_filled_circle_mut(
            &mut canvas,
            (to_i32(center.x), to_i32(center.y)),
            radius,
            style.point_color,
        );
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;
    use std::{
        collections::hash_map::DefaultHasher,
        hash::{Hash, Hasher},
    };

    const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

    fn blank(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_pixel(width, height, BACKGROUND)
    }

    fn checksum(image: &RgbImage) -> u64 {
        let mut hasher = DefaultHasher::new();
        image.as_raw().hash(&mut hasher);
        hasher.finish()
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of pixels that differ.
    fn changed_extent(before: &RgbImage, after: &RgbImage) -> Option<(u32, u32, u32, u32)> {
        let mut extent: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in after.enumerate_pixels() {
            if before.get_pixel(x, y) != pixel {
                extent = Some(match extent {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        extent
    }

    fn bbox(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> NormalizedBox {
        NormalizedBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[test]
    fn test_scale_box_truncates() {
        let rect = scale_box(&bbox(0.1, 0.2, 0.5, 0.6), 800, 600);
        assert_eq!(
            rect,
            PixelRect {
                left: 80,
                top: 120,
                right: 400,
                bottom: 360,
            }
        );

        let rect = scale_box(&bbox(0.333, 0.999, 0.75, 1.0), 100, 100);
        assert_eq!(
            rect,
            PixelRect {
                left: 33,
                top: 99,
                right: 75,
                bottom: 100,
            }
        );
    }

    #[test]
    fn test_scale_box_sorts_reversed_edges() {
        let rect = scale_box(&bbox(0.5, 0.6, 0.1, 0.2), 800, 600);
        assert_eq!(
            rect,
            PixelRect {
                left: 80,
                top: 120,
                right: 400,
                bottom: 360,
            }
        );
    }

    #[test]
    fn test_scale_clamps_out_of_range() {
        let rect = scale_box(&bbox(-0.5, -1.0, 1.5, f64::NAN), 200, 100);
        assert_eq!(
            rect,
            PixelRect {
                left: 0,
                top: 0,
                right: 200,
                bottom: 0,
            }
        );

        let point = scale_point(&NormalizedPoint { x: 2.0, y: -3.0 }, 50, 40);
        assert_eq!(point, PixelPoint { x: 50, y: 0 });
    }

    #[test]
    fn test_box_is_drawn_at_scaled_corners() {
        let image = blank(800, 600);
        let result = render_overlay(&image, &[bbox(0.1, 0.2, 0.5, 0.6)], &[]);

        assert_eq!(changed_extent(&image, &result), Some((80, 120, 400, 360)));

        let red = Rgb([255, 0, 0]);
        assert_eq!(*result.get_pixel(80, 120), red);
        assert_eq!(*result.get_pixel(400, 360), red);
        // stroke of 3 grows inward
        assert_eq!(*result.get_pixel(82, 200), red);
        assert_eq!(*result.get_pixel(83, 200), BACKGROUND);
        assert_eq!(*result.get_pixel(398, 200), red);
        assert_eq!(*result.get_pixel(397, 200), BACKGROUND);
        assert_eq!(*result.get_pixel(200, 122), red);
        assert_eq!(*result.get_pixel(200, 123), BACKGROUND);
        assert_eq!(*result.get_pixel(240, 240), BACKGROUND);
    }

    #[test]
    fn test_point_is_drawn_as_disk() {
        let image = blank(100, 100);
        let result = render_overlay(&image, &[], &[NormalizedPoint { x: 0.5, y: 0.5 }]);

        assert_eq!(changed_extent(&image, &result), Some((46, 46, 54, 54)));

        let blue = Rgb([0, 0, 255]);
        assert_eq!(*result.get_pixel(50, 50), blue);
        assert_eq!(*result.get_pixel(46, 50), blue);
        assert_eq!(*result.get_pixel(50, 54), blue);
        assert_eq!(*result.get_pixel(45, 50), BACKGROUND);
    }

    #[test]
    fn test_empty_detections_leave_image_identical() {
        let mut image = blank(64, 48);
        image.put_pixel(10, 10, Rgb([1, 2, 3]));

        let result = render_overlay(&image, &[], &[]);

        assert_eq!(result, image);
    }

    #[test]
    fn test_render_does_not_mutate_input() {
        let image = blank(120, 90);
        let before = checksum(&image);

        let result = render_overlay(
            &image,
            &[bbox(0.1, 0.1, 0.9, 0.9)],
            &[NormalizedPoint { x: 0.3, y: 0.7 }],
        );

        assert_eq!(checksum(&image), before);
        assert_ne!(checksum(&result), before);
    }

    #[test]
    fn test_boundary_values_do_not_panic() {
        let image = blank(100, 100);
        let boxes = [
            bbox(0.0, 0.0, 1.0, 1.0),
            bbox(1.0, 1.0, 1.0, 1.0),
            bbox(0.0, 0.0, 0.0, 0.0),
            bbox(1.0, 0.0, 0.0, 1.0),
            bbox(-2.0, -2.0, 3.0, 3.0),
        ];
        let points = [
            NormalizedPoint { x: 0.0, y: 0.0 },
            NormalizedPoint { x: 1.0, y: 1.0 },
            NormalizedPoint { x: 1.0, y: 0.0 },
            NormalizedPoint { x: 5.0, y: -5.0 },
        ];

        let result = render_overlay(&image, &boxes, &points);

        assert_eq!(result.dimensions(), (100, 100));
        // right edge band of the full-frame box is still visible
        assert_eq!(*result.get_pixel(99, 50), Rgb([255, 0, 0]));
        assert_eq!(*result.get_pixel(0, 50), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_zero_sized_image() {
        let image = blank(0, 0);
        let result = render_overlay(&image, &[bbox(0.1, 0.1, 0.2, 0.2)], &[]);
        assert_eq!(result.dimensions(), (0, 0));
    }

    #[test]
    fn test_custom_style() {
        let image = blank(50, 50);
        let style = OverlayStyle {
            box_color: Rgb([0, 255, 0]),
            stroke_width: 1,
            point_color: Rgb([255, 255, 0]),
            point_radius: 0,
        };

        let result = render_overlay_with_style(
            &image,
            &[bbox(0.2, 0.2, 0.8, 0.8)],
            &[NormalizedPoint { x: 0.5, y: 0.5 }],
            &style,
        );

        assert_eq!(*result.get_pixel(10, 25), Rgb([0, 255, 0]));
        assert_eq!(*result.get_pixel(11, 25), BACKGROUND);
        assert_eq!(*result.get_pixel(25, 25), Rgb([255, 255, 0]));
        assert_eq!(changed_extent(&image, &result), Some((10, 10, 40, 40)));
    }
}

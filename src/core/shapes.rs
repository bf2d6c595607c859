//! Rounded-rectangle rasterisation and pixel blending.
//!
//! Shapes are evaluated per pixel centre with a signed distance function, so
//! edges come out anti-aliased and the result only depends on the inputs.

use image::{GrayImage, Luma, Rgba, RgbaImage};

#[derive(Debug, Clone, Copy)]
struct RoundedRect {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    radius: f32,
}

impl RoundedRect {
    fn new(left: f32, top: f32, right: f32, bottom: f32, radius: f32) -> Self {
        let half_w = ((right - left) / 2.0).max(0.0);
        let half_h = ((bottom - top) / 2.0).max(0.0);
        Self {
            left,
            top,
            right,
            bottom,
            radius: radius.max(0.0).min(half_w).min(half_h),
        }
    }

    fn inset(&self, by: f32) -> Self {
        Self::new(
            self.left + by,
            self.top + by,
            self.right - by,
            self.bottom - by,
            self.radius - by,
        )
    }

    fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Negative inside, positive outside.
    fn signed_distance(&self, px: f32, py: f32) -> f32 {
        let cx = (self.left + self.right) / 2.0;
        let cy = (self.top + self.bottom) / 2.0;
        let qx = (px - cx).abs() - ((self.right - self.left) / 2.0 - self.radius);
        let qy = (py - cy).abs() - ((self.bottom - self.top) / 2.0 - self.radius);
        let outside = qx.max(0.0).hypot(qy.max(0.0));
        outside + qx.max(qy).min(0.0) - self.radius
    }

    /// Fraction of the pixel at `(x, y)` covered by the shape.
    fn coverage(&self, x: u32, y: u32) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.signed_distance(x as f32 + 0.5, y as f32 + 0.5);
        (0.5 - d).clamp(0.0, 1.0)
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// `w`×`h` mask holding a filled rounded rectangle spanning the whole image.
pub fn rounded_rect_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let shape = RoundedRect::new(0.0, 0.0, width as f32, height as f32, radius as f32);
    GrayImage::from_fn(width, height, |x, y| Luma([to_u8(shape.coverage(x, y))]))
}

/// Layer of `w`×`h` with a filled rounded rectangle of `color`; transparent elsewhere.
pub fn filled_rounded_rect(width: u32, height: u32, radius: u32, color: Rgba<u8>) -> RgbaImage {
    let mask = rounded_rect_mask(width, height, radius);
    RgbaImage::from_fn(width, height, |x, y| {
        let cov = mask.get_pixel(x, y)[0] as u32;
        let alpha = (color[3] as u32 * cov + 127) / 255;
        Rgba([color[0], color[1], color[2], alpha as u8])
    })
}

/// Transparent `w`×`h` layer holding the inside edge of a rounded rectangle.
pub fn stroke_rounded_rect(
    width: u32,
    height: u32,
    radius: u32,
    stroke_width: u32,
    color: Rgba<u8>,
) -> RgbaImage {
    let outer = RoundedRect::new(0.0, 0.0, width as f32, height as f32, radius as f32);
    let inner = outer.inset(stroke_width as f32);
    RgbaImage::from_fn(width, height, |x, y| {
        let cov = (outer.coverage(x, y) - inner.coverage(x, y)).clamp(0.0, 1.0);
        Rgba([color[0], color[1], color[2], to_u8(cov * color[3] as f32 / 255.0)])
    })
}

/// Copies `src` onto `canvas` at `origin`, weighting every channel by the
/// source alpha (a masked paste, so the canvas alpha is blended too).
pub fn paste_with_alpha(canvas: &mut RgbaImage, src: &RgbaImage, origin: (u32, u32)) {
    let (ox, oy) = origin;
    for (x, y, px) in src.enumerate_pixels() {
        let (Some(cx), Some(cy)) = (ox.checked_add(x), oy.checked_add(y)) else {
            continue;
        };
        if cx >= canvas.width() || cy >= canvas.height() {
            continue;
        }
        let m = px[3] as u32;
        let dst = canvas.get_pixel_mut(cx, cy);
        for c in 0..4 {
            dst[c] = ((px[c] as u32 * m + dst[c] as u32 * (255 - m) + 127) / 255) as u8;
        }
    }
}

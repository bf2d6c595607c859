//! Side-by-side "before / after" collage on a fixed template.
//!
//! Drawing order is fixed so identical inputs give identical PNG bytes:
//!
//! 1. paste the prepared "before" photo into the left slot
//! 2. paste the prepared "after" photo into the right slot
//! 3. for each slot, left then right: white rounded outline, then a blurred
//!    translucent shadow composited a few pixels lower
//! 4. drop the alpha channel and encode PNG

use crate::config::layout::CollageLayout;
use crate::core::prepare::prepare;
use crate::core::shapes::{filled_rounded_rect, paste_with_alpha, stroke_rounded_rect};
use crate::utils::error::{BotError, Result};
use image::imageops::{self, overlay};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CollageComposer {
    template_path: PathBuf,
    layout: CollageLayout,
}

impl CollageComposer {
    pub fn new(template_path: impl Into<PathBuf>, layout: CollageLayout) -> Self {
        Self {
            template_path: template_path.into(),
            layout,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    /// Renders the collage and returns it PNG-encoded.
    pub fn compose(&self, before: &[u8], after: &[u8]) -> Result<Vec<u8>> {
        let canvas = self.compose_image(before, after)?;
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| BotError::compose(format!("PNG encoding failed: {}", e)))?;
        Ok(buf.into_inner())
    }

    /// Renders the collage as an opaque RGB image with the template's size.
    pub fn compose_image(&self, before: &[u8], after: &[u8]) -> Result<RgbImage> {
        let mut canvas = self.load_template()?;
        let layout = &self.layout;
        let (w, h) = layout.slot_size();

        let before_img = prepare(before, w, h, layout.corner_radius)?;
        let after_img = prepare(after, w, h, layout.corner_radius)?;
        paste_with_alpha(&mut canvas, &before_img, (layout.left.x0, layout.left.y0));
        paste_with_alpha(&mut canvas, &after_img, (layout.right.x0, layout.right.y0));

        let border = stroke_rounded_rect(
            w,
            h,
            layout.corner_radius,
            layout.border_width,
            Rgba(layout.border_color),
        );
        let shadow_fill = Rgba([0, 0, 0, layout.shadow.alpha]);
        let shadow = filled_rounded_rect(w, h, layout.corner_radius, shadow_fill);
        let shadow = if layout.shadow.blur_sigma > 0.0 {
            imageops::blur(&shadow, layout.shadow.blur_sigma)
        } else {
            shadow
        };
        let offset_y = i64::from(layout.shadow.offset_y);
        for slot in layout.slots() {
            let (x, y) = (i64::from(slot.x0), i64::from(slot.y0));
            overlay(&mut canvas, &border, x, y);
            overlay(&mut canvas, &shadow, x, y + offset_y);
        }

        Ok(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    fn load_template(&self) -> Result<RgbaImage> {
        let path_str = self.template_path.display().to_string();
        let template = ImageReader::open(&self.template_path)
            .map_err(|e| BotError::TemplateLoadError {
                path: path_str.clone(),
                message: e.to_string(),
            })?
            .with_guessed_format()
            .map_err(|e| BotError::TemplateLoadError {
                path: path_str.clone(),
                message: e.to_string(),
            })?
            .decode()
            .map_err(|e| BotError::TemplateLoadError {
                path: path_str.clone(),
                message: e.to_string(),
            })?
            .to_rgba8();

        let (need_w, need_h) = self.layout.required_template_size();
        if template.width() < need_w || template.height() < need_h {
            return Err(BotError::TemplateLoadError {
                path: path_str,
                message: format!(
                    "template is {}x{}, slots need at least {}x{}",
                    template.width(),
                    template.height(),
                    need_w,
                    need_h
                ),
            });
        }
        Ok(template)
    }
}

/// Composes with the production layout.
pub fn compose(template_path: &Path, before: &[u8], after: &[u8]) -> Result<Vec<u8>> {
    CollageComposer::new(template_path, CollageLayout::default()).compose(before, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SlotBox;
    use image::Rgb;
    use tempfile::TempDir;

    fn small_layout() -> CollageLayout {
        CollageLayout {
            left: SlotBox::new(10, 10, 50, 60),
            right: SlotBox::new(70, 10, 110, 60),
            corner_radius: 6,
            ..CollageLayout::default()
        }
    }

    fn write_template(dir: &TempDir, w: u32, h: u32) -> PathBuf {
        let path = dir.path().join("template.png");
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn photo(color: [u8; 3], w: u32, h: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(color)))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_output_matches_template_size_and_fills_slots() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let composer = CollageComposer::new(&path, small_layout());

        let out = composer
            .compose_image(&photo([255, 0, 0], 64, 64), &photo([0, 255, 0], 200, 90))
            .unwrap();

        assert_eq!(out.dimensions(), (120, 80));
        // slot centres carry the photos, darkened slightly by the shadow
        let left = out.get_pixel(30, 35);
        assert!(left[0] > 180 && left[1] < 30 && left[2] < 30, "{:?}", left);
        let right = out.get_pixel(90, 35);
        assert!(right[1] > 180 && right[0] < 30 && right[2] < 30, "{:?}", right);
        // rounded corner shows the template through
        assert_eq!(*out.get_pixel(10, 10), Rgb([0, 0, 255]));
        // outside every slot is untouched template
        assert_eq!(*out.get_pixel(60, 5), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_border_is_white() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let layout = CollageLayout {
            shadow: crate::domain::model::ShadowStyle {
                alpha: 0,
                ..Default::default()
            },
            ..small_layout()
        };
        let out = CollageComposer::new(&path, layout)
            .compose_image(&photo([0, 0, 0], 10, 10), &photo([0, 0, 0], 10, 10))
            .unwrap();
        assert_eq!(*out.get_pixel(30, 10), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(90, 11), Rgb([255, 255, 255]));
        assert_eq!(*out.get_pixel(30, 12), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let composer = CollageComposer::new(&path, small_layout());
        let before = photo([12, 34, 56], 33, 77);
        let after = photo([200, 100, 50], 90, 20);

        let first = composer.compose(&before, &after).unwrap();
        let second = composer.compose(&before, &after).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_output_is_opaque_png() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let bytes = CollageComposer::new(&path, small_layout())
            .compose(&photo([1, 2, 3], 8, 8), &photo([4, 5, 6], 8, 8))
            .unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[test]
    fn test_missing_template_fails_with_template_error() {
        let dir = TempDir::new().unwrap();
        let composer = CollageComposer::new(dir.path().join("nope.png"), small_layout());
        let err = composer
            .compose(&photo([1, 2, 3], 8, 8), &photo([4, 5, 6], 8, 8))
            .unwrap_err();
        assert!(matches!(err, BotError::TemplateLoadError { .. }));
    }

    #[test]
    fn test_corrupt_template_fails_with_template_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("template.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = CollageComposer::new(&path, small_layout())
            .compose(&photo([1, 2, 3], 8, 8), &photo([4, 5, 6], 8, 8))
            .unwrap_err();
        assert!(matches!(err, BotError::TemplateLoadError { .. }));
    }

    #[test]
    fn test_template_smaller_than_slots_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 100, 80);
        let err = CollageComposer::new(&path, small_layout())
            .compose(&photo([1, 2, 3], 8, 8), &photo([4, 5, 6], 8, 8))
            .unwrap_err();
        assert!(matches!(err, BotError::TemplateLoadError { .. }));
    }

    #[test]
    fn test_shadow_past_template_edge_is_clipped() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let mut layout = small_layout();
        layout.shadow.offset_y = u32::MAX;
        let out = CollageComposer::new(&path, layout)
            .compose_image(&photo([255, 0, 0], 8, 8), &photo([0, 255, 0], 8, 8))
            .unwrap();
        assert_eq!(out.dimensions(), (120, 80));
        // no shadow lands on the slot
        let left = out.get_pixel(30, 35);
        assert!(left[0] > 250 && left[1] < 5, "{:?}", left);
    }

    #[test]
    fn test_bad_photo_propagates_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = write_template(&dir, 120, 80);
        let err = CollageComposer::new(&path, small_layout())
            .compose(&photo([1, 2, 3], 8, 8), b"garbage")
            .unwrap_err();
        assert!(matches!(err, BotError::DecodeError { .. }));
    }
}

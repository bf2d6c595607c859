use crate::core::shapes::rounded_rect_mask;
use crate::utils::error::{BotError, Result};
use image::imageops::FilterType;
use image::RgbaImage;

/// Decodes `image_bytes`, fills and center-crops it to exactly `width`×`height`,
/// and replaces its alpha channel with a rounded-rectangle mask.
pub fn prepare(image_bytes: &[u8], width: u32, height: u32, corner_radius: u32) -> Result<RgbaImage> {
    if width == 0 || height == 0 {
        return Err(BotError::decode(format!(
            "target box {}x{} is empty",
            width, height
        )));
    }

    let img = image::load_from_memory(image_bytes).map_err(|e| BotError::decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(BotError::decode(format!(
            "image has no pixels ({}x{})",
            img.width(),
            img.height()
        )));
    }

    tracing::debug!(
        "Preparing {}x{} image for {}x{} slot",
        img.width(),
        img.height(),
        width,
        height
    );

    // 等比縮放到覆蓋目標框，再置中裁切
    let mut fitted = img.resize_to_fill(width, height, FilterType::Lanczos3).to_rgba8();
    let mask = rounded_rect_mask(width, height, corner_radius);
    for (px, m) in fitted.pixels_mut().zip(mask.pixels()) {
        px[3] = m[0];
    }
    Ok(fitted)
}

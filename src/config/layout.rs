use crate::domain::model::{ShadowStyle, SlotBox};
use crate::utils::error::{BotError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};

pub const LEFT_SLOT: SlotBox = SlotBox::new(91, 239, 455, 619);
pub const RIGHT_SLOT: SlotBox = SlotBox::new(503, 239, 867, 619);
pub const CORNER_RADIUS: u32 = 12;
pub const BORDER_WIDTH: u32 = 2;

/// Placement and styling of the two photo slots on the template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageLayout {
    pub left: SlotBox,
    pub right: SlotBox,
    pub corner_radius: u32,
    pub border_width: u32,
    pub border_color: [u8; 4],
    pub shadow: ShadowStyle,
}

impl Default for CollageLayout {
    fn default() -> Self {
        Self {
            left: LEFT_SLOT,
            right: RIGHT_SLOT,
            corner_radius: CORNER_RADIUS,
            border_width: BORDER_WIDTH,
            border_color: [255, 255, 255, 255],
            shadow: ShadowStyle::default(),
        }
    }
}

impl CollageLayout {
    /// Shared size of both slots.
    pub fn slot_size(&self) -> (u32, u32) {
        self.left.size()
    }

    /// Slots in drawing order.
    pub fn slots(&self) -> [SlotBox; 2] {
        [self.left, self.right]
    }

    /// Smallest template that holds both slots.
    pub fn required_template_size(&self) -> (u32, u32) {
        (
            self.left.x1.max(self.right.x1),
            self.left.y1.max(self.right.y1),
        )
    }
}

impl Validate for CollageLayout {
    fn validate(&self) -> Result<()> {
        let (w, h) = self.slot_size();
        if w == 0 || h == 0 {
            return Err(BotError::InvalidConfigValueError {
                field: "layout.left".to_string(),
                value: format!("{:?}", self.left),
                reason: "Slot must be at least 1x1 pixels".to_string(),
            });
        }
        if self.left.size() != self.right.size() {
            return Err(BotError::InvalidConfigValueError {
                field: "layout.right".to_string(),
                value: format!("{:?}", self.right),
                reason: format!(
                    "Both slots must have the same size, left is {}x{}",
                    w, h
                ),
            });
        }
        if self.left.overlaps(&self.right) {
            return Err(BotError::InvalidConfigValueError {
                field: "layout".to_string(),
                value: format!("{:?} / {:?}", self.left, self.right),
                reason: "Slots must not overlap".to_string(),
            });
        }
        if self.shadow.offset_y > h {
            return Err(BotError::InvalidConfigValueError {
                field: "layout.shadow.offset_y".to_string(),
                value: self.shadow.offset_y.to_string(),
                reason: format!("Shadow offset must not exceed the slot height ({})", h),
            });
        }
        if !(self.shadow.blur_sigma.is_finite() && self.shadow.blur_sigma >= 0.0) {
            return Err(BotError::InvalidConfigValueError {
                field: "layout.shadow.blur_sigma".to_string(),
                value: self.shadow.blur_sigma.to_string(),
                reason: "Blur sigma must be a non-negative number".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = CollageLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.slot_size(), (364, 380));
        assert_eq!(layout.required_template_size(), (867, 619));
    }

    #[test]
    fn test_unequal_slots_are_rejected() {
        let layout = CollageLayout {
            right: SlotBox::new(503, 239, 865, 619),
            ..CollageLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_overlapping_slots_are_rejected() {
        let layout = CollageLayout {
            right: SlotBox::new(100, 239, 464, 619),
            ..CollageLayout::default()
        };
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_shadow_offset_beyond_slot_is_rejected() {
        let mut layout = CollageLayout::default();
        layout.shadow.offset_y = u32::MAX;
        assert!(layout.validate().is_err());
        layout.shadow.offset_y = 380;
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_override_keeps_defaults() {
        let layout: CollageLayout = toml::from_str("corner_radius = 20").unwrap();
        assert_eq!(layout.corner_radius, 20);
        assert_eq!(layout.left, LEFT_SLOT);
        assert_eq!(layout.shadow, ShadowStyle::default());
    }
}

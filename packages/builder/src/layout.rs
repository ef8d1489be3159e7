//! # Section Layout Schema
//!
//! Structured presentation settings for a homepage section.
//!
//! Layouts are versioned so stored records written by an older builder can be
//! recognised. Every layout is validated before it is accepted by an update
//! mutation and again before it is persisted.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Maximum number of columns any breakpoint may use
pub const MAX_COLUMNS: u8 = 6;

/// Maximum padding/gap in pixels
pub const MAX_SPACING: u16 = 256;

/// Maximum fixed image height in pixels
pub const MAX_IMAGE_HEIGHT: u16 = 1024;

/// Layout schema version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVersion {
    #[default]
    V1,
}

/// Presentation settings for a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLayout {
    pub version: LayoutVersion,
    pub columns: Columns,
    pub spacing: Spacing,
    pub card_size: CardSize,
    pub image: ImageSettings,
    pub colors: Palette,
}

/// Column count per breakpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub mobile: u8,
    pub tablet: u8,
    pub desktop: u8,
}

/// Vertical padding and inter-card gap, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub padding_top: u16,
    pub padding_bottom: u16,
    pub gap: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    Square,
    #[default]
    Landscape,
    Portrait,
    Wide,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    pub aspect: AspectRatio,
    /// Fixed height in pixels (0 = natural height)
    pub height: u16,
}

/// Optional colour overrides (CSS hex colours)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{breakpoint} columns must be between 1 and {max}, got {value}")]
    Columns {
        breakpoint: &'static str,
        value: u8,
        max: u8,
    },

    #[error("{field} must be at most {max}px, got {value}")]
    Spacing {
        field: &'static str,
        value: u16,
        max: u16,
    },

    #[error("image height must be at most {max}px, got {value}")]
    ImageHeight { value: u16, max: u16 },

    #[error("{field} is not a hex colour: {value:?}")]
    Color { field: &'static str, value: String },
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            mobile: 1,
            tablet: 2,
            desktop: 4,
        }
    }
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            padding_top: 32,
            padding_bottom: 32,
            gap: 16,
        }
    }
}

impl Default for SectionLayout {
    fn default() -> Self {
        Self {
            version: LayoutVersion::V1,
            columns: Columns::default(),
            spacing: Spacing::default(),
            card_size: CardSize::default(),
            image: ImageSettings::default(),
            colors: Palette::default(),
        }
    }
}

impl SectionLayout {
    /// Check every field against the schema, reporting the first violation
    pub fn validate(&self) -> Result<(), LayoutError> {
        for (breakpoint, value) in [
            ("mobile", self.columns.mobile),
            ("tablet", self.columns.tablet),
            ("desktop", self.columns.desktop),
        ] {
            if value == 0 || value > MAX_COLUMNS {
                return Err(LayoutError::Columns {
                    breakpoint,
                    value,
                    max: MAX_COLUMNS,
                });
            }
        }

        for (field, value) in [
            ("padding_top", self.spacing.padding_top),
            ("padding_bottom", self.spacing.padding_bottom),
            ("gap", self.spacing.gap),
        ] {
            if value > MAX_SPACING {
                return Err(LayoutError::Spacing {
                    field,
                    value,
                    max: MAX_SPACING,
                });
            }
        }

        if self.image.height > MAX_IMAGE_HEIGHT {
            return Err(LayoutError::ImageHeight {
                value: self.image.height,
                max: MAX_IMAGE_HEIGHT,
            });
        }

        for (field, value) in [
            ("background", &self.colors.background),
            ("text", &self.colors.text),
            ("accent", &self.colors.accent),
        ] {
            if let Some(color) = value {
                if !is_hex_color(color) {
                    return Err(LayoutError::Color {
                        field,
                        value: color.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Field-wise layout change carried by a section patch.
///
/// Only the fields present are written; everything else keeps the value the
/// section already has. A colour set to `null` removes that override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnsPatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<SpacingPatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_size: Option<CardSize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImagePatch>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<PalettePatch>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tablet: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpacingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<u16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect: Option<AspectRatio>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u16>,
}

/// `Some(None)` (an explicit `null`) clears a colour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PalettePatch {
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub background: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub text: Option<Option<String>>,
    #[serde(deserialize_with = "explicit_null", skip_serializing_if = "Option::is_none")]
    pub accent: Option<Option<String>>,
}

impl LayoutPatch {
    /// Write the present fields into `layout`
    pub fn apply_to(&self, layout: &mut SectionLayout) {
        if let Some(columns) = &self.columns {
            set(&mut layout.columns.mobile, columns.mobile);
            set(&mut layout.columns.tablet, columns.tablet);
            set(&mut layout.columns.desktop, columns.desktop);
        }
        if let Some(spacing) = &self.spacing {
            set(&mut layout.spacing.padding_top, spacing.padding_top);
            set(&mut layout.spacing.padding_bottom, spacing.padding_bottom);
            set(&mut layout.spacing.gap, spacing.gap);
        }
        set(&mut layout.card_size, self.card_size);
        if let Some(image) = &self.image {
            set(&mut layout.image.aspect, image.aspect);
            set(&mut layout.image.height, image.height);
        }
        if let Some(colors) = &self.colors {
            set(&mut layout.colors.background, colors.background.clone());
            set(&mut layout.colors.text, colors.text.clone());
            set(&mut layout.colors.accent, colors.accent.clone());
        }
    }

    /// `base` with this patch applied
    pub fn merged(&self, base: &SectionLayout) -> SectionLayout {
        let mut layout = base.clone();
        self.apply_to(&mut layout);
        layout
    }
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Deserialize a present value, including `null`, as `Some`
pub(crate) fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// `#rgb` or `#rrggbb`
fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

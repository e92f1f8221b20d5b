//! Watermark settings supplied by the caller.
//!
//! A `WatermarkSettings` value is a snapshot: the compositors only ever
//! borrow it for the duration of a single render, so a concurrent change
//! to the user's stored preferences cannot affect a render in flight.

use crate::error::WatermarkError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_text() -> String {
    "Watermark".to_string()
}

fn default_font_size() -> u32 {
    36
}

fn default_opacity() -> u8 {
    128
}

fn default_color() -> String {
    "white".to_string()
}

fn default_font_family() -> String {
    "arial".to_string()
}

/// Anchor of the watermark on the media.
///
/// Parsing is total: names that are not recognised map to `BottomRight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Position {
    /// Parse a position name, falling back to `BottomRight`. Names match
    /// exactly: no trimming, no case folding.
    pub fn from_name(name: &str) -> Self {
        match name {
            "top_left" => Position::TopLeft,
            "top_right" => Position::TopRight,
            "bottom_left" => Position::BottomLeft,
            "bottom_right" => Position::BottomRight,
            "center" => Position::Center,
            _ => Position::BottomRight,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top_left",
            Position::TopRight => "top_right",
            Position::BottomLeft => "bottom_left",
            Position::BottomRight => "bottom_right",
            Position::Center => "center",
        }
    }
}

impl From<String> for Position {
    fn from(name: String) -> Self {
        Position::from_name(&name)
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user watermark preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Text rendered verbatim (default: "Watermark")
    #[serde(default = "default_text")]
    pub text: String,

    /// Glyph height in pixels (default: 36)
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// 0 = fully transparent, 255 = fully opaque (default: 128)
    #[serde(default = "default_opacity")]
    pub opacity: u8,

    /// Anchor position (default: bottom_right)
    #[serde(default)]
    pub position: Position,

    /// Color name, resolved case-insensitively at render time (default: white)
    #[serde(default = "default_color")]
    pub color: String,

    /// Font family hint handed to the font provider (default: arial)
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            text: default_text(),
            font_size: default_font_size(),
            opacity: default_opacity(),
            position: Position::default(),
            color: default_color(),
            font_family: default_font_family(),
        }
    }
}

impl WatermarkSettings {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    /// Opacity as a rounded percentage, the way it is shown to users.
    pub fn opacity_percent(&self) -> u8 {
        ((self.opacity as u32 * 100 + 127) / 255) as u8
    }

    /// Check the invariants every render relies on.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.text.is_empty() {
            return Err(WatermarkError::InvalidSettings(
                "watermark text cannot be empty".to_string(),
            ));
        }
        if self.font_size == 0 {
            return Err(WatermarkError::InvalidSettings(
                "font size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

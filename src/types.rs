//! Shared value types passed between the validator, layout engine and
//! overlay builder.
//!
//! Everything here is request-scoped and immutable once constructed. The
//! types serialize to JSON so `simple-caption plan --json` can dump an
//! overlay description as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal text anchor for every line of a caption.
///
/// The names match SVG `text-anchor` values, so the overlay can pass them
/// straight through to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Start,
    Middle,
    End,
}

impl Alignment {
    pub const ALL: [Alignment; 3] = [Alignment::Start, Alignment::Middle, Alignment::End];

    /// Canonical request token (and SVG `text-anchor` value).
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Start => "start",
            Alignment::Middle => "middle",
            Alignment::End => "end",
        }
    }

    /// Parse a canonical token. Legacy spellings are handled by the validator.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == token)
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named font size bucket. The pixel size for each bucket lives in
/// [`FontSizeTable`](crate::config::FontSizeTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontSizeToken {
    SmallExtra,
    Small,
    Medium,
    Large,
    LargeExtra,
}

impl FontSizeToken {
    pub const ALL: [FontSizeToken; 5] = [
        FontSizeToken::SmallExtra,
        FontSizeToken::Small,
        FontSizeToken::Medium,
        FontSizeToken::Large,
        FontSizeToken::LargeExtra,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FontSizeToken::SmallExtra => "small_extra",
            FontSizeToken::Small => "small",
            FontSizeToken::Medium => "medium",
            FontSizeToken::Large => "large",
            FontSizeToken::LargeExtra => "large_extra",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == token)
    }
}

impl fmt::Display for FontSizeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named color resolved against the configured color table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    /// Token the caller asked for (e.g. `"black"`).
    pub name: String,
    /// Concrete value handed to the rasterizer (e.g. `"#000000"`).
    pub value: String,
}

/// Validated style for one caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub alignment: Alignment,
    pub font_size: FontSizeToken,
    pub font_size_px: u32,
    pub color: Color,
}

/// Pixel dimensions of the source image, probed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for ImageBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

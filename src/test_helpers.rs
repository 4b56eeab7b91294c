//! Shared test utilities.
//!
//! Provides in-memory image fixtures and a shortcut for planning a caption
//! with the stock configuration.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = png_bytes(600, 400);
//! let plan = plan_for(600, 400, "Hello", "small_extra");
//! assert_eq!(plan.overlay.canvas_width, 600);
//! ```

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::caption::{CaptionPlan, CaptionRequest, Captioner};
use crate::config::CaptionConfig;
use crate::types::ImageBounds;

/// Solid light-gray PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// Solid light-gray JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([220, 220, 220]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Write a PNG fixture, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, png_bytes(width, height)).unwrap();
}

/// Plan a caption with the stock configuration. Panics on caption errors.
pub fn plan_for(width: u32, height: u32, text: &str, font_size: &str) -> CaptionPlan {
    Captioner::new(CaptionConfig::default())
        .unwrap()
        .plan(
            ImageBounds::new(width, height),
            &CaptionRequest::new(text).font_size(font_size),
        )
        .unwrap()
}

//! Declarative overlay description.
//!
//! [`build`] turns a [`LineLayout`] into an [`OverlayDescription`]: canvas
//! size, one text run per line and the style to draw them with. It holds no
//! image bytes and makes no assumption about how it will be rasterized.
//!
//! [`OverlayDescription::to_svg`] serializes the overlay to SVG for the resvg
//! backend. Lines are anchored at the horizontal center of the canvas and
//! the alignment becomes the `text-anchor`.
//!
//! Caption text is made safe for markup in two places. `build` drops
//! characters XML cannot carry at all. The SVG is generated with maud, which
//! escapes every interpolated value. This holds whatever content policy the
//! validator was configured with.

use crate::layout::LineLayout;
use crate::types::{ImageBounds, StyleOptions};
use maud::html;
use serde::Serialize;

/// Horizontal anchor of every run, as a percentage of canvas width.
const ANCHOR_X_PERCENT: f64 = 50.0;

/// One line of caption text at its vertical center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub vertical_offset: f64,
}

/// Everything a rasterizer needs to draw the caption, and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayDescription {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub anchor_x_percent: f64,
    pub line_height: f64,
    pub lines: Vec<TextRun>,
    pub style: StyleOptions,
}

/// Assemble the overlay for a validated style and a computed layout.
pub fn build(bounds: ImageBounds, style: &StyleOptions, layout: &LineLayout) -> OverlayDescription {
    OverlayDescription {
        canvas_width: bounds.width,
        canvas_height: bounds.height,
        anchor_x_percent: ANCHOR_X_PERCENT,
        line_height: layout.line_height,
        lines: layout
            .lines
            .iter()
            .map(|line| TextRun {
                text: neutralize(&line.text),
                vertical_offset: line.vertical_offset,
            })
            .collect(),
        style: style.clone(),
    }
}

/// Replace characters that XML 1.0 cannot represent, and line breaks that
/// would split a run, with spaces.
fn neutralize(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            c if (c as u32) < 0x20 => ' ',
            '\u{FFFE}' | '\u{FFFF}' => ' ',
            c => c,
        })
        .collect()
}

impl OverlayDescription {
    /// Serialize to a standalone SVG document the size of the canvas.
    pub fn to_svg(&self, font_family: &str) -> String {
        let x = format!("{}%", self.anchor_x_percent);
        let view_box = format!("0 0 {} {}", self.canvas_width, self.canvas_height);
        html! {
            svg xmlns="http://www.w3.org/2000/svg"
                width=(self.canvas_width)
                height=(self.canvas_height)
                viewBox=(view_box) {
                text font-family=(font_family)
                    font-size=(self.style.font_size_px)
                    fill=(self.style.color.value)
                    text-anchor=(self.style.alignment.as_str())
                    dominant-baseline="middle" {
                    @for run in &self.lines {
                        tspan x=(x) y=(coordinate(run.vertical_offset)) { (run.text) }
                    }
                }
            }
        }
        .into_string()
    }
}

/// Shortest decimal form (`380`, not `380.0`).
fn coordinate(value: f64) -> String {
    value.to_string()
}

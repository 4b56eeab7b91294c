//! Caption layout.
//!
//! There is no font measurement here. Every glyph is assumed to be
//! `font_size_px * glyph_width_factor` wide and every line
//! `font_size_px * line_spacing` tall. From that:
//!
//! ```text
//! max_chars_per_line = floor(width  / glyph_width)
//! max_lines          = floor(height / line_height)
//! max_length         = max_chars_per_line * max_lines
//! ```
//!
//! The caption is greedily word-wrapped to `max_chars_per_line` and the
//! resulting block is centered vertically. Offsets are the vertical centers
//! of the lines, so the first one is `(height - block_height) / 2 + line_height / 2`.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::LayoutConfig;
use crate::error::CaptionError;
use crate::types::ImageBounds;
use serde::{Deserialize, Serialize};

/// Slack applied before flooring so exact multiples survive float rounding.
const FLOOR_EPSILON: f64 = 1e-9;

/// Geometry derived from image bounds and font size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetrics {
    pub glyph_width: f64,
    pub max_chars_per_line: usize,
    pub line_height: f64,
    pub max_lines: usize,
}

impl LayoutMetrics {
    /// Compute the wrap geometry for a font size.
    ///
    /// Fails with `LayoutInfeasible` when not even one character or one line
    /// fits the image.
    pub fn compute(
        bounds: ImageBounds,
        font_size_px: u32,
        config: &LayoutConfig,
    ) -> Result<Self, CaptionError> {
        let font_size = font_size_px as f64;
        let glyph_width = font_size * config.glyph_width_factor;
        let line_height = font_size * config.line_spacing;
        let max_chars_per_line = fit_count(bounds.width, glyph_width);
        let max_lines = fit_count(bounds.height, line_height);

        if max_chars_per_line == 0 {
            return Err(CaptionError::LayoutInfeasible {
                font_size_px,
                reason: format!(
                    "a {}px wide image cannot hold a single {:.1}px glyph",
                    bounds.width, glyph_width
                ),
            });
        }
        if max_lines == 0 {
            return Err(CaptionError::LayoutInfeasible {
                font_size_px,
                reason: format!(
                    "a {}px tall image cannot hold a single {:.1}px line",
                    bounds.height, line_height
                ),
            });
        }

        Ok(Self {
            glyph_width,
            max_chars_per_line,
            line_height,
            max_lines,
        })
    }

    /// Longest caption (in characters) the geometry can hold.
    pub fn max_length(&self) -> usize {
        self.max_chars_per_line.saturating_mul(self.max_lines)
    }
}

fn fit_count(extent: u32, unit: f64) -> usize {
    if !(unit.is_finite() && unit > 0.0) {
        return 0;
    }
    (extent as f64 / unit + FLOOR_EPSILON).floor() as usize
}

/// One wrapped line and the vertical center it is drawn at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    pub text: String,
    pub vertical_offset: f64,
}

/// Wrapped, vertically centered caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineLayout {
    /// Lines top to bottom, offsets strictly increasing.
    pub lines: Vec<LayoutLine>,
    pub line_height: f64,
}

impl LineLayout {
    pub fn block_height(&self) -> f64 {
        self.lines.len() as f64 * self.line_height
    }
}

/// Greedy word wrap.
///
/// Words are whitespace separated and re-joined with single spaces. Explicit
/// newlines force a break, and blank paragraphs are dropped. A word longer than
/// `max_chars` is never split: it gets a line of its own.
pub fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current.is_empty() {
                current.push_str(word);
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Vertical center of the first line of a centered block.
pub fn start_offset(image_height: u32, line_count: usize, line_height: f64) -> f64 {
    let block_height = line_count as f64 * line_height;
    (image_height as f64 - block_height) / 2.0 + line_height / 2.0
}

/// Wrap and vertically center `text` inside `bounds`.
///
/// Fails with `LayoutInfeasible` when the geometry is degenerate or the wrap
/// needs more lines than fit. Word breaks can waste space, so a caption within
/// [`LayoutMetrics::max_length`] can still need too many lines.
pub fn layout(
    bounds: ImageBounds,
    font_size_px: u32,
    text: &str,
    config: &LayoutConfig,
) -> Result<LineLayout, CaptionError> {
    let metrics = LayoutMetrics::compute(bounds, font_size_px, config)?;
    layout_with_metrics(bounds, &metrics, font_size_px, text)
}

/// [`layout`] for callers that already computed the metrics.
pub fn layout_with_metrics(
    bounds: ImageBounds,
    metrics: &LayoutMetrics,
    font_size_px: u32,
    text: &str,
) -> Result<LineLayout, CaptionError> {
    let wrapped = wrap_words(text, metrics.max_chars_per_line);
    if wrapped.len() > metrics.max_lines {
        return Err(CaptionError::LayoutInfeasible {
            font_size_px,
            reason: format!(
                "the caption wraps to {} lines but only {} fit a {}px tall image",
                wrapped.len(),
                metrics.max_lines,
                bounds.height
            ),
        });
    }

    let first = start_offset(bounds.height, wrapped.len(), metrics.line_height);
    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(index, text)| LayoutLine {
            text,
            vertical_offset: first + index as f64 * metrics.line_height,
        })
        .collect();

    Ok(LineLayout {
        lines,
        line_height: metrics.line_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> LayoutConfig {
        LayoutConfig::default()
    }

    fn texts(layout: &LineLayout) -> Vec<&str> {
        layout.lines.iter().map(|l| l.text.as_str()).collect()
    }

    // =========================================================================
    // LayoutMetrics
    // =========================================================================

    #[test]
    fn metrics_small_font_on_square_image() {
        // 200px * 0.6 = 120px glyphs, 200px * 1.2 = 240px lines
        let m = LayoutMetrics::compute(ImageBounds::new(1000, 1000), 200, &calibration()).unwrap();
        assert_eq!(m.max_chars_per_line, 8);
        assert_eq!(m.line_height, 240.0);
        assert_eq!(m.max_lines, 4);
        assert_eq!(m.max_length(), 32);
    }

    #[test]
    fn metrics_exact_multiple_is_not_lost_to_rounding() {
        // 1200 / (200 * 0.6) is exactly 10
        let m = LayoutMetrics::compute(ImageBounds::new(1200, 480), 200, &calibration()).unwrap();
        assert_eq!(m.max_chars_per_line, 10);
        assert_eq!(m.max_lines, 2);
    }

    #[test]
    fn metrics_too_narrow_is_infeasible() {
        // 300px * 0.6 = 180px glyph on a 100px image
        let err = LayoutMetrics::compute(ImageBounds::new(100, 1000), 300, &calibration())
            .unwrap_err();
        assert!(matches!(
            err,
            CaptionError::LayoutInfeasible {
                font_size_px: 300,
                ..
            }
        ));
    }

    #[test]
    fn metrics_too_short_is_infeasible() {
        let err =
            LayoutMetrics::compute(ImageBounds::new(1000, 100), 200, &calibration()).unwrap_err();
        assert!(matches!(err, CaptionError::LayoutInfeasible { .. }));
    }

    #[test]
    fn metrics_zero_bounds_are_infeasible() {
        assert!(LayoutMetrics::compute(ImageBounds::new(0, 0), 150, &calibration()).is_err());
    }

    #[test]
    fn max_length_saturates_for_tiny_factors() {
        let config = LayoutConfig {
            glyph_width_factor: 1e-300,
            line_spacing: 1e-300,
            ..calibration()
        };
        let m = LayoutMetrics::compute(ImageBounds::new(1000, 1000), 200, &config).unwrap();
        assert_eq!(m.max_chars_per_line, usize::MAX);
        assert_eq!(m.max_length(), usize::MAX);
    }

    #[test]
    fn max_length_never_grows_with_font_size() {
        let bounds = ImageBounds::new(1920, 1080);
        let mut previous = usize::MAX;
        for px in (10..=600).step_by(10) {
            let max_length = LayoutMetrics::compute(bounds, px, &calibration())
                .map(|m| m.max_length())
                .unwrap_or(0);
            assert!(max_length <= previous, "max_length grew at {px}px");
            previous = max_length;
        }
    }

    // =========================================================================
    // wrap_words
    // =========================================================================

    #[test]
    fn wrap_breaks_between_words() {
        assert_eq!(wrap_words("Hello world", 8), vec!["Hello", "world"]);
        assert_eq!(wrap_words("Hello world", 11), vec!["Hello world"]);
    }

    #[test]
    fn wrap_packs_greedily() {
        assert_eq!(
            wrap_words("a bb ccc dddd eeeee", 8),
            vec!["a bb ccc", "dddd", "eeeee"]
        );
    }

    #[test]
    fn wrap_long_word_gets_own_line() {
        assert_eq!(wrap_words("Sweet treats", 4), vec!["Sweet", "treats"]);
        assert_eq!(
            wrap_words("a extraordinarily b", 5),
            vec!["a", "extraordinarily", "b"]
        );
    }

    #[test]
    fn wrap_collapses_whitespace() {
        assert_eq!(wrap_words("  one\t two   three ", 20), vec!["one two three"]);
    }

    #[test]
    fn wrap_honors_newlines_and_drops_blank_paragraphs() {
        assert_eq!(
            wrap_words("Fresh cookies\n\nfrom the oven", 40),
            vec!["Fresh cookies", "from the oven"]
        );
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        assert_eq!(wrap_words("éé éé", 5), vec!["éé éé"]);
    }

    #[test]
    fn wrap_lines_respect_width_unless_single_word() {
        let text = "The quick brown fox jumps over the lazy dog while an unreasonably \
                    longwindedword sits in the middle of it";
        for width in 1..30 {
            for line in wrap_words(text, width) {
                let len = line.chars().count();
                assert!(
                    len <= width || !line.contains(' '),
                    "line {line:?} exceeds {width}"
                );
            }
        }
    }

    // =========================================================================
    // layout
    // =========================================================================

    #[test]
    fn layout_two_lines_centered() {
        let layout = layout(
            ImageBounds::new(1000, 1000),
            200,
            "Hello world",
            &calibration(),
        )
        .unwrap();
        assert_eq!(texts(&layout), vec!["Hello", "world"]);
        assert_eq!(layout.line_height, 240.0);
        assert_eq!(layout.lines[0].vertical_offset, 380.0);
        assert_eq!(layout.lines[1].vertical_offset, 620.0);
    }

    #[test]
    fn layout_more_lines_than_fit_is_infeasible() {
        // 4 chars per line, one 360px line fits in 400px, "Sweet treats" needs two
        let err = layout(
            ImageBounds::new(800, 400),
            300,
            "Sweet treats",
            &calibration(),
        )
        .unwrap_err();
        match err {
            CaptionError::LayoutInfeasible {
                font_size_px,
                reason,
            } => {
                assert_eq!(font_size_px, 300);
                assert!(reason.contains("2 lines"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn layout_is_idempotent() {
        let bounds = ImageBounds::new(1600, 900);
        let text = "Sweet treats: homemade cookies fresh from the oven";
        let a = layout(bounds, 150, text, &calibration()).unwrap();
        let b = layout(bounds, 150, text, &calibration()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn layout_block_is_centered() {
        let bounds = ImageBounds::new(1600, 900);
        for text in ["One", "Two words here", "Sweet treats homemade cookies fresh"] {
            let layout = layout(bounds, 150, text, &calibration()).unwrap();
            let first = layout.lines.first().unwrap().vertical_offset;
            let last = layout.lines.last().unwrap().vertical_offset;
            let center = (first + last) / 2.0;
            assert!((center - 450.0).abs() < 1e-6, "block center {center}");
        }
    }

    #[test]
    fn layout_offsets_increase_and_stay_in_bounds() {
        let bounds = ImageBounds::new(1200, 1200);
        let layout = layout(
            bounds,
            150,
            "a few words that wrap onto several lines of text",
            &calibration(),
        )
        .unwrap();
        assert!(layout.lines.len() > 1);
        for pair in layout.lines.windows(2) {
            assert!(pair[1].vertical_offset > pair[0].vertical_offset);
        }
        let top = layout.lines[0].vertical_offset - layout.line_height / 2.0;
        assert!(top >= 0.0);
        assert!(layout.block_height() <= 1200.0);
    }

    #[test]
    fn start_offset_single_line_is_image_center() {
        assert_eq!(start_offset(400, 1, 360.0), 200.0);
    }
}

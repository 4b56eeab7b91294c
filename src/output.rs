//! CLI output formatting.
//!
//! # Plan
//!
//! ```text
//! Canvas 1000x1000
//!     Style: small (200px), middle, black
//!     Glyph width: 120px
//!     Wrap: 8 chars x 4 lines (max 32)
//! 001 Hello
//!     y: 380
//! 002 world
//!     y: 620
//! ```
//!
//! # Render
//!
//! ```text
//! cookie.jpg → processed-cookie.png (2 lines)
//! cake.jpg: failed: Text is too long: 40 characters, at most 32 fit
//!
//! Rendered 1 image, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::caption::CaptionPlan;
use crate::imaging::{BatchEvent, BatchSummary};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a pixel value without a trailing `.0`.
fn px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    rounded.to_string()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Plan output
// ============================================================================

/// Format a caption plan: canvas and metrics first, then one entry per line.
pub fn format_plan(plan: &CaptionPlan) -> Vec<String> {
    let overlay = &plan.overlay;
    let style = &overlay.style;
    let metrics = &plan.metrics;

    let mut lines = vec![
        format!("Canvas {}x{}", overlay.canvas_width, overlay.canvas_height),
        format!(
            "{}Style: {} ({}px), {}, {}",
            indent(1),
            style.font_size,
            style.font_size_px,
            style.alignment,
            style.color.name
        ),
        format!("{}Glyph width: {}px", indent(1), px(metrics.glyph_width)),
        format!(
            "{}Wrap: {} chars x {} lines (max {})",
            indent(1),
            metrics.max_chars_per_line,
            metrics.max_lines,
            plan.max_length
        ),
    ];

    for (i, run) in overlay.lines.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), run.text));
        lines.push(format!("{}y: {}", indent(1), px(run.vertical_offset)));
    }
    lines
}

pub fn print_plan(plan: &CaptionPlan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Render output
// ============================================================================

/// Format a single batch progress event as one display line.
pub fn format_batch_event(event: &BatchEvent) -> String {
    match event {
        BatchEvent::Rendered {
            source,
            output,
            lines,
        } => format!(
            "{} → {} ({})",
            file_name(source),
            file_name(output),
            plural(*lines, "line")
        ),
        BatchEvent::Failed { source, error } => {
            format!("{}: failed: {}", file_name(source), error)
        }
    }
}

/// Format the closing summary of a batch.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut line = format!("Rendered {}", plural(summary.rendered.len(), "image"));
    if !summary.failed.is_empty() {
        line.push_str(&format!(", {} failed", summary.failed.len()));
    }
    vec![String::new(), line]
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

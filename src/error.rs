//! Errors returned by the caption core.
//!
//! Every failure is a value. The core never logs and never retries: the
//! same input always produces the same error, so the caller has to change
//! the input (shorter text, smaller font, another token) to recover.
//!
//! [`CaptionError::report`] turns an error into the structured
//! `{ kind, message, details }` shape that the HTTP and CLI layers print.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptionError {
    #[error("Invalid text alignment '{value}'. Valid inputs = {{start, middle, end}}")]
    InvalidAlignment { value: String },
    #[error(
        "Invalid font size '{value}'. Valid inputs = {{small_extra, small, medium, large, large_extra}}"
    )]
    InvalidFontSize { value: String },
    #[error("Invalid color '{value}'")]
    InvalidColor { value: String },
    #[error("Text contains unsupported characters: {found}")]
    UnsupportedCharacters { found: String },
    #[error("Text is empty")]
    EmptyCaption,
    #[error("Text is too long: {length} characters, at most {max_length} fit")]
    TextTooLong { length: usize, max_length: usize },
    #[error("Caption does not fit at {font_size_px}px: {reason}")]
    LayoutInfeasible { font_size_px: u32, reason: String },
}

/// Stable, serializable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    InvalidAlignment,
    InvalidFontSize,
    InvalidColor,
    UnsupportedCharacters,
    EmptyCaption,
    TextTooLong,
    LayoutInfeasible,
}

/// Error shape handed to the outer layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl CaptionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptionError::InvalidAlignment { .. } => ErrorKind::InvalidAlignment,
            CaptionError::InvalidFontSize { .. } => ErrorKind::InvalidFontSize,
            CaptionError::InvalidColor { .. } => ErrorKind::InvalidColor,
            CaptionError::UnsupportedCharacters { .. } => ErrorKind::UnsupportedCharacters,
            CaptionError::EmptyCaption => ErrorKind::EmptyCaption,
            CaptionError::TextTooLong { .. } => ErrorKind::TextTooLong,
            CaptionError::LayoutInfeasible { .. } => ErrorKind::LayoutInfeasible,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let details = match self {
            CaptionError::InvalidAlignment { value }
            | CaptionError::InvalidFontSize { value }
            | CaptionError::InvalidColor { value } => Some(json!({ "value": value })),
            CaptionError::UnsupportedCharacters { found } => Some(json!({ "found": found })),
            CaptionError::EmptyCaption => None,
            CaptionError::TextTooLong { length, max_length } => {
                Some(json!({ "length": length, "max_length": max_length }))
            }
            CaptionError::LayoutInfeasible { font_size_px, .. } => {
                Some(json!({ "font_size_px": font_size_px }))
            }
        };
        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            details,
        }
    }
}

//! Multipart upload normalization.
//!
//! Clients send the style fields under several historical names
//! (`textAlignment`, `textalign`, `alignment`, ...). Everything is folded
//! into one [`UploadForm`] and then into a canonical [`CaptionRequest`].

use crate::caption::CaptionRequest;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormField {
    File,
    Text,
    Alignment,
    FontSize,
    Color,
}

/// Map a multipart field name to the field it carries. Names compare
/// case-insensitively; unknown names are ignored by the caller.
pub(crate) fn classify(name: &str) -> Option<FormField> {
    match name.to_ascii_lowercase().as_str() {
        "file" => Some(FormField::File),
        "text" => Some(FormField::Text),
        "textalignment" | "textalign" | "alignment" => Some(FormField::Alignment),
        "fontsize" => Some(FormField::FontSize),
        "color" => Some(FormField::Color),
        _ => None,
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum FormError {
    #[error("missing image file")]
    MissingFile,
    #[error("missing caption text")]
    MissingText,
}

/// Raw upload as collected from the multipart stream.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub(crate) file: Option<Vec<u8>>,
    pub(crate) text: Option<String>,
    pub(crate) alignment: Option<String>,
    pub(crate) font_size: Option<String>,
    pub(crate) color: Option<String>,
}

impl UploadForm {
    /// Store a text field. Later values for the same field win. Blank style
    /// tokens count as absent so the configured defaults apply.
    pub(crate) fn set_text(&mut self, field: FormField, value: String) {
        match field {
            FormField::File => self.file = Some(value.into_bytes()),
            FormField::Text => self.text = Some(value),
            FormField::Alignment => self.alignment = style_token(&value),
            FormField::FontSize => self.font_size = style_token(&value),
            FormField::Color => self.color = style_token(&value),
        }
    }

    pub(crate) fn into_request(self) -> Result<(Vec<u8>, CaptionRequest), FormError> {
        let file = self
            .file
            .filter(|bytes| !bytes.is_empty())
            .ok_or(FormError::MissingFile)?;
        let text = self.text.ok_or(FormError::MissingText)?;
        Ok((
            file,
            CaptionRequest {
                text,
                alignment: self.alignment,
                font_size: self.font_size,
                color: self.color,
            },
        ))
    }
}

fn style_token(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

//! The caption pipeline: request → validated style → layout → overlay.
//!
//! [`Captioner`] owns the configuration and the compiled content policy and
//! is the single entry point the HTTP server and the CLI call. It is pure:
//! it never touches image bytes, never logs and holds no mutable state, so
//! one instance is shared freely across threads.
//!
//! ```text
//! CaptionRequest ──validate──▶ StyleOptions ──layout──▶ LineLayout ──build──▶ OverlayDescription
//!                 alignment      + ImageBounds            wrap + center         runs + style
//!                 font size
//!                 color
//!                 content
//!                 length
//! ```

use crate::config::{CaptionConfig, ConfigError};
use crate::error::CaptionError;
use crate::layout::{LayoutMetrics, layout_with_metrics};
use crate::overlay::{self, OverlayDescription};
use crate::types::{ImageBounds, StyleOptions};
use crate::validate::{
    ContentPolicy, validate_alignment, validate_caption_content, validate_caption_length,
    validate_color, validate_font_size,
};
use serde::{Deserialize, Serialize};

/// Canonical caption request. Transport adapters (multipart form, CLI flags)
/// normalize into this shape. Missing tokens take the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionRequest {
    pub text: String,
    #[serde(default)]
    pub alignment: Option<String>,
    #[serde(default)]
    pub font_size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl CaptionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn alignment(mut self, token: impl Into<String>) -> Self {
        self.alignment = Some(token.into());
        self
    }

    pub fn font_size(mut self, token: impl Into<String>) -> Self {
        self.font_size = Some(token.into());
        self
    }

    pub fn color(mut self, token: impl Into<String>) -> Self {
        self.color = Some(token.into());
        self
    }
}

/// Result of planning one caption.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionPlan {
    pub metrics: LayoutMetrics,
    /// Caption length limit that was enforced (derived or fixed).
    pub max_length: usize,
    pub overlay: OverlayDescription,
}

/// Configured caption core.
#[derive(Debug, Clone)]
pub struct Captioner {
    config: CaptionConfig,
    policy: ContentPolicy,
}

impl Captioner {
    pub fn new(config: CaptionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let policy = ContentPolicy::from_config(&config.validation)?;
        Ok(Self { config, policy })
    }

    pub fn config(&self) -> &CaptionConfig {
        &self.config
    }

    /// Validate alignment, font size and color, in that order.
    pub fn resolve_style(&self, request: &CaptionRequest) -> Result<StyleOptions, CaptionError> {
        let defaults = &self.config.defaults;
        let alignment = validate_alignment(
            request.alignment.as_deref().unwrap_or(&defaults.alignment),
            self.config.validation.accept_alignment_aliases,
        )?;
        let (font_size, font_size_px) = validate_font_size(
            request.font_size.as_deref().unwrap_or(&defaults.font_size),
            &self.config.font_sizes,
        )?;
        let color = validate_color(
            request.color.as_deref().unwrap_or(&defaults.color),
            &self.config.colors,
        )?;
        Ok(StyleOptions {
            alignment,
            font_size,
            font_size_px,
            color,
        })
    }

    /// Validate the request against `bounds` and lay the caption out.
    pub fn plan(
        &self,
        bounds: ImageBounds,
        request: &CaptionRequest,
    ) -> Result<CaptionPlan, CaptionError> {
        let style = self.resolve_style(request)?;
        let text = validate_caption_content(&request.text, &self.policy)?;

        let (metrics, max_length) = match self.config.layout.fixed_max_length {
            Some(cap) => {
                validate_caption_length(text, cap)?;
                let metrics =
                    LayoutMetrics::compute(bounds, style.font_size_px, &self.config.layout)?;
                (metrics, cap)
            }
            None => {
                let metrics =
                    LayoutMetrics::compute(bounds, style.font_size_px, &self.config.layout)?;
                let max_length = metrics.max_length();
                validate_caption_length(text, max_length)?;
                (metrics, max_length)
            }
        };

        let layout = layout_with_metrics(bounds, &metrics, style.font_size_px, text)?;
        Ok(CaptionPlan {
            metrics,
            max_length,
            overlay: overlay::build(bounds, &style, &layout),
        })
    }
}

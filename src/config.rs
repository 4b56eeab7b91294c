//! Caption configuration.
//!
//! Handles loading, validating and merging `caption.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! The lookup tables (font size token → pixels, color name → value) and the
//! layout calibration constants are plain config rather than module-level
//! constants, so tests and deployments can swap them out.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [font_sizes]              # Pixel size per font size token
//! small_extra = 150
//! small = 200
//! medium = 300
//! large = 400
//! large_extra = 500
//!
//! [colors]                  # Named colors accepted in requests
//! black = "#000000"
//! white = "#ffffff"
//!
//! [layout]
//! glyph_width_factor = 0.6  # Average glyph width as a fraction of font size
//! line_spacing = 1.2        # Line height as a multiple of font size
//! # fixed_max_length = 100  # Fixed caption cap instead of the geometry-derived one
//!
//! [validation]
//! punctuation = ".,!?-"     # Punctuation allowed besides word chars and whitespace
//! unicode_words = false     # Accept non-ASCII letters and digits
//! reject_pictographic = true
//! accept_alignment_aliases = false  # Accept left/center/right
//!
//! [defaults]                # Used when a request omits a token
//! alignment = "middle"
//! font_size = "medium"
//! color = "black"
//!
//! [render]
//! font_family = "Arial, sans-serif"
//! # font_file = "fonts/Lobster-Regular.ttf"
//! output_format = "png"
//! jpeg_quality = 90
//!
//! [server]
//! bind = "0.0.0.0:8080"
//! max_upload_bytes = 10485760
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::OutputFormat;
use crate::types::{Alignment, FontSizeToken};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Caption configuration loaded from `caption.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionConfig {
    /// Pixel size for each font size token.
    pub font_sizes: FontSizeTable,
    /// Named colors accepted in requests, mapped to concrete values.
    pub colors: BTreeMap<String, String>,
    /// Glyph-width model and length-cap strategy.
    pub layout: LayoutConfig,
    /// Caption content policy.
    pub validation: ValidationConfig,
    /// Tokens applied when a request leaves one out.
    pub defaults: RequestDefaults,
    /// Rasterizer settings (fonts, output encoding).
    pub render: RenderConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_sizes: FontSizeTable::default(),
            colors: default_colors(),
            layout: LayoutConfig::default(),
            validation: ValidationConfig::default(),
            defaults: RequestDefaults::default(),
            render: RenderConfig::default(),
            server: ServerConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_colors() -> BTreeMap<String, String> {
    [
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("gray", "#808080"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

impl CaptionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for token in FontSizeToken::ALL {
            if self.font_sizes.px(token) == 0 {
                return Err(ConfigError::Validation(format!(
                    "font_sizes.{} must be greater than 0",
                    token
                )));
            }
        }
        if !(self.layout.glyph_width_factor.is_finite() && self.layout.glyph_width_factor > 0.0) {
            return Err(ConfigError::Validation(
                "layout.glyph_width_factor must be a positive number".into(),
            ));
        }
        if !(self.layout.line_spacing.is_finite() && self.layout.line_spacing > 0.0) {
            return Err(ConfigError::Validation(
                "layout.line_spacing must be a positive number".into(),
            ));
        }
        if self.layout.fixed_max_length == Some(0) {
            return Err(ConfigError::Validation(
                "layout.fixed_max_length must be greater than 0".into(),
            ));
        }
        if self.colors.is_empty() {
            return Err(ConfigError::Validation("colors must not be empty".into()));
        }
        if !self.colors.contains_key(&self.defaults.color) {
            return Err(ConfigError::Validation(format!(
                "defaults.color '{}' is not defined in [colors]",
                self.defaults.color
            )));
        }
        if Alignment::from_token(&self.defaults.alignment).is_none() {
            return Err(ConfigError::Validation(
                "defaults.alignment must be one of start, middle, end".into(),
            ));
        }
        if FontSizeToken::from_token(&self.defaults.font_size).is_none() {
            return Err(ConfigError::Validation(
                "defaults.font_size must be one of small_extra, small, medium, large, large_extra"
                    .into(),
            ));
        }
        if self.render.jpeg_quality == 0 || self.render.jpeg_quality > 100 {
            return Err(ConfigError::Validation(
                "render.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.max_upload_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Font size token → pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontSizeTable {
    pub small_extra: u32,
    pub small: u32,
    pub medium: u32,
    pub large: u32,
    pub large_extra: u32,
}

impl FontSizeTable {
    pub fn px(&self, token: FontSizeToken) -> u32 {
        match token {
            FontSizeToken::SmallExtra => self.small_extra,
            FontSizeToken::Small => self.small,
            FontSizeToken::Medium => self.medium,
            FontSizeToken::Large => self.large,
            FontSizeToken::LargeExtra => self.large_extra,
        }
    }
}

impl Default for FontSizeTable {
    fn default() -> Self {
        Self {
            small_extra: 150,
            small: 200,
            medium: 300,
            large: 400,
            large_extra: 500,
        }
    }
}

/// Calibration of the average-glyph-width layout model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Average glyph width as a fraction of the font size.
    pub glyph_width_factor: f64,
    /// Line height as a multiple of the font size.
    pub line_spacing: f64,
    /// When set, captions are capped at this many characters instead of the
    /// cap derived from image geometry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_max_length: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            glyph_width_factor: 0.6,
            line_spacing: 1.2,
            fixed_max_length: None,
        }
    }
}

/// Caption content policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Punctuation accepted besides word characters and whitespace.
    pub punctuation: String,
    /// Accept any Unicode letter or digit as a word character, not only ASCII.
    pub unicode_words: bool,
    /// Reject emoji and other pictographic characters.
    pub reject_pictographic: bool,
    /// Accept `left`/`center`/`right` as spellings of `start`/`middle`/`end`.
    pub accept_alignment_aliases: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            punctuation: ".,!?-".to_string(),
            unicode_words: false,
            reject_pictographic: true,
            accept_alignment_aliases: false,
        }
    }
}

/// Tokens applied when a request omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestDefaults {
    pub alignment: String,
    pub font_size: String,
    pub color: String,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            alignment: "middle".to_string(),
            font_size: "medium".to_string(),
            color: "black".to_string(),
        }
    }
}

/// Rasterizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// CSS-style font family list written into the overlay markup.
    pub font_family: String,
    /// Extra font file loaded next to the system fonts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_file: Option<PathBuf>,
    /// Encoding of the rendered image.
    pub output_format: OutputFormat,
    /// JPEG quality (1-100), only used when `output_format = "jpeg"`.
    pub jpeg_quality: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_file: None,
            output_format: OutputFormat::Png,
            jpeg_quality: 90,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    /// Upper bound for a multipart upload body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(CaptionConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CaptionConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CaptionConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<CaptionConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `caption.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# simple-caption configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Font sizes
# ---------------------------------------------------------------------------
# Pixel size for each font size token accepted in requests.
[font_sizes]
small_extra = 150
small = 200
medium = 300
large = 400
large_extra = 500

# ---------------------------------------------------------------------------
# Colors
# ---------------------------------------------------------------------------
# Named colors accepted in requests. Add entries to extend the table.
[colors]
black = "#000000"
blue = "#0000ff"
gray = "#808080"
green = "#008000"
red = "#ff0000"
white = "#ffffff"
yellow = "#ffff00"

# ---------------------------------------------------------------------------
# Layout
# ---------------------------------------------------------------------------
[layout]
# Average glyph width as a fraction of the font size. There is no real font
# measurement; 0.6 is close for common sans-serif faces.
glyph_width_factor = 0.6

# Line height as a multiple of the font size.
line_spacing = 1.2

# Cap captions at a fixed character count instead of deriving the cap from
# image size and font size.
# fixed_max_length = 100

# ---------------------------------------------------------------------------
# Validation
# ---------------------------------------------------------------------------
[validation]
# Punctuation accepted besides word characters and whitespace.
punctuation = ".,!?-"

# Accept any Unicode letter or digit, not only ASCII.
unicode_words = false

# Reject emoji and other pictographic characters.
reject_pictographic = true

# Accept left/center/right as spellings of start/middle/end.
accept_alignment_aliases = false

# ---------------------------------------------------------------------------
# Request defaults
# ---------------------------------------------------------------------------
[defaults]
alignment = "middle"
font_size = "medium"
color = "black"

# ---------------------------------------------------------------------------
# Rendering
# ---------------------------------------------------------------------------
[render]
font_family = "Arial, sans-serif"

# Font file loaded in addition to the system fonts.
# font_file = "fonts/Lobster-Regular.ttf"

# "png" or "jpeg".
output_format = "png"
jpeg_quality = 90

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
bind = "0.0.0.0:8080"
max_upload_bytes = 10485760

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers for batch rendering.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_font_sizes() {
        let config = CaptionConfig::default();
        assert_eq!(config.font_sizes.px(FontSizeToken::SmallExtra), 150);
        assert_eq!(config.font_sizes.px(FontSizeToken::Small), 200);
        assert_eq!(config.font_sizes.px(FontSizeToken::Medium), 300);
        assert_eq!(config.font_sizes.px(FontSizeToken::Large), 400);
        assert_eq!(config.font_sizes.px(FontSizeToken::LargeExtra), 500);
    }

    #[test]
    fn default_layout_calibration() {
        let config = CaptionConfig::default();
        assert_eq!(config.layout.glyph_width_factor, 0.6);
        assert_eq!(config.layout.line_spacing, 1.2);
        assert_eq!(config.layout.fixed_max_length, None);
    }

    #[test]
    fn default_colors_include_black() {
        let config = CaptionConfig::default();
        assert_eq!(config.colors.get("black").map(String::as_str), Some("#000000"));
        assert_eq!(config.defaults.color, "black");
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[font_sizes]
medium = 250
"#;
        let config: CaptionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.font_sizes.medium, 250);
        // Defaults preserved
        assert_eq!(config.font_sizes.large, 400);
        assert_eq!(config.validation.punctuation, ".,!?-");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("caption.toml")).unwrap();
        assert_eq!(config, CaptionConfig::default());
    }

    #[test]
    fn load_config_merges_colors_with_stock_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caption.toml");
        fs::write(
            &path,
            r##"
[colors]
orange = "#ffa500"
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.colors.get("orange").map(String::as_str), Some("#ffa500"));
        // Stock entries survive the merge
        assert!(config.colors.contains_key("black"));
    }

    #[test]
    fn load_config_fixed_cap_variant() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caption.toml");
        fs::write(
            &path,
            r#"
[layout]
fixed_max_length = 100
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.layout.fixed_max_length, Some(100));
        assert_eq!(config.layout.glyph_width_factor, 0.6);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caption.toml");
        fs::write(&path, "this is not [valid toml").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caption.toml");
        fs::write(
            &path,
            r#"
[layout]
line_spacin = 1.5
"#,
        )
        .unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = r#"
[fonts]
size = 3
"#;
        let result: Result<CaptionConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1").unwrap();
        let overlay: toml::Value = toml::from_str("a = 2").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn merge_toml_preserves_base_keys() {
        let base: toml::Value = toml::from_str(
            r#"
[t]
a = 1
b = 2
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[t]
b = 3
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let table = merged.get("t").unwrap();
        assert_eq!(table.get("a").unwrap().as_integer(), Some(1));
        assert_eq!(table.get("b").unwrap().as_integer(), Some(3));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(CaptionConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_font_size() {
        let mut config = CaptionConfig::default();
        config.font_sizes.large = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("font_sizes.large"));
    }

    #[test]
    fn validate_non_positive_factors() {
        let mut config = CaptionConfig::default();
        config.layout.glyph_width_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = CaptionConfig::default();
        config.layout.line_spacing = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_default_color_must_exist() {
        let mut config = CaptionConfig::default();
        config.defaults.color = "mauve".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mauve"));
    }

    #[test]
    fn validate_default_tokens() {
        let mut config = CaptionConfig::default();
        config.defaults.alignment = "center".into();
        assert!(config.validate().is_err());

        let mut config = CaptionConfig::default();
        config.defaults.font_size = "huge".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_fixed_cap_zero() {
        let mut config = CaptionConfig::default();
        config.layout.fixed_max_length = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("caption.toml");
        fs::write(
            &path,
            r#"
[render]
jpeg_quality = 200
"#,
        )
        .unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // Processing
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: CaptionConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, CaptionConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value().unwrap();
        for section in [
            "font_sizes",
            "colors",
            "layout",
            "validation",
            "defaults",
            "render",
            "server",
            "processing",
        ] {
            assert!(value.get(section).is_some(), "missing [{section}]");
        }
    }
}

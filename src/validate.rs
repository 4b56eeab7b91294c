//! Request validation.
//!
//! Every validator is a pure function of its input and the injected tables.
//! [`Captioner::plan`](crate::caption::Captioner::plan) runs them in a fixed
//! order: alignment, font size, color, content, then length. Length comes last
//! because its limit depends on the layout geometry.
//!
//! The content policy is compiled once from [`ValidationConfig`] into a
//! [`ContentPolicy`] so per-request validation does no regex compilation.

use crate::config::{ConfigError, FontSizeTable, ValidationConfig};
use crate::error::CaptionError;
use crate::types::{Alignment, Color, FontSizeToken};
use regex::Regex;
use std::collections::BTreeMap;

/// Legacy alignment spellings seen in older clients.
const ALIGNMENT_ALIASES: &[(&str, Alignment)] = &[
    ("left", Alignment::Start),
    ("center", Alignment::Middle),
    ("centre", Alignment::Middle),
    ("right", Alignment::End),
];

/// Compiled caption content policy.
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    /// Matches any single character outside the allow-set.
    disallowed: Regex,
    reject_pictographic: bool,
}

impl ContentPolicy {
    pub fn from_config(config: &ValidationConfig) -> Result<Self, ConfigError> {
        let word = if config.unicode_words {
            r"\w"
        } else {
            "A-Za-z0-9_"
        };
        // Emoji sequences also need joiners, variation selectors and skin tones.
        let pictographic = if config.reject_pictographic {
            ""
        } else {
            r"\p{Extended_Pictographic}\p{Emoji_Modifier}\u{200D}\u{FE0F}"
        };
        let pattern = format!(
            r"[^{word}\s{punct}{pictographic}]",
            punct = regex::escape(&config.punctuation)
        );
        let disallowed = Regex::new(&pattern).map_err(|e| {
            ConfigError::Validation(format!("validation.punctuation is unusable: {e}"))
        })?;
        Ok(Self {
            disallowed,
            reject_pictographic: config.reject_pictographic,
        })
    }

    pub fn rejects_pictographic(&self) -> bool {
        self.reject_pictographic
    }

    /// Distinct characters outside the allow-set, in order of appearance.
    fn offending(&self, text: &str) -> Vec<char> {
        let mut found: Vec<char> = Vec::new();
        for m in self.disallowed.find_iter(text) {
            for ch in m.as_str().chars() {
                if !found.contains(&ch) {
                    found.push(ch);
                }
            }
        }
        found
    }
}

/// Accept a canonical alignment token, or a legacy alias when enabled.
pub fn validate_alignment(value: &str, accept_aliases: bool) -> Result<Alignment, CaptionError> {
    if let Some(alignment) = Alignment::from_token(value) {
        return Ok(alignment);
    }
    if accept_aliases
        && let Some((_, alignment)) = ALIGNMENT_ALIASES.iter().find(|(alias, _)| *alias == value)
    {
        return Ok(*alignment);
    }
    Err(CaptionError::InvalidAlignment {
        value: value.to_string(),
    })
}

/// Resolve a font size token to its pixel size.
pub fn validate_font_size(
    value: &str,
    table: &FontSizeTable,
) -> Result<(FontSizeToken, u32), CaptionError> {
    FontSizeToken::from_token(value)
        .map(|token| (token, table.px(token)))
        .ok_or_else(|| CaptionError::InvalidFontSize {
            value: value.to_string(),
        })
}

/// Resolve a color name against the configured color table.
pub fn validate_color(value: &str, colors: &BTreeMap<String, String>) -> Result<Color, CaptionError> {
    colors
        .get(value)
        .map(|resolved| Color {
            name: value.to_string(),
            value: resolved.clone(),
        })
        .ok_or_else(|| CaptionError::InvalidColor {
            value: value.to_string(),
        })
}

/// Check caption text against the content policy.
pub fn validate_caption_content<'t>(
    text: &'t str,
    policy: &ContentPolicy,
) -> Result<&'t str, CaptionError> {
    if text.trim().is_empty() {
        return Err(CaptionError::EmptyCaption);
    }
    let offending = policy.offending(text);
    if !offending.is_empty() {
        return Err(CaptionError::UnsupportedCharacters {
            found: offending.into_iter().collect(),
        });
    }
    Ok(text)
}

/// Check caption length (in characters) against `max_length`.
pub fn validate_caption_length(text: &str, max_length: usize) -> Result<&str, CaptionError> {
    let length = text.chars().count();
    if length > max_length {
        return Err(CaptionError::TextTooLong { length, max_length });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptionConfig;

    fn strict_policy() -> ContentPolicy {
        ContentPolicy::from_config(&ValidationConfig::default()).unwrap()
    }

    // =========================================================================
    // Alignment
    // =========================================================================

    #[test]
    fn alignment_accepts_canonical_tokens() {
        assert_eq!(validate_alignment("start", false), Ok(Alignment::Start));
        assert_eq!(validate_alignment("middle", false), Ok(Alignment::Middle));
        assert_eq!(validate_alignment("end", false), Ok(Alignment::End));
    }

    #[test]
    fn alignment_center_rejected_in_strict_mode() {
        assert_eq!(
            validate_alignment("center", false),
            Err(CaptionError::InvalidAlignment {
                value: "center".into()
            })
        );
    }

    #[test]
    fn alignment_aliases_when_enabled() {
        assert_eq!(validate_alignment("center", true), Ok(Alignment::Middle));
        assert_eq!(validate_alignment("left", true), Ok(Alignment::Start));
        assert_eq!(validate_alignment("right", true), Ok(Alignment::End));
        assert!(validate_alignment("justify", true).is_err());
    }

    #[test]
    fn alignment_is_case_sensitive() {
        assert!(validate_alignment("Middle", false).is_err());
    }

    // =========================================================================
    // Font size
    // =========================================================================

    #[test]
    fn font_size_uses_injected_table() {
        let mut table = FontSizeTable::default();
        assert_eq!(
            validate_font_size("medium", &table),
            Ok((FontSizeToken::Medium, 300))
        );

        table.medium = 250;
        assert_eq!(
            validate_font_size("medium", &table),
            Ok((FontSizeToken::Medium, 250))
        );
    }

    #[test]
    fn font_size_unknown_token() {
        let err = validate_font_size("huge", &FontSizeTable::default()).unwrap_err();
        assert_eq!(
            err,
            CaptionError::InvalidFontSize {
                value: "huge".into()
            }
        );
    }

    // =========================================================================
    // Color
    // =========================================================================

    #[test]
    fn color_resolves_named_value() {
        let colors = CaptionConfig::default().colors;
        let color = validate_color("black", &colors).unwrap();
        assert_eq!(color.name, "black");
        assert_eq!(color.value, "#000000");
    }

    #[test]
    fn color_unknown_name() {
        let colors = CaptionConfig::default().colors;
        assert!(matches!(
            validate_color("chartreuse", &colors),
            Err(CaptionError::InvalidColor { .. })
        ));
    }

    // =========================================================================
    // Content
    // =========================================================================

    #[test]
    fn content_accepts_words_whitespace_and_punctuation() {
        let policy = strict_policy();
        let text = "Sweet treats, fresh-baked!\nReady? Yes.";
        assert_eq!(validate_caption_content(text, &policy), Ok(text));
    }

    #[test]
    fn content_rejects_markup_characters() {
        let err = validate_caption_content("a <b> & c", &strict_policy()).unwrap_err();
        assert_eq!(
            err,
            CaptionError::UnsupportedCharacters {
                found: "<>&".into()
            }
        );
    }

    #[test]
    fn content_rejects_pictographic_in_strict_mode() {
        let policy = strict_policy();
        assert!(policy.rejects_pictographic());
        let err = validate_caption_content("Cookies \u{1F36A}", &policy).unwrap_err();
        assert_eq!(
            err,
            CaptionError::UnsupportedCharacters {
                found: "\u{1F36A}".into()
            }
        );
    }

    #[test]
    fn content_allows_pictographic_when_relaxed() {
        let config = ValidationConfig {
            reject_pictographic: false,
            ..ValidationConfig::default()
        };
        let policy = ContentPolicy::from_config(&config).unwrap();
        assert!(validate_caption_content("Cookies \u{1F36A}", &policy).is_ok());
        // The rest of the allow-set still applies
        assert!(validate_caption_content("Cookies $5", &policy).is_err());
    }

    #[test]
    fn content_ascii_words_by_default() {
        assert!(validate_caption_content("Crème brûlée", &strict_policy()).is_err());

        let config = ValidationConfig {
            unicode_words: true,
            ..ValidationConfig::default()
        };
        let policy = ContentPolicy::from_config(&config).unwrap();
        assert!(validate_caption_content("Crème brûlée", &policy).is_ok());
    }

    #[test]
    fn content_custom_punctuation_is_escaped() {
        let config = ValidationConfig {
            punctuation: "]^\\-:".into(),
            ..ValidationConfig::default()
        };
        let policy = ContentPolicy::from_config(&config).unwrap();
        assert!(validate_caption_content("a]b^c\\d-e:f", &policy).is_ok());
        assert!(validate_caption_content("a.b", &policy).is_err());
    }

    #[test]
    fn content_rejects_empty_text() {
        let policy = strict_policy();
        assert_eq!(
            validate_caption_content("", &policy),
            Err(CaptionError::EmptyCaption)
        );
        assert_eq!(
            validate_caption_content("  \n ", &policy),
            Err(CaptionError::EmptyCaption)
        );
    }

    // =========================================================================
    // Length
    // =========================================================================

    #[test]
    fn length_at_limit_is_accepted() {
        assert_eq!(validate_caption_length("abcd", 4), Ok("abcd"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(validate_caption_length("éééé", 4).is_ok());
    }

    #[test]
    fn length_over_limit_reports_max() {
        assert_eq!(
            validate_caption_length("Sweet treats", 4),
            Err(CaptionError::TextTooLong {
                length: 12,
                max_length: 4
            })
        );
    }
}

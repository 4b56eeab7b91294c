//! # Simple Caption
//!
//! Word-wrapped, vertically centered caption overlays for images. A caption
//! request names the text and three style tokens (alignment, font size,
//! color). The crate validates it, wraps the text to the image width, centers
//! the block and emits a declarative overlay that a rasterizer draws on top of
//! the image.
//!
//! # Architecture: Pure Core, Thin Orchestrator
//!
//! ```text
//! 1. Validate   request  →  StyleOptions        (tokens, characters, length)
//! 2. Layout     text     →  LineLayout          (wrap + vertical centering)
//! 3. Overlay    layout   →  OverlayDescription  (text runs + style, or SVG)
//! 4. Render     overlay  →  image bytes         (resvg over the decoded source)
//! ```
//!
//! Steps 1-3 are pure functions of their inputs and the configuration, and
//! are bundled in [`caption::Captioner`]. They never decode pixels, touch the
//! filesystem or log. Step 4 lives in [`imaging`] behind the
//! [`imaging::RasterBackend`] trait, so the pipeline is unit testable with a
//! recording mock and no image fixtures.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`validate`] | Token, character and length validation |
//! | [`layout`] | Glyph-width metrics, greedy word wrap, vertical centering |
//! | [`overlay`] | Renderer-agnostic overlay description and its SVG form |
//! | [`caption`] | The validate → layout → overlay pipeline ([`caption::Captioner`]) |
//! | [`error`] | Caption error kinds and the structured error report |
//! | [`config`] | `caption.toml` loading, merging over stock defaults, validation |
//! | [`types`] | Shared value types (`Alignment`, `FontSizeToken`, `ImageBounds`, ...) |
//! | [`imaging`] | Raster backend (image + resvg), file and batch operations |
//! | [`server`] | `POST /thumbnail` multipart endpoint (axum) |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | tracing subscriber setup for the binary |
//!
//! # Design Decisions
//!
//! ## Average Glyph Width Instead of Font Metrics
//!
//! Wrapping uses a constant glyph width of `font_size_px × glyph_width_factor`
//! (stock 0.6). The layout is a function of image size, font size and text
//! only, so a plan computed by `simple-caption plan` matches what the server
//! draws, on any machine, with any installed fonts.
//!
//! ## Reject Instead of Clip
//!
//! The maximum caption length is derived from the image: characters per line
//! times lines that fit. A caption over that limit, or one whose wrap needs
//! more lines than fit, is an error. The caller picks a smaller font or
//! shorter text; the overlay never leaves the canvas.
//!
//! ## Maud for SVG
//!
//! The overlay is serialized with [Maud](https://maud.lambda.xyz/), so every
//! interpolated caption string is escaped no matter which characters the
//! content policy lets through.

pub mod caption;
pub mod config;
pub mod error;
pub mod imaging;
pub mod layout;
pub mod logging;
pub mod output;
pub mod overlay;
pub mod server;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

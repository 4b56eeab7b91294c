//! Raster backend trait and shared types.
//!
//! The caption core never touches image bytes. Everything that does lives
//! behind [`RasterBackend`]: probing the source for its pixel bounds and
//! compositing an [`OverlayDescription`] onto it.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): `image` for decoding
//! and encoding, `resvg` for drawing the overlay.

use super::params::OutputFormat;
use crate::overlay::OverlayDescription;
use crate::types::ImageBounds;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for raster backends.
///
/// Implementations must be `Sync`: one backend is shared by every HTTP
/// request and every batch worker.
pub trait RasterBackend: Sync {
    /// Pixel bounds of the encoded source image.
    fn identify(&self, source: &[u8]) -> Result<ImageBounds, BackendError>;

    /// Draw `overlay` on top of the source and encode the result.
    fn composite(
        &self,
        source: &[u8],
        overlay: &OverlayDescription,
    ) -> Result<Vec<u8>, BackendError>;

    /// Encoding produced by [`composite`](Self::composite).
    fn output_format(&self) -> OutputFormat;
}

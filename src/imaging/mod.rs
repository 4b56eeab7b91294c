//! Raster side of captioning: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Overlay** | `usvg` + `resvg` into a `tiny_skia::Pixmap` |
//! | **Composite** | `image::imageops::overlay` |
//! | **Encode** | `image` PNG / JPEG encoders |
//!
//! The module is split into:
//! - **Parameters**: output format and quality
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining the caption core + backend

pub mod backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend};
pub use operations::{
    BatchEvent, BatchSummary, RenderError, RenderedFile, RenderedImage, batch_output_paths,
    caption_batch, caption_bytes, caption_file, collect_sources,
};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use rust_backend::{RustBackend, supported_input_extensions};

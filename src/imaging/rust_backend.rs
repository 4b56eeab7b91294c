//! Pure Rust raster backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Overlay SVG → pixels | `usvg` parse + `resvg::render` into a `tiny_skia::Pixmap` |
//! | Composite | `image::imageops::overlay` (alpha blend) |
//! | Encode → PNG / JPEG | `image` encoders |
//!
//! Fonts come from the system font database plus an optional font file from
//! `[render] font_file`. When no font matches, resvg draws no text and
//! the source image passes through unchanged.

use super::backend::{BackendError, RasterBackend};
use super::params::{EncodeParams, OutputFormat, Quality};
use crate::config::RenderConfig;
use crate::overlay::OverlayDescription;
use crate::types::ImageBounds;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage};
use std::io::Cursor;
use std::sync::{Arc, LazyLock};
use tiny_skia::{Pixmap, Transform};
use usvg::{Options, Tree, fontdb};

const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using `image` and `resvg`.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    fontdb: Arc<fontdb::Database>,
    font_family: String,
    encode: EncodeParams,
}

impl RustBackend {
    /// Backend with system fonts plus the configured font file.
    pub fn new(render: &RenderConfig) -> Result<Self, BackendError> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        if let Some(path) = &render.font_file {
            db.load_font_file(path)?;
        }
        Ok(Self::with_fonts(
            db,
            &render.font_family,
            EncodeParams {
                format: render.output_format,
                quality: Quality::new(render.jpeg_quality),
            },
        ))
    }

    /// Backend with an explicit font database.
    pub fn with_fonts(db: fontdb::Database, font_family: &str, encode: EncodeParams) -> Self {
        Self {
            fontdb: Arc::new(db),
            font_family: font_family.to_string(),
            encode,
        }
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Rasterize the overlay into a straight-alpha RGBA layer of canvas size.
    fn rasterize(&self, overlay: &OverlayDescription) -> Result<RgbaImage, BackendError> {
        let svg = overlay.to_svg(&self.font_family);
        let options = Options {
            fontdb: self.fontdb.clone(),
            font_family: self.font_family.clone(),
            ..Options::default()
        };
        let tree = Tree::from_str(&svg, &options).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to parse overlay SVG: {e}"))
        })?;

        let mut pixmap = Pixmap::new(overlay.canvas_width, overlay.canvas_height).ok_or_else(
            || {
                BackendError::ProcessingFailed(format!(
                    "Failed to allocate {}x{} overlay",
                    overlay.canvas_width, overlay.canvas_height
                ))
            },
        )?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha, image expects straight alpha
        let mut layer = RgbaImage::new(overlay.canvas_width, overlay.canvas_height);
        for (dst, src) in layer.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(layer)
    }
}

fn decode(source: &[u8]) -> Result<DynamicImage, BackendError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(e.to_string()))
}

fn encode(image: DynamicImage, params: EncodeParams) -> Result<Vec<u8>, BackendError> {
    let mut bytes = Vec::new();
    match params.format {
        OutputFormat::Png => image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?,
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let quality = params.quality.value().min(100) as u8;
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            rgb.write_with_encoder(encoder).map_err(|e| {
                BackendError::ProcessingFailed(format!("JPEG encode failed: {e}"))
            })?;
        }
    }
    Ok(bytes)
}

impl RasterBackend for RustBackend {
    fn identify(&self, source: &[u8]) -> Result<ImageBounds, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(source))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(ImageBounds::new(width, height))
    }

    fn composite(
        &self,
        source: &[u8],
        overlay: &OverlayDescription,
    ) -> Result<Vec<u8>, BackendError> {
        let mut base = decode(source)?.to_rgba8();
        if base.dimensions() != (overlay.canvas_width, overlay.canvas_height) {
            return Err(BackendError::ProcessingFailed(format!(
                "overlay is {}x{} but the image is {}x{}",
                overlay.canvas_width,
                overlay.canvas_height,
                base.width(),
                base.height()
            )));
        }

        let layer = self.rasterize(overlay)?;
        image::imageops::overlay(&mut base, &layer, 0, 0);
        encode(DynamicImage::ImageRgba8(base), self.encode)
    }

    fn output_format(&self) -> OutputFormat {
        self.encode.format
    }
}

//! High-level caption operations.
//!
//! These functions combine the caption core with backend execution: probe the
//! source, plan the caption against its bounds, composite the overlay.
//!
//! Batches run in parallel on the global [rayon](https://docs.rs/rayon) pool.
//! One bad image never aborts the batch; its error is reported alongside the
//! successes.

use super::backend::{BackendError, RasterBackend};
use super::params::OutputFormat;
use super::rust_backend::supported_input_extensions;
use crate::caption::{CaptionPlan, CaptionRequest, Captioner};
use crate::error::CaptionError;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Prefix of every rendered file name.
pub const OUTPUT_PREFIX: &str = "processed-";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Caption(#[from] CaptionError),
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Result type for caption operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Encoded image with the plan that produced it.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub plan: CaptionPlan,
}

/// Caption an encoded image held in memory.
pub fn caption_bytes(
    backend: &impl RasterBackend,
    captioner: &Captioner,
    source: &[u8],
    request: &CaptionRequest,
) -> Result<RenderedImage> {
    let bounds = backend.identify(source)?;
    let plan = captioner.plan(bounds, request)?;
    let bytes = backend.composite(source, &plan.overlay)?;
    Ok(RenderedImage {
        bytes,
        format: backend.output_format(),
        plan,
    })
}

/// `<output_dir>/processed-<stem>.<ext>`
pub fn output_path(output_dir: &Path, source: &Path, format: OutputFormat) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    output_dir.join(format!("{OUTPUT_PREFIX}{stem}.{}", format.extension()))
}

/// A caption written to disk.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub plan: CaptionPlan,
}

/// Caption one file and write the result into `output_dir`.
pub fn caption_file(
    backend: &impl RasterBackend,
    captioner: &Captioner,
    source: &Path,
    output_dir: &Path,
    request: &CaptionRequest,
) -> Result<RenderedFile> {
    let output = output_path(output_dir, source, backend.output_format());
    caption_file_to(backend, captioner, source, &output, request)
}

fn caption_file_to(
    backend: &impl RasterBackend,
    captioner: &Captioner,
    source: &Path,
    output: &Path,
    request: &CaptionRequest,
) -> Result<RenderedFile> {
    if !source.is_file() {
        return Err(RenderError::SourceNotFound(source.to_path_buf()));
    }
    let bytes = std::fs::read(source)?;
    let rendered = caption_bytes(backend, captioner, &bytes, request)?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, &rendered.bytes)?;
    debug!(
        source = %source.display(),
        output = %output.display(),
        lines = rendered.plan.overlay.lines.len(),
        "caption rendered"
    );

    Ok(RenderedFile {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        plan: rendered.plan,
    })
}

/// Output path for every source, in order, with no two sources sharing one.
///
/// The first source with a given stem gets `processed-<stem>.<ext>`. Later
/// ones get `processed-<stem>-2.<ext>`, `-3` and so on, skipping names already
/// taken.
pub fn batch_output_paths(
    output_dir: &Path,
    sources: &[PathBuf],
    format: OutputFormat,
) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    sources
        .iter()
        .map(|source| {
            let mut path = output_path(output_dir, source, format);
            let mut n = 2;
            while !taken.insert(path.clone()) {
                path = output_path(output_dir, &suffixed(source, n), format);
                n += 1;
            }
            path
        })
        .collect()
}

fn suffixed(source: &Path, n: usize) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    PathBuf::from(format!("{stem}-{n}"))
}

/// Progress events emitted while a batch runs, in completion order.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Rendered {
        source: PathBuf,
        output: PathBuf,
        lines: usize,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

/// Outcome of a batch. Both lists keep input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub rendered: Vec<RenderedFile>,
    pub failed: Vec<(PathBuf, RenderError)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Caption every source with the same request.
///
/// Sources sharing a file stem get distinct outputs, see [`batch_output_paths`].
pub fn caption_batch(
    backend: &impl RasterBackend,
    captioner: &Captioner,
    sources: &[PathBuf],
    output_dir: &Path,
    request: &CaptionRequest,
    progress: Option<Sender<BatchEvent>>,
) -> BatchSummary {
    let outputs = batch_output_paths(output_dir, sources, backend.output_format());
    let results: Vec<(PathBuf, Result<RenderedFile>)> = sources
        .par_iter()
        .zip(outputs.par_iter())
        .map_with(progress, |progress, (source, output)| {
            let result = caption_file_to(backend, captioner, source, output, request);
            if let Some(tx) = progress {
                let event = match &result {
                    Ok(file) => BatchEvent::Rendered {
                        source: source.clone(),
                        output: file.output.clone(),
                        lines: file.plan.overlay.lines.len(),
                    },
                    Err(e) => BatchEvent::Failed {
                        source: source.clone(),
                        error: e.to_string(),
                    },
                };
                tx.send(event).ok();
            }
            (source.clone(), result)
        })
        .collect();

    let mut summary = BatchSummary::default();
    for (source, result) in results {
        match result {
            Ok(file) => summary.rendered.push(file),
            Err(e) => summary.failed.push((source, e)),
        }
    }
    summary
}

/// Expand CLI inputs into a sorted list of image files.
///
/// Files are taken as given. Directories are walked recursively for supported
/// image extensions, skipping hidden entries and previously rendered output.
pub fn collect_sources(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.is_file() {
            sources.push(input.clone());
        } else if input.is_dir() {
            for entry in WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            {
                let entry = entry.map_err(std::io::Error::from)?;
                let path = entry.path();
                if entry.file_type().is_file() && is_image(path) && !is_rendered_output(path) {
                    sources.push(path.to_path_buf());
                }
            }
        } else {
            return Err(RenderError::SourceNotFound(input.clone()));
        }
    }
    sources.sort();
    sources.dedup();
    Ok(sources)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

fn is_rendered_output(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with(OUTPUT_PREFIX))
}

//! Conversion of selected inventory entries to PDF.
//!
//! The pipeline never talks to an office suite directly. It hands each office
//! document to a [`Renderer`], which writes the PDF for the requested
//! selection or explains why it could not. PDF sources are only checked for
//! readability; merging reads them in place.

mod soffice;

pub use soffice::SofficeRenderer;

use lopdf::Document;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::io::{PdfReader, PdfWriter};
use crate::merge::pages::PageExtractor;
use crate::model::{ConversionStatus, DocumentKind, SourceFile};
use crate::paths::PathResolver;
use crate::selector::PageSelection;

/// One render request.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob<'a> {
    /// Source document.
    pub source: &'a Path,
    /// Kind of the source.
    pub kind: DocumentKind,
    /// Where the PDF must end up.
    pub output: &'a Path,
    /// Pages, sheets or slides to include.
    pub selection: &'a PageSelection,
}

/// Something that can turn a source document into a PDF.
///
/// Implementations must write nothing at `job.output` unless they succeed,
/// and must report selections beyond the document's extent as
/// [`PipelineError::OutOfRangeSelector`].
pub trait Renderer: Send + Sync {
    /// Render `job.source` to `job.output`.
    fn render(&self, job: &RenderJob<'_>) -> Result<()>;
}

/// Result of converting one file.
#[derive(Debug)]
pub struct FileOutcome {
    /// File name of the source.
    pub file_name: String,
    /// Source path.
    pub source: PathBuf,
    /// Written PDF, or why it failed.
    pub result: Result<PathBuf>,
}

/// Result of a conversion pass.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Inventory after the pass.
    pub files: Vec<SourceFile>,
    /// One entry per attempted file, in the order attempted.
    pub outcomes: Vec<FileOutcome>,
    /// True if the pass stopped early because it was cancelled.
    pub cancelled: bool,
}

impl ConversionReport {
    /// Number of files converted.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Outcomes that failed.
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// Convert every selected file, in display order.
///
/// Files are processed one at a time. A failure is recorded in the report and
/// the pass moves on to the next file. A converted file is marked
/// [`ConversionStatus::Converted`] and deselected. PDF sources are merged in
/// place, so they only have to load; nothing is written for them. The token
/// is checked before each file; files not reached keep their state.
pub fn convert_selected(
    files: &[SourceFile],
    resolver: &PathResolver,
    renderer: &dyn Renderer,
    cancel: &CancellationToken,
) -> ConversionReport {
    let mut report = ConversionReport {
        files: files.to_vec(),
        ..Default::default()
    };
    report.files.sort_by_key(|f| f.display_order);

    let total = report.files.iter().filter(|f| f.selected).count();
    let mut attempted = 0;

    for file in report.files.iter_mut().filter(|f| f.selected) {
        if cancel.is_cancelled() {
            warn!(remaining = total - attempted, "conversion cancelled");
            report.cancelled = true;
            break;
        }
        attempted += 1;

        let result = convert_one(file, resolver, renderer);
        match &result {
            Ok(output) => {
                file.status = ConversionStatus::Converted;
                file.selected = false;
                info!("[{attempted}/{total}] {} -> {}", file.file_name, output.display());
            }
            Err(err) => warn!("[{attempted}/{total}] {} failed: {err}", file.file_name),
        }

        report.outcomes.push(FileOutcome {
            file_name: file.file_name.clone(),
            source: file.path.clone(),
            result,
        });
    }

    report
}

fn convert_one(file: &SourceFile, resolver: &PathResolver, renderer: &dyn Renderer) -> Result<PathBuf> {
    if file.kind.is_pdf() {
        PdfReader::read(&file.path)
            .map_err(|err| PipelineError::render_failure(file.path.as_path(), err.to_string()))?;
        return Ok(file.path.clone());
    }

    let selection = PageSelection::parse(&file.page_range)?;
    let output = resolver.output_path(&file.path);
    resolver.ensure_output_directory(&file.path)?;

    renderer.render(&RenderJob {
        source: &file.path,
        kind: file.kind,
        output: &output,
        selection: &selection,
    })?;
    Ok(output)
}

/// Write the selected pages of an already rendered PDF to the job's output.
///
/// An "all" selection copies `rendered` unchanged. Renderers call this once
/// the office suite has produced its PDF.
pub fn deliver(rendered: &Path, job: &RenderJob<'_>) -> Result<()> {
    if job.selection.is_all() {
        PdfWriter::copy(rendered, job.output)?;
        return Ok(());
    }

    let mut doc = Document::load(rendered)
        .map_err(|e| PipelineError::render_failure(job.source, format!("unreadable PDF: {e}")))?;
    PageExtractor::extract_pages(&mut doc, job.selection, job.source, job.kind.unit())?;
    doc.compress();
    PdfWriter::write(&mut doc, job.output)?;
    Ok(())
}

use lopdf::{Document, ObjectId};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::pages::rebuild_page_tree;
use super::stamp::stage_page_numbers;
use crate::error::{PipelineError, Result};
use crate::io::{PdfReader, StagedOutput};

/// Summary of a finished merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatistics {
    /// Number of input documents.
    pub documents: usize,
    /// Pages in the merged output.
    pub pages: usize,
    /// Where the merged PDF was written.
    pub output: PathBuf,
    /// Whether page numbers were stamped.
    pub page_numbers: bool,
}

/// Concatenates PDFs into one document.
#[derive(Debug, Clone, Default)]
pub struct PdfAssembler {
    cancel: CancellationToken,
}

impl PdfAssembler {
    /// Create an assembler that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler that stops when `cancel` fires.
    ///
    /// The token is checked between input documents and between stamped
    /// pages.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Merge `paths` in order into `output`.
    ///
    /// With `add_page_numbers`, a second pass stamps "current / total" on
    /// every page. Each pass writes a temp file next to `output` and renames
    /// it into place, so `output` is never left half written.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::NoFilesToMerge`] for an empty input list
    /// - [`PipelineError::MergeSourceUnreadable`] if any input is missing or
    ///   cannot be parsed; nothing is written in that case
    /// - [`PipelineError::Cancelled`] if the token fires
    /// - [`PipelineError::FailedToWrite`] if the output cannot be written
    pub fn merge(&self, paths: &[PathBuf], output: &Path, add_page_numbers: bool) -> Result<MergeStatistics> {
        let mut merged = self.assemble(paths)?;
        let pages = merged.get_pages().len();

        merged.compress();
        let staged = StagedOutput::new(output);
        staged.write_document(&mut merged)?;
        staged.commit()?;
        info!(output = %output.display(), documents = paths.len(), pages, "merged PDF written");

        if add_page_numbers {
            stage_page_numbers(output, &self.cancel)?.commit()?;
            info!(output = %output.display(), "page numbers stamped");
        }

        Ok(MergeStatistics {
            documents: paths.len(),
            pages,
            output: output.to_path_buf(),
            page_numbers: add_page_numbers,
        })
    }

    /// Build the merged document in memory.
    pub fn assemble(&self, paths: &[PathBuf]) -> Result<Document> {
        if paths.is_empty() {
            return Err(PipelineError::NoFilesToMerge);
        }

        let mut merged = Document::with_version("1.5");
        let mut page_ids: Vec<ObjectId> = Vec::new();

        for (idx, path) in paths.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let loaded = PdfReader::load(path)?;
            debug!(
                "[{}/{}] {} ({} pages)",
                idx + 1,
                paths.len(),
                path.display(),
                loaded.page_count
            );
            let mut doc = loaded.document;

            // Avoid object id collisions by renumbering the incoming document
            doc.renumber_objects_with(merged.max_id + 1);
            merged.max_id = doc.max_id;

            if doc.version > merged.version {
                merged.version = doc.version.clone();
            }

            page_ids.extend(doc.get_pages().into_values());
            merged.objects.extend(doc.objects);
        }

        rebuild_page_tree(&mut merged, &page_ids)?;
        Ok(merged)
    }
}

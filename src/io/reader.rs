use lopdf::Document;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// A loaded PDF document with the path it came from.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Number of pages in the document.
    pub page_count: usize,
}

/// Loads PDF documents from disk.
pub struct PdfReader;

impl PdfReader {
    /// Load a PDF.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MergeSourceUnreadable`] if the file is missing,
    /// is a directory or cannot be parsed.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
        let path = path.as_ref();
        Self::check_path_exists(path)
            .map_err(|err| PipelineError::merge_source_unreadable(path, err.to_string()))?;

        Document::load(path)
            .map_err(|err| PipelineError::merge_source_unreadable(path, err.to_string()))
    }

    /// Load a PDF and record its page count.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<LoadedPdf> {
        let path = path.as_ref();
        let document = Self::read(path)?;
        let page_count = document.get_pages().len();
        Ok(LoadedPdf {
            document,
            path: path.to_path_buf(),
            page_count,
        })
    }

    /// Check that `path` exists and is a regular file.
    pub fn check_path_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let exists = path.try_exists()?;
        if !exists {
            return Err(PipelineError::file_not_found(path.to_path_buf()));
        }

        if path.is_dir() {
            return Err(PipelineError::not_a_file(path.to_path_buf()));
        }

        Ok(())
    }
}

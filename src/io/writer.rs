//! Staged PDF writes.
//!
//! Output is first written to `<final>.tmp` next to the final path and only
//! renamed into place by [`StagedOutput::commit`]. Dropping an uncommitted
//! stage removes the temp file, so a failure at any point before the rename
//! leaves whatever was at the final path untouched.

use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// A pending write to a final path.
#[derive(Debug)]
pub struct StagedOutput {
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl StagedOutput {
    /// Stage a write to `target`. Nothing touches the disk yet.
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        let mut temp = OsString::from(target.as_os_str());
        temp.push(".tmp");
        Self {
            temp: PathBuf::from(temp),
            target,
            committed: false,
        }
    }

    /// Where the data is written before commit.
    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// Final destination.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Serialize `doc` into the temp file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FailedToWrite`] if the directory cannot be
    /// created or the document cannot be written.
    pub fn write_document(&self, doc: &mut Document) -> Result<()> {
        self.create_parent()?;

        let file = std::fs::File::create(&self.temp).map_err(|e| self.write_error(e))?;
        let mut writer = BufWriter::new(file);

        doc.save_to(&mut writer)
            .map_err(|e| self.write_error(std::io::Error::other(e)))?;

        writer.flush().map_err(|e| self.write_error(e))?;
        Ok(())
    }

    /// Copy an existing file into the temp file.
    pub fn write_copy(&self, source: &Path) -> Result<()> {
        self.create_parent()?;
        std::fs::copy(source, &self.temp).map_err(|e| self.write_error(e))?;
        Ok(())
    }

    /// Move the temp file onto the final path, replacing any previous file.
    pub fn commit(mut self) -> Result<PathBuf> {
        std::fs::rename(&self.temp, &self.target).map_err(|source| PipelineError::FailedToWrite {
            path: self.target.clone(),
            source,
        })?;
        self.committed = true;
        debug!(path = %self.target.display(), "committed output");
        Ok(self.target.clone())
    }

    fn create_parent(&self) -> Result<()> {
        if let Some(parent) = self.target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.write_error(e))?;
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> PipelineError {
        PipelineError::FailedToWrite {
            path: self.temp.clone(),
            source,
        }
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.temp) {
            Ok(()) => debug!(path = %self.temp.display(), "discarded staged output"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.temp.display(), error = %err, "failed to discard staged output"),
        }
    }
}

/// A utility struct responsible for serializing a PDF document to a file.
pub struct PdfWriter;

impl PdfWriter {
    /// Write `doc` to `path` through a staged temp file.
    ///
    /// Missing parent directories are created.
    pub fn write<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<PathBuf> {
        let staged = StagedOutput::new(path.as_ref());
        staged.write_document(doc)?;
        staged.commit()
    }

    /// Copy `source` to `path` through a staged temp file.
    pub fn copy<P: AsRef<Path>>(source: &Path, path: P) -> Result<PathBuf> {
        let staged = StagedOutput::new(path.as_ref());
        staged.write_copy(source)?;
        staged.commit()
    }
}

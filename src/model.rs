//! Inventory data model.
//!
//! [`SourceFile`] is rebuilt by every scan; [`FileSnapshot`] is the durable
//! subset a project keeps between runs. Both implement [`KnownFile`], which
//! is all reconciliation needs from a previous inventory.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{PipelineError, Result};

/// Extensions the scanner picks up, lowercase, with the kind each maps to.
const EXTENSIONS: &[(&str, DocumentKind)] = &[
    ("xls", DocumentKind::Spreadsheet),
    ("xlsx", DocumentKind::Spreadsheet),
    ("xlsm", DocumentKind::Spreadsheet),
    ("doc", DocumentKind::WordDoc),
    ("docx", DocumentKind::WordDoc),
    ("ppt", DocumentKind::Presentation),
    ("pptx", DocumentKind::Presentation),
    ("pdf", DocumentKind::Pdf),
];

/// Broad document family, which decides the renderer and default selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// xls, xlsx, xlsm
    Spreadsheet,
    /// doc, docx
    WordDoc,
    /// ppt, pptx
    Presentation,
    /// pdf
    Pdf,
}

impl DocumentKind {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|&(_, kind)| kind)
    }

    /// Selector a freshly discovered file starts with.
    ///
    /// Workbooks default to their first sheet; everything else to all pages.
    pub fn default_selector(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "1-1",
            _ => "",
        }
    }

    /// What a selector index counts for this kind.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "sheets",
            Self::Presentation => "slides",
            Self::WordDoc | Self::Pdf => "pages",
        }
    }

    /// True for sources that already are PDFs.
    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Spreadsheet => "spreadsheet",
            Self::WordDoc => "document",
            Self::Presentation => "presentation",
            Self::Pdf => "pdf",
        };
        f.write_str(label)
    }
}

/// Whether a converted PDF exists for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    /// Output PDF exists (always the case for PDF sources).
    Converted,
    /// No output PDF yet.
    NotConverted,
}

impl fmt::Display for ConversionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converted => f.write_str("converted"),
            Self::NotConverted => f.write_str("not converted"),
        }
    }
}

/// One source document as seen by the latest scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name including extension.
    pub file_name: String,
    /// Absolute path.
    pub path: PathBuf,
    /// Document family.
    pub kind: DocumentKind,
    /// Modification time observed at scan.
    pub last_modified: SystemTime,
    /// Directory of the file relative to the scan root; empty at the top level.
    pub relative_path: PathBuf,
    /// Whether the next conversion pass includes this file.
    pub selected: bool,
    /// Page/sheet/slide selector text.
    pub page_range: String,
    /// Position in the inventory, dense from 0.
    pub display_order: usize,
    /// Whether the output PDF exists.
    pub status: ConversionStatus,
}

impl SourceFile {
    /// Durable subset of this entry.
    pub fn snapshot(&self) -> FileSnapshot {
        FileSnapshot {
            path: self.path.clone(),
            selected: self.selected,
            page_range: self.page_range.clone(),
            last_modified: self.last_modified,
            display_order: self.display_order,
        }
    }

    /// True if an output PDF exists.
    pub fn is_converted(&self) -> bool {
        self.status == ConversionStatus::Converted
    }
}

/// Persisted per-file state of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSnapshot {
    /// Absolute source path, the identity used by reconciliation.
    pub path: PathBuf,
    /// Selection flag at save time.
    pub selected: bool,
    /// Selector text at save time.
    #[serde(default)]
    pub page_range: String,
    /// Modification time observed at save time.
    pub last_modified: SystemTime,
    /// Display order at save time.
    #[serde(default)]
    pub display_order: usize,
}

/// What reconciliation reads from a previously known entry.
pub trait KnownFile {
    /// Absolute source path.
    fn path(&self) -> &Path;
    /// Modification time recorded for the entry.
    fn last_modified(&self) -> SystemTime;
    /// Selection flag.
    fn selected(&self) -> bool;
    /// Selector text.
    fn page_range(&self) -> &str;
    /// Display order.
    fn display_order(&self) -> usize;

    /// File name, used in change reports.
    fn file_name(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl KnownFile for SourceFile {
    fn path(&self) -> &Path {
        &self.path
    }
    fn last_modified(&self) -> SystemTime {
        self.last_modified
    }
    fn selected(&self) -> bool {
        self.selected
    }
    fn page_range(&self) -> &str {
        &self.page_range
    }
    fn display_order(&self) -> usize {
        self.display_order
    }
    fn file_name(&self) -> String {
        self.file_name.clone()
    }
}

impl KnownFile for FileSnapshot {
    fn path(&self) -> &Path {
        &self.path
    }
    fn last_modified(&self) -> SystemTime {
        self.last_modified
    }
    fn selected(&self) -> bool {
        self.selected
    }
    fn page_range(&self) -> &str {
        &self.page_range
    }
    fn display_order(&self) -> usize {
        self.display_order
    }
}

/// Which files to select in bulk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every file.
    All,
    /// No file.
    None,
    /// Files without an output PDF.
    Remaining,
}

/// Inventory edits.
///
/// Every edit returns a new snapshot with display orders recompacted; the
/// input slice is never modified.
pub mod edit {
    use super::*;

    fn position_of(files: &[SourceFile], file_name: &str) -> Result<usize> {
        files
            .iter()
            .position(|f| f.file_name == file_name)
            .ok_or_else(|| PipelineError::UnknownFile {
                name: file_name.to_string(),
            })
    }

    /// Copy of `files` with display orders reassigned to list positions.
    pub fn compact(mut files: Vec<SourceFile>) -> Vec<SourceFile> {
        for (order, file) in files.iter_mut().enumerate() {
            file.display_order = order;
        }
        files
    }

    /// Apply a bulk selection.
    pub fn select(files: &[SourceFile], selection: Selection) -> Vec<SourceFile> {
        files
            .iter()
            .cloned()
            .map(|mut file| {
                file.selected = match selection {
                    Selection::All => true,
                    Selection::None => false,
                    Selection::Remaining => !file.is_converted(),
                };
                file
            })
            .collect()
    }

    /// Set the selection flag of one file.
    pub fn set_selected(files: &[SourceFile], file_name: &str, selected: bool) -> Result<Vec<SourceFile>> {
        let idx = position_of(files, file_name)?;
        let mut files = files.to_vec();
        files[idx].selected = selected;
        Ok(files)
    }

    /// Set the selector of one file after checking that it parses.
    pub fn set_page_range(files: &[SourceFile], file_name: &str, selector: &str) -> Result<Vec<SourceFile>> {
        crate::selector::PageSelection::parse(selector)?;
        let idx = position_of(files, file_name)?;
        let mut files = files.to_vec();
        files[idx].page_range = selector.trim().to_string();
        Ok(files)
    }

    /// Move one file to `position` (clamped to the end of the list).
    pub fn move_to(files: &[SourceFile], file_name: &str, position: usize) -> Result<Vec<SourceFile>> {
        let idx = position_of(files, file_name)?;
        let mut files = files.to_vec();
        let file = files.remove(idx);
        let position = position.min(files.len());
        files.insert(position, file);
        Ok(compact(files))
    }
}

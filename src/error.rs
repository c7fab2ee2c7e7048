//! Error types for pdfbinder.
//!
//! Errors fall into three groups, matching how far they propagate:
//!
//! - **Input errors** (malformed selectors, bad project settings) are returned
//!   immediately to the caller.
//! - **Per-file errors** (render failures, out-of-range selectors) are
//!   collected into a batch report by the conversion pass, so one bad file
//!   never stops the others.
//! - **Merge errors** abort the whole merge; no partial output is left at the
//!   final path.

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfbinder operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for pdfbinder operations.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A page/sheet/slide selector token could not be parsed.
    #[error("Invalid page range '{selector}': cannot parse '{token}'")]
    InvalidPageRange {
        /// The full selector as entered.
        selector: String,
        /// The offending token.
        token: String,
    },

    /// A selector references indices beyond the document's extent.
    #[error(
        "{}: {unit} {invalid:?} do not exist (document has {total} {unit})",
        .path.display()
    )]
    OutOfRangeSelector {
        /// Source document.
        path: PathBuf,
        /// Indices that exceed the document.
        invalid: Vec<u32>,
        /// Number of pages/sheets/slides in the document.
        total: u32,
        /// What the indices count ("pages", "sheets", "slides").
        unit: &'static str,
    },

    /// The render capability failed for a reason opaque to the pipeline.
    #[error("Failed to render {} to PDF\n  Reason: {reason}", .path.display())]
    RenderFailure {
        /// Source document.
        path: PathBuf,
        /// Reason reported by the renderer.
        reason: String,
    },

    /// A PDF listed for merging is missing or cannot be parsed.
    #[error("Cannot read merge source: {}\n  Reason: {reason}", .path.display())]
    MergeSourceUnreadable {
        /// The unreadable input.
        path: PathBuf,
        /// Why it could not be read.
        reason: String,
    },

    /// Files in the inventory have no converted PDF yet.
    #[error(
        "No PDF found for: {}\n  Hint: run 'pdfbinder convert' first",
        .files.join(", ")
    )]
    MissingMergeSources {
        /// File names without a PDF.
        files: Vec<String>,
    },

    /// Best-effort deletion of an orphaned output failed.
    #[error("Failed to remove orphaned output {}: {source}", .path.display())]
    CleanupFailure {
        /// Output that could not be removed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path that does not exist.
        path: PathBuf,
    },

    /// Path exists but is not a regular file.
    #[error("Not a file: {}", .path.display())]
    NotAFile {
        /// Offending path.
        path: PathBuf,
    },

    /// Path exists but is not a directory.
    #[error("Not a directory: {}", .path.display())]
    NotADirectory {
        /// Offending path.
        path: PathBuf,
    },

    /// No files were provided for merging.
    #[error("No input files specified for merging")]
    NoFilesToMerge,

    /// Failed to write an output file.
    #[error("Failed to write output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Unknown project reference.
    #[error("No project named or identified by '{reference}'")]
    ProjectNotFound {
        /// Name or id that did not match.
        reference: String,
    },

    /// File not present in a project's inventory.
    #[error("No file named '{name}' in the inventory")]
    UnknownFile {
        /// File name that did not match.
        name: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong.
        message: String,
    },

    /// Project store could not be read or written.
    #[error("Project store {}: {reason}", .path.display())]
    Store {
        /// Store location.
        path: PathBuf,
        /// Details.
        reason: String,
    },

    /// The operation was cancelled between two steps.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for PipelineError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl PipelineError {
    /// Create an InvalidPageRange error.
    pub fn invalid_page_range(selector: impl Into<String>, token: impl Into<String>) -> Self {
        Self::InvalidPageRange {
            selector: selector.into(),
            token: token.into(),
        }
    }

    /// Create a RenderFailure error.
    pub fn render_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RenderFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeSourceUnreadable error.
    pub fn merge_source_unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MergeSourceUnreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a Store error.
    pub fn store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if a batch may continue past this error.
    ///
    /// True for failures scoped to a single file of a conversion pass.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPageRange { .. }
                | Self::OutOfRangeSelector { .. }
                | Self::RenderFailure { .. }
                | Self::CleanupFailure { .. }
                | Self::FileNotFound { .. }
                | Self::FailedToWrite { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPageRange { .. } => 1,
            Self::OutOfRangeSelector { .. } => 1,
            Self::RenderFailure { .. } => 3,
            Self::MergeSourceUnreadable { .. } => 3,
            Self::MissingMergeSources { .. } => 4,
            Self::CleanupFailure { .. } => 5,
            Self::FileNotFound { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::NotADirectory { .. } => 2,
            Self::NoFilesToMerge => 1,
            Self::FailedToWrite { .. } => 5,
            Self::ProjectNotFound { .. } => 2,
            Self::UnknownFile { .. } => 2,
            Self::InvalidConfig { .. } => 1,
            Self::Store { .. } => 5,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}

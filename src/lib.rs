//! pdfbinder - Convert folders of Office documents to PDF and bind them.
//!
//! A project points at a folder of spreadsheets, word processing documents,
//! presentations and PDFs. The library:
//!
//! - scans the folder into an inventory of [`model::SourceFile`]s
//! - reconciles a fresh scan with the recorded inventory so selections,
//!   page selectors and ordering survive edits on disk
//! - converts selected files to PDF through a pluggable
//!   [`convert::Renderer`], keeping only the requested pages
//! - merges the converted PDFs in display order and optionally stamps
//!   "current / total" page numbers
//!
//! # Examples
//!
//! ## Scan and merge
//!
//! ```no_run
//! use pdfbinder::config::ProjectConfig;
//! use pdfbinder::merge::{PdfAssembler, merge_sources};
//! use pdfbinder::scan::scan;
//!
//! # fn example() -> pdfbinder::Result<()> {
//! let project = ProjectConfig::new("Monthly report", "/data/report");
//! let files = scan(&project.folder, &project.output_root(), project.recursive)?;
//!
//! let sources = merge_sources(&files, &project.resolver())?;
//! let output = project.merge_output_path(&chrono::Local::now());
//! let stats = PdfAssembler::new().merge(&sources, &output, true)?;
//! println!("Bound {} pages", stats.pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Page selectors
//!
//! ```
//! use pdfbinder::selector::PageSelection;
//!
//! let selection = PageSelection::parse("1-3, 5").unwrap();
//! assert_eq!(selection.pages(), vec![1, 2, 3, 5]);
//! assert!(PageSelection::parse("").unwrap().is_all());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod convert;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod output;
pub mod paths;
pub mod scan;
pub mod selector;

// Re-export commonly used types
pub use config::{ProjectConfig, ProjectStore};
pub use error::{PipelineError, Result};
pub use model::{DocumentKind, SourceFile};
pub use selector::PageSelection;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

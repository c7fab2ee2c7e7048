//! PDF assembly: merging, page extraction and page number stamping.

mod merger;
pub mod pages;
pub mod stamp;

pub use merger::{MergeStatistics, PdfAssembler};

use chrono::{DateTime, TimeZone};
use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::model::SourceFile;
use crate::paths::PathResolver;

/// PDFs to merge for an inventory, in display order.
///
/// PDF sources are used as they are; every other file contributes its
/// converted output.
///
/// # Errors
///
/// - [`PipelineError::NoFilesToMerge`] for an empty inventory
/// - [`PipelineError::MissingMergeSources`] naming every file whose PDF does
///   not exist yet
pub fn merge_sources(files: &[SourceFile], resolver: &PathResolver) -> Result<Vec<PathBuf>> {
    if files.is_empty() {
        return Err(PipelineError::NoFilesToMerge);
    }

    let mut ordered: Vec<&SourceFile> = files.iter().collect();
    ordered.sort_by_key(|f| f.display_order);

    let mut sources = Vec::with_capacity(ordered.len());
    let mut missing = Vec::new();
    for file in ordered {
        let pdf = if file.kind.is_pdf() {
            file.path.clone()
        } else {
            resolver.output_path(&file.path)
        };

        if pdf.is_file() {
            sources.push(pdf);
        } else {
            missing.push(file.file_name.clone());
        }
    }

    if !missing.is_empty() {
        return Err(PipelineError::MissingMergeSources { files: missing });
    }
    Ok(sources)
}

/// Name of a merge result: `<base>_<yyMMddHHmmss>.pdf`.
///
/// # Examples
///
/// ```
/// use chrono::{Local, TimeZone};
/// use pdfbinder::merge::merged_file_name;
///
/// let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(merged_file_name("Binder", &at), "Binder_240309140507.pdf");
/// ```
pub fn merged_file_name<Tz: TimeZone>(base: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{base}_{}.pdf", at.format("%y%m%d%H%M%S"))
}

//! Folder scanning and inventory reconciliation.
//!
//! [`scan`] builds a fresh inventory from disk; [`reconcile`] folds a fresh
//! scan into a previously recorded inventory so user choices survive.

mod inputs;
mod reconcile;

pub use inputs::expand_inputs;
pub use reconcile::{ReconcileReport, reconcile};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{PipelineError, Result};
use crate::model::{ConversionStatus, DocumentKind, SourceFile};
use crate::paths::{PathResolver, relative_path, same_location};

/// Scan `folder` for recognized documents.
///
/// Only the top level is read unless `recursive` is set. Converted outputs
/// are looked up under `output_root`, mirroring subfolders when scanning
/// recursively. A recursive scan never descends into `output_root`.
///
/// Every returned file is selected, carries its kind's default selector and
/// has a display order equal to its position. Entries are ordered by
/// relative directory, then file name.
///
/// # Errors
///
/// Returns [`PipelineError::FileNotFound`] or [`PipelineError::NotADirectory`]
/// if `folder` is not an existing directory. Unreadable entries below it are
/// skipped with a warning.
///
/// # Examples
///
/// ```no_run
/// use pdfbinder::scan::scan;
/// use std::path::Path;
///
/// # fn example() -> pdfbinder::Result<()> {
/// let files = scan(Path::new("reports"), Path::new("reports/PDF"), false)?;
/// for file in &files {
///     println!("{} {}", file.display_order, file.file_name);
/// }
/// # Ok(())
/// # }
/// ```
pub fn scan(folder: &Path, output_root: &Path, recursive: bool) -> Result<Vec<SourceFile>> {
    check_folder(folder)?;

    let resolver = PathResolver::new(folder, output_root, recursive);
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    let walker = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(max_depth)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && same_location(entry.path(), output_root)));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(kind) = DocumentKind::from_path(path) else {
            continue;
        };

        let last_modified = match entry.metadata() {
            Ok(meta) => meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping file without metadata");
                continue;
            }
        };

        files.push(classify(path, kind, last_modified, &resolver));
    }

    files.sort_by(|a, b| {
        a.relative_path
            .cmp(&b.relative_path)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    for (order, file) in files.iter_mut().enumerate() {
        file.display_order = order;
    }

    if !recursive {
        warn_on_collisions(&files, &resolver);
    }

    debug!(folder = %folder.display(), count = files.len(), recursive, "scan complete");
    Ok(files)
}

/// Build a fresh entry for one file.
pub(crate) fn classify(
    path: &Path,
    kind: DocumentKind,
    last_modified: SystemTime,
    resolver: &PathResolver,
) -> SourceFile {
    let status = if kind.is_pdf() || resolver.output_path(path).exists() {
        ConversionStatus::Converted
    } else {
        ConversionStatus::NotConverted
    };

    SourceFile {
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        kind,
        last_modified,
        relative_path: relative_path(resolver.base_folder(), path),
        selected: true,
        page_range: kind.default_selector().to_string(),
        display_order: 0,
        status,
    }
}

fn check_folder(folder: &Path) -> Result<()> {
    if !folder.try_exists()? {
        return Err(PipelineError::file_not_found(folder.to_path_buf()));
    }
    if !folder.is_dir() {
        return Err(PipelineError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }
    Ok(())
}

/// Flattened outputs of `a.docx` and `a.xlsx` share `a.pdf`.
fn warn_on_collisions(files: &[SourceFile], resolver: &PathResolver) {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for file in files.iter().filter(|f| !f.kind.is_pdf()) {
        let output = resolver.output_path(&file.path);
        if let Some(first) = seen.insert(output.clone(), &file.file_name) {
            warn!(
                output = %output.display(),
                first,
                second = %file.file_name,
                "two sources convert to the same output"
            );
        }
    }
}

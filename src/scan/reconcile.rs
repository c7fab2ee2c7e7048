use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::model::{ConversionStatus, DocumentKind, KnownFile, SourceFile, edit};
use crate::paths::PathResolver;

/// Outcome of folding a fresh scan into a previous inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Updated inventory, display orders dense from 0.
    pub files: Vec<SourceFile>,
    /// Names of files whose modification time changed.
    pub changed: Vec<String>,
    /// Names of files not present before.
    pub added: Vec<String>,
    /// Names of files that disappeared.
    pub removed: Vec<String>,
}

impl ReconcileReport {
    /// True when nothing was changed, added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.changed.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }
}

/// Rescan `folder` and carry user state over from `previous`.
///
/// Entries are matched by absolute path:
/// - unchanged files keep their selection, selector and display order;
/// - files with a different modification time are reselected, get their
///   default selector back and sort to the front;
/// - new files are selected and appended after the previous entries;
/// - vanished non-PDF files have their converted output deleted. A failed
///   deletion is logged and otherwise ignored.
///
/// The result is sorted by display order, relative directory and file name,
/// then renumbered from 0.
///
/// # Errors
///
/// Fails only if `folder` itself cannot be scanned.
pub fn reconcile<K: KnownFile>(
    folder: &Path,
    output_root: &Path,
    previous: &[K],
    recursive: bool,
) -> Result<ReconcileReport> {
    let fresh = super::scan(folder, output_root, recursive)?;
    let resolver = PathResolver::new(folder, output_root, recursive);

    let known: HashMap<&Path, &K> = previous.iter().map(|k| (k.path(), k)).collect();
    let mut report = ReconcileReport::default();

    let mut files = Vec::with_capacity(fresh.len());
    for mut file in fresh {
        match known.get(file.path.as_path()) {
            Some(old) if old.last_modified() != file.last_modified => {
                // Fresh scan already carries the defaults.
                file.display_order = 0;
                report.changed.push(file.file_name.clone());
            }
            Some(old) => {
                file.selected = old.selected();
                file.page_range = old.page_range().to_string();
                file.display_order = old.display_order();
            }
            None => {
                report.added.push(file.file_name.clone());
                file.display_order = previous.len() + report.added.len() - 1;
            }
        }
        files.push(file);
    }

    let rescanned: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();
    for old in previous.iter().filter(|k| !rescanned.contains(k.path())) {
        report.removed.push(old.file_name());
        remove_orphaned_output(old.path(), &resolver);
    }

    if !report.removed.is_empty() {
        refresh_status(&mut files, &resolver);
    }

    files.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.relative_path.cmp(&b.relative_path))
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    report.files = edit::compact(files);

    if report.is_unchanged() {
        debug!(folder = %folder.display(), "inventory unchanged");
    } else {
        info!(
            changed = report.changed.len(),
            added = report.added.len(),
            removed = report.removed.len(),
            "inventory reconciled"
        );
    }

    Ok(report)
}

/// Delete the output of a vanished source, logging instead of failing.
fn remove_orphaned_output(source: &Path, resolver: &PathResolver) {
    match DocumentKind::from_path(source) {
        Some(kind) if !kind.is_pdf() => {}
        _ => return,
    }

    let output = resolver.output_path(source);
    match std::fs::remove_file(&output) {
        Ok(()) => debug!(output = %output.display(), "removed orphaned output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            let err = PipelineError::CleanupFailure {
                path: output,
                source,
            };
            warn!("{err}");
        }
    }
}

/// Outputs shared by flattened sources may have just been deleted.
fn refresh_status(files: &mut [SourceFile], resolver: &PathResolver) {
    for file in files.iter_mut().filter(|f| !f.kind.is_pdf()) {
        file.status = if resolver.output_path(&file.path).exists() {
            ConversionStatus::Converted
        } else {
            ConversionStatus::NotConverted
        };
    }
}

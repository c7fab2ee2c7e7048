//! Output path resolution.
//!
//! Every converted file lands at `<output root>/<relative dir>/<stem>.pdf`
//! when subfolders are preserved, or `<output root>/<stem>.pdf` when they are
//! flattened. Flattening can map two sources with the same stem onto one
//! output; that collision is accepted, not detected.
//!
//! Resolution is purely lexical and never touches the disk. Directory
//! creation is the separate [`PathResolver::ensure_output_directory`] step.

use std::path::{Component, Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Lexical path from `base` to the directory containing `target`.
///
/// Returns an empty path when `target` sits directly in `base`, and `..`
/// segments when it sits outside. If the two paths do not share a root
/// (relative vs absolute, different drives), `target` is returned unchanged.
///
/// # Examples
///
/// ```
/// use pdfbinder::paths::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(Path::new("/base"), Path::new("/base/sub/dir/a.xlsx"));
/// assert_eq!(rel, PathBuf::from("sub/dir"));
/// ```
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let dir = target.parent().unwrap_or_else(|| Path::new(""));
    relative_dir(base, dir).unwrap_or_else(|| target.to_path_buf())
}

fn relative_dir(base: &Path, dir: &Path) -> Option<PathBuf> {
    let base = normalize(base);
    let dir = normalize(dir);

    let base_parts: Vec<Component<'_>> = base.components().collect();
    let dir_parts: Vec<Component<'_>> = dir.components().collect();

    if anchor(&base_parts) != anchor(&dir_parts) {
        return None;
    }

    let common = base_parts
        .iter()
        .zip(&dir_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for part in &base_parts[common..] {
        match part {
            Component::Normal(_) => rel.push(".."),
            // A base that climbs above its own start cannot be inverted.
            _ => return None,
        }
    }
    for part in &dir_parts[common..] {
        rel.push(part.as_os_str());
    }
    Some(rel)
}

/// Leading prefix/root components, which must agree for a relative path.
fn anchor<'a>(parts: &[Component<'a>]) -> Vec<Component<'a>> {
    parts
        .iter()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .copied()
        .collect()
}

/// Drop `.` and fold `..` against preceding names, without touching disk.
fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for part in path.components() {
        match part {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(part),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// True if `path` is `base` or lies below it, compared lexically.
pub(crate) fn is_within(base: &Path, path: &Path) -> bool {
    normalize(path).starts_with(normalize(base))
}

/// True if both paths name the same location, compared lexically.
pub(crate) fn same_location(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

/// Output file name for a source: its name with the extension set to `.pdf`.
pub fn output_file_name(source: &Path) -> PathBuf {
    let name = source.file_name().map(PathBuf::from).unwrap_or_default();
    name.with_extension("pdf")
}

/// Resolves where converted PDFs for one source folder are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    base_folder: PathBuf,
    output_root: PathBuf,
    preserve_subfolders: bool,
}

impl PathResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    ///
    /// * `base_folder` - Scan root the relative structure is measured from
    /// * `output_root` - Folder converted PDFs are written under
    /// * `preserve_subfolders` - Mirror the source tree under `output_root`
    pub fn new(
        base_folder: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        preserve_subfolders: bool,
    ) -> Self {
        Self {
            base_folder: base_folder.into(),
            output_root: output_root.into(),
            preserve_subfolders,
        }
    }

    /// Scan root.
    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    /// Output root.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Whether subfolder structure is mirrored.
    pub fn preserves_subfolders(&self) -> bool {
        self.preserve_subfolders
    }

    /// Directory the output for `source` goes into.
    pub fn output_dir(&self, source: &Path) -> PathBuf {
        if self.preserve_subfolders {
            self.output_root.join(relative_path(&self.base_folder, source))
        } else {
            self.output_root.clone()
        }
    }

    /// Full output path for `source`.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        self.output_dir(source).join(output_file_name(source))
    }

    /// Create the output directory for `source` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::FailedToWrite`] if the directory cannot be created.
    pub fn ensure_output_directory(&self, source: &Path) -> Result<PathBuf> {
        let dir = self.output_dir(source);
        std::fs::create_dir_all(&dir).map_err(|source| PipelineError::FailedToWrite {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

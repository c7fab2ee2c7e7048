use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Expand a list of paths and glob patterns into concrete input paths.
///
/// Matches for each pattern keep glob's sorted order, and patterns keep the
/// order they were given in. A pattern that matches nothing is passed through
/// literally so the merge reports it as missing instead of silently dropping
/// it.
pub fn expand_inputs<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();

        let paths = glob::glob(pattern).map_err(|e| {
            PipelineError::invalid_config(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        let before = resolved_paths.len();
        for entry in paths {
            let path = entry.map_err(|e| PipelineError::from(e.into_error()))?;
            resolved_paths.push(path);
        }

        if resolved_paths.len() == before {
            resolved_paths.push(PathBuf::from(pattern));
        }
    }

    Ok(resolved_paths)
}

//! Project configuration and persistence.
//!
//! A project ties a source folder to its output policy, merge settings and
//! the file snapshots recorded by the last scan. Projects are kept in one
//! pretty-printed JSON file, by default under the user's data directory.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::merge::merged_file_name;
use crate::model::{FileSnapshot, SourceFile};
use crate::paths::{PathResolver, is_within};

/// Merge output base name used when none is given.
pub const DEFAULT_MERGE_NAME: &str = "結合PDF";

/// Folder name of the derived output root, inside the source folder.
pub const DERIVED_OUTPUT_DIR: &str = "PDF";

/// Folder name merge results are written to.
pub const MERGE_DIR: &str = "mergePDF";

fn default_merge_name() -> String {
    DEFAULT_MERGE_NAME.to_string()
}

/// Where converted PDFs go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "path", rename_all = "snake_case")]
pub enum OutputPolicy {
    /// `<source folder>/PDF`.
    #[default]
    Derived,
    /// An explicit folder.
    Custom(PathBuf),
}

/// One persisted project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Stable identity.
    pub id: Uuid,
    /// Display name, unique within a store.
    pub name: String,
    /// Free-form grouping label.
    #[serde(default)]
    pub category: String,
    /// Source folder.
    pub folder: PathBuf,
    /// Output folder policy.
    #[serde(default)]
    pub output: OutputPolicy,
    /// Scan subfolders; requires a custom output folder.
    #[serde(default)]
    pub recursive: bool,
    /// Base name of merge results.
    #[serde(default = "default_merge_name")]
    pub merge_name: String,
    /// Stamp page numbers when merging.
    #[serde(default)]
    pub page_numbers: bool,
    /// Most recent merge result.
    #[serde(default)]
    pub latest_merged_pdf: Option<PathBuf>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the project was used.
    pub last_accessed_at: DateTime<Utc>,
    /// Inventory recorded by the last scan or edit.
    #[serde(default)]
    pub files: Vec<FileSnapshot>,
}

impl ProjectConfig {
    /// Create a project with default settings.
    pub fn new(name: impl Into<String>, folder: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            category: String::new(),
            folder: folder.into(),
            output: OutputPolicy::Derived,
            recursive: false,
            merge_name: default_merge_name(),
            page_numbers: false,
            latest_merged_pdf: None,
            created_at: now,
            last_accessed_at: now,
            files: Vec::new(),
        }
    }

    /// Validate the project settings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if:
    /// - the name or folder is empty
    /// - recursive scanning is enabled without a custom output folder, or with
    ///   one inside the source folder
    /// - the custom output folder is empty
    /// - the merge name is empty or contains a path separator
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::invalid_config("Project name cannot be empty"));
        }

        if self.folder.as_os_str().is_empty() {
            return Err(PipelineError::invalid_config("Source folder cannot be empty"));
        }

        match &self.output {
            OutputPolicy::Custom(path) if path.as_os_str().is_empty() => {
                return Err(PipelineError::invalid_config("Custom output folder cannot be empty"));
            }
            OutputPolicy::Derived if self.recursive => {
                return Err(PipelineError::invalid_config(
                    "Scanning subfolders requires a custom output folder",
                ));
            }
            OutputPolicy::Custom(path) if self.recursive && is_within(&self.folder, path) => {
                return Err(PipelineError::invalid_config(format!(
                    "Output folder {} must be outside the source folder when scanning subfolders",
                    path.display()
                )));
            }
            _ => {}
        }

        let merge_name = self.merge_name.trim();
        if merge_name.is_empty() || merge_name.contains(['/', '\\']) {
            return Err(PipelineError::invalid_config(format!(
                "Invalid merge file name: '{}'",
                self.merge_name
            )));
        }

        Ok(())
    }

    /// Folder converted PDFs are written under.
    pub fn output_root(&self) -> PathBuf {
        match &self.output {
            OutputPolicy::Derived => self.folder.join(DERIVED_OUTPUT_DIR),
            OutputPolicy::Custom(path) => path.clone(),
        }
    }

    /// Folder merge results are written to.
    pub fn merge_folder(&self) -> PathBuf {
        match &self.output {
            OutputPolicy::Derived => self.folder.join(MERGE_DIR),
            OutputPolicy::Custom(path) => path.join(MERGE_DIR),
        }
    }

    /// Path of a merge result created at `at`.
    pub fn merge_output_path(&self, at: &DateTime<Local>) -> PathBuf {
        self.merge_folder()
            .join(merged_file_name(self.merge_name.trim(), at))
    }

    /// Output path resolver for this project. Subfolders are mirrored when
    /// scanning recursively.
    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(&self.folder, self.output_root(), self.recursive)
    }

    /// Record an inventory.
    pub fn record_inventory(&mut self, files: &[SourceFile]) {
        self.files = files.iter().map(SourceFile::snapshot).collect();
    }

    /// Mark the project as used now.
    pub fn touch(&mut self) {
        self.last_accessed_at = Utc::now();
    }
}

/// The set of saved projects, backed by a JSON file.
#[derive(Debug)]
pub struct ProjectStore {
    path: PathBuf,
    projects: Vec<ProjectConfig>,
}

impl ProjectStore {
    /// Default store location: `<data dir>/pdfbinder/projects.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join("pdfbinder").join("projects.json"))
            .ok_or_else(|| PipelineError::invalid_config("Cannot determine the user data directory"))
    }

    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the file exists but cannot be read
    /// or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let projects = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| PipelineError::store(&path, format!("invalid JSON: {e}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(PipelineError::store(&path, err.to_string())),
        };
        debug!(path = %path.display(), "opened project store");
        Ok(Self { path, projects })
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All projects, in insertion order.
    pub fn projects(&self) -> &[ProjectConfig] {
        &self.projects
    }

    /// Find a project by id or name.
    pub fn find(&self, reference: &str) -> Result<&ProjectConfig> {
        self.position(reference).map(|idx| &self.projects[idx])
    }

    /// Add a new project.
    ///
    /// # Errors
    ///
    /// Fails if the project is invalid or its name is already taken.
    pub fn add(&mut self, project: ProjectConfig) -> Result<()> {
        project.validate()?;
        if self.projects.iter().any(|p| p.name == project.name) {
            return Err(PipelineError::invalid_config(format!(
                "A project named '{}' already exists",
                project.name
            )));
        }
        self.projects.push(project);
        Ok(())
    }

    /// Replace the stored project with the same id.
    pub fn update(&mut self, project: ProjectConfig) -> Result<()> {
        project.validate()?;
        if self
            .projects
            .iter()
            .any(|p| p.id != project.id && p.name == project.name)
        {
            return Err(PipelineError::invalid_config(format!(
                "A project named '{}' already exists",
                project.name
            )));
        }
        let idx = self.position(&project.id.to_string())?;
        self.projects[idx] = project;
        Ok(())
    }

    /// Remove a project by id or name.
    pub fn remove(&mut self, reference: &str) -> Result<ProjectConfig> {
        let idx = self.position(reference)?;
        Ok(self.projects.remove(idx))
    }

    /// Write the store through a temp file in the same directory.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let store_error = |e: &dyn std::fmt::Display| PipelineError::store(&self.path, e.to_string());

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| store_error(&e))?;

        let json = serde_json::to_string_pretty(&self.projects).map_err(|e| store_error(&e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| store_error(&e))?;
        tmp.write_all(json.as_bytes()).map_err(|e| store_error(&e))?;
        tmp.flush().map_err(|e| store_error(&e))?;
        tmp.persist(&self.path).map_err(|e| store_error(&e.error))?;

        debug!(path = %self.path.display(), projects = self.projects.len(), "saved project store");
        Ok(())
    }

    fn position(&self, reference: &str) -> Result<usize> {
        let by_id = Uuid::parse_str(reference).ok();
        self.projects
            .iter()
            .position(|p| Some(p.id) == by_id)
            .or_else(|| self.projects.iter().position(|p| p.name == reference))
            .ok_or_else(|| PipelineError::ProjectNotFound {
                reference: reference.to_string(),
            })
    }
}

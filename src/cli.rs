//! CLI argument parsing for pdfbinder.
//!
//! The command line is a thin layer over the library: every subcommand names
//! a project from the store and runs one pipeline step on it.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use pdfbinder::config::{OutputPolicy, ProjectConfig};
use pdfbinder::model::Selection;
use pdfbinder::{PipelineError, Result};

/// Convert folders of Office documents to PDF and bind them into one file.
#[derive(Parser, Debug)]
#[command(name = "pdfbinder")]
#[command(version)]
#[command(about = "Convert folders of Office documents to PDF and bind them into one file", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Project store file
    ///
    /// Defaults to projects.json in the user data directory.
    #[arg(long, global = true, value_name = "FILE", env = "PDFBINDER_STORE")]
    pub store: Option<PathBuf>,

    /// Verbose output - show project details and progress logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Scan a project's folder from scratch, discarding recorded choices
    Scan(ProjectArg),

    /// Fold changes on disk into a project's inventory
    Update(ProjectArg),

    /// Show a project's inventory
    List(ProjectArg),

    /// Change one file's selection, page selector or position
    Set(SetArgs),

    /// Select files in bulk
    Select(SelectArgs),

    /// Convert the selected files to PDF
    Convert(ConvertArgs),

    /// Merge a project's PDFs in display order
    Merge(MergeArgs),

    /// Merge arbitrary PDF files
    ///
    /// Examples:
    ///   pdfbinder join a.pdf b.pdf -o out.pdf
    ///   pdfbinder join 'chapters/*.pdf' -o book.pdf --page-numbers
    Join(JoinArgs),
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Register a folder as a new project
    Add(ProjectAddArgs),

    /// List all projects
    List,

    /// Show one project
    Show(ProjectArg),

    /// Forget a project (files on disk are left alone)
    Remove(ProjectArg),

    /// Change a project's settings
    Edit(ProjectEditArgs),
}

#[derive(Args, Debug)]
pub struct ProjectArg {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,
}

#[derive(Args, Debug)]
pub struct ProjectAddArgs {
    /// Project name
    pub name: String,

    /// Folder holding the source documents
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Free-form category label
    #[arg(long, value_name = "TEXT")]
    pub category: Option<String>,

    /// Write converted PDFs here instead of FOLDER/PDF
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Include subfolders (requires --output)
    #[arg(short, long, requires = "output")]
    pub recursive: bool,

    /// Base name of merged files
    #[arg(long, value_name = "NAME")]
    pub merge_name: Option<String>,

    /// Stamp page numbers on merged files by default
    #[arg(long)]
    pub page_numbers: bool,
}

impl ProjectAddArgs {
    /// Build the project these arguments describe.
    pub fn to_project(&self) -> Result<ProjectConfig> {
        if !self.folder.is_dir() {
            return Err(PipelineError::NotADirectory {
                path: self.folder.clone(),
            });
        }

        let mut project = ProjectConfig::new(self.name.trim(), absolute(&self.folder)?);
        if let Some(category) = &self.category {
            project.category = category.clone();
        }
        if let Some(output) = &self.output {
            project.output = OutputPolicy::Custom(absolute(output)?);
        }
        project.recursive = self.recursive;
        if let Some(merge_name) = &self.merge_name {
            project.merge_name = merge_name.clone();
        }
        project.page_numbers = self.page_numbers;

        project.validate()?;
        Ok(project)
    }
}

#[derive(Args, Debug)]
pub struct ProjectEditArgs {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// New name
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// New category label
    #[arg(long, value_name = "TEXT")]
    pub category: Option<String>,

    /// New source folder
    #[arg(long, value_name = "FOLDER")]
    pub folder: Option<PathBuf>,

    /// Write converted PDFs here
    #[arg(long, value_name = "DIR", conflicts_with = "derived_output")]
    pub output: Option<PathBuf>,

    /// Write converted PDFs to FOLDER/PDF again
    #[arg(long)]
    pub derived_output: bool,

    /// Include subfolders
    #[arg(long, value_name = "BOOL")]
    pub recursive: Option<bool>,

    /// Base name of merged files
    #[arg(long, value_name = "NAME")]
    pub merge_name: Option<String>,

    /// Stamp page numbers on merged files by default
    #[arg(long, value_name = "BOOL")]
    pub page_numbers: Option<bool>,
}

impl ProjectEditArgs {
    /// Apply the requested changes to `project` and validate the result.
    ///
    /// A new folder or output location invalidates the recorded inventory.
    pub fn apply(&self, project: &mut ProjectConfig) -> Result<()> {
        if let Some(name) = &self.name {
            project.name = name.trim().to_string();
        }
        if let Some(category) = &self.category {
            project.category = category.clone();
        }
        if let Some(folder) = &self.folder {
            if !folder.is_dir() {
                return Err(PipelineError::NotADirectory {
                    path: folder.clone(),
                });
            }
            project.folder = absolute(folder)?;
            project.files.clear();
        }
        if let Some(output) = &self.output {
            project.output = OutputPolicy::Custom(absolute(output)?);
            project.files.clear();
        } else if self.derived_output {
            project.output = OutputPolicy::Derived;
            project.files.clear();
        }
        if let Some(recursive) = self.recursive {
            if recursive != project.recursive {
                project.files.clear();
            }
            project.recursive = recursive;
        }
        if let Some(merge_name) = &self.merge_name {
            project.merge_name = merge_name.clone();
        }
        if let Some(page_numbers) = self.page_numbers {
            project.page_numbers = page_numbers;
        }

        project.validate()
    }
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// File name as shown by `list`
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Page, sheet or slide selector (e.g. "1-3,5"; empty for all)
    #[arg(long, value_name = "SELECTOR", allow_hyphen_values = true)]
    pub pages: Option<String>,

    /// Include the file in the next conversion
    #[arg(long, conflicts_with = "deselect")]
    pub select: bool,

    /// Exclude the file from the next conversion
    #[arg(long)]
    pub deselect: bool,

    /// Move the file to this 1-based position
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub position: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Which files to select
    #[arg(value_enum)]
    pub which: Which,
}

/// Bulk selection choices.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Which {
    /// Every file
    All,
    /// No file
    None,
    /// Files that have not been converted yet
    Remaining,
}

impl From<Which> for Selection {
    fn from(which: Which) -> Self {
        match which {
            Which::All => Selection::All,
            Which::None => Selection::None,
            Which::Remaining => Selection::Remaining,
        }
    }
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// LibreOffice executable
    #[arg(long, value_name = "PATH", env = "PDFBINDER_SOFFICE", default_value = "soffice")]
    pub soffice: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Project name or id
    #[arg(value_name = "PROJECT")]
    pub project: String,

    /// Stamp "current / total" on every page
    ///
    /// Also enabled by the project's own setting.
    #[arg(long)]
    pub page_numbers: bool,
}

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Input PDF files or glob patterns, merged in the order given
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Stamp "current / total" on every page
    #[arg(long)]
    pub page_numbers: bool,
}

fn absolute(path: &std::path::Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

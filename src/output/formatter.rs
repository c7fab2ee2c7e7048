//! Message formatting and display for the command line.
//!
//! Messages honour quiet and verbose modes; warnings and errors always show
//! and go to stderr.
//!
//! # Examples
//!
//! ```
//! use pdfbinder::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Scanning folder...");
//! formatter.success("3 files converted");
//! ```

use std::io;
use std::path::Path;

use crate::config::{OutputPolicy, ProjectConfig};
use crate::convert::ConversionReport;
use crate::merge::MergeStatistics;
use crate::model::SourceFile;
use crate::scan::ReconcileReport;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

/// Output formatter with configurable verbosity.
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - Suppress non-error output
    /// * `verbose` - Show verbose output
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Returns true if stdout is a TTY and TERM is set.
    fn should_use_color() -> bool {
        use std::io::IsTerminal;
        io::stdout().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message, even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    /// Print a message only in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            self.print_message(MessageLevel::Debug, message);
        }
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
            MessageLevel::Debug => ("→ ", "\x1b[36m"),   // Cyan
        };

        let line = if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        };

        match level {
            MessageLevel::Warning | MessageLevel::Error => eprintln!("{line}"),
            _ => println!("{line}"),
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n{title}");
        }
    }

    /// Print a list item. Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            println!("  {index}. {message}");
        }
    }

    /// Print an inventory, one row per file in display order.
    pub fn inventory(&self, files: &[SourceFile]) {
        if self.quiet {
            return;
        }
        if files.is_empty() {
            println!("  (no documents)");
            return;
        }
        for file in files {
            println!("{}", inventory_row(file));
        }
    }

    /// Print a short summary of a project.
    pub fn project(&self, project: &ProjectConfig) {
        if self.quiet {
            return;
        }
        println!("{}", project_line(project));
        if self.verbose {
            println!("  id:          {}", project.id);
            println!("  output:      {}", project.output_root().display());
            println!("  merge into:  {}", project.merge_folder().display());
            println!("  merge name:  {}", project.merge_name);
            println!("  numbering:   {}", if project.page_numbers { "on" } else { "off" });
            if let Some(latest) = &project.latest_merged_pdf {
                println!("  last merge:  {}", latest.display());
            }
            println!("  last used:   {}", project.last_accessed_at.format("%Y-%m-%d %H:%M"));
        }
    }

    /// Print what reconciliation changed.
    pub fn reconcile_report(&self, report: &ReconcileReport) {
        if report.is_unchanged() {
            self.info("No changes");
            return;
        }
        for (label, names) in [
            ("Changed", &report.changed),
            ("Added", &report.added),
            ("Removed", &report.removed),
        ] {
            if !names.is_empty() {
                self.section(&format!("{label} ({}):", names.len()));
                for (idx, name) in names.iter().enumerate() {
                    self.list_item(idx + 1, name);
                }
            }
        }
    }

    /// Print per-file conversion outcomes and a summary line.
    pub fn conversion_report(&self, report: &ConversionReport) {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(output) => self.success(&format!("{} → {}", outcome.file_name, output.display())),
                Err(err) => self.error(&format!("{}: {err}", outcome.file_name)),
            }
        }

        let failed = report.outcomes.len() - report.succeeded();
        let summary = format!("{} converted, {failed} failed", report.succeeded());
        if report.cancelled {
            self.warning(&format!("Cancelled: {summary}"));
        } else if failed > 0 {
            self.warning(&summary);
        } else {
            self.success(&summary);
        }
    }

    /// Print the result of a merge.
    pub fn merge_summary(&self, stats: &MergeStatistics) {
        self.success(&format!(
            "Merged {} documents ({} pages) into {}",
            stats.documents,
            stats.pages,
            stats.output.display()
        ));
        if stats.page_numbers {
            self.debug("Page numbers stamped");
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// One inventory line: order, selection, status, selector and path.
pub fn inventory_row(file: &SourceFile) -> String {
    let mark = if file.selected { "[x]" } else { "[ ]" };
    let status = if file.is_converted() { "converted" } else { "pending" };
    let selector = if file.page_range.is_empty() {
        "all"
    } else {
        file.page_range.as_str()
    };
    let name = display_name(&file.relative_path, &file.file_name);
    format!(
        "  {:>3} {mark} {status:<9} {:<12} {name}",
        file.display_order + 1,
        format!("{} {selector}", short_unit(file)),
    )
}

/// One-line project description.
pub fn project_line(project: &ProjectConfig) -> String {
    let mut line = format!("{}  {}", project.name, project.folder.display());
    if !project.category.is_empty() {
        line.push_str(&format!("  [{}]", project.category));
    }
    if project.recursive {
        line.push_str("  (recursive)");
    }
    if let OutputPolicy::Custom(path) = &project.output {
        line.push_str(&format!("  → {}", path.display()));
    }
    line
}

fn display_name(relative: &Path, file_name: &str) -> String {
    if relative.as_os_str().is_empty() {
        file_name.to_string()
    } else {
        relative.join(file_name).display().to_string()
    }
}

fn short_unit(file: &SourceFile) -> &'static str {
    match file.kind.unit() {
        "sheets" => "sh",
        "slides" => "sl",
        _ => "p",
    }
}

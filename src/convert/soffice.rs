//! Headless LibreOffice adapter.
//!
//! Each render runs `soffice --headless --convert-to pdf` in a private
//! profile and output directory, then hands the produced PDF to
//! [`deliver`](super::deliver) for page selection. Spreadsheets are exported
//! one sheet per page, so sheet indices line up with page indices.
//!
//! Only one session per document kind runs at a time. The child process is
//! killed if the render is abandoned before it exits.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{RenderJob, Renderer, deliver};
use crate::error::{PipelineError, Result};
use crate::model::DocumentKind;
use crate::paths::output_file_name;

/// Program looked up on `PATH` by default.
pub const DEFAULT_PROGRAM: &str = "soffice";

const SPREADSHEET_FILTER: &str =
    r#"pdf:calc_pdf_Export:{"SinglePageSheets":{"type":"boolean","value":"true"}}"#;

/// Renders office documents through a LibreOffice executable.
#[derive(Debug)]
pub struct SofficeRenderer {
    program: PathBuf,
    sessions: HashMap<DocumentKind, Mutex<()>>,
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl SofficeRenderer {
    /// Create a renderer that runs `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let sessions = [
            DocumentKind::Spreadsheet,
            DocumentKind::WordDoc,
            DocumentKind::Presentation,
        ]
        .into_iter()
        .map(|kind| (kind, Mutex::new(())))
        .collect();

        Self {
            program: program.into(),
            sessions,
        }
    }

    /// Executable this renderer runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn session(&self, kind: DocumentKind) -> Option<MutexGuard<'_, ()>> {
        // A panic in another render does not invalidate the lock.
        self.sessions
            .get(&kind)
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn export(&self, source: &Path, kind: DocumentKind, workdir: &Path) -> Result<PathBuf> {
        let profile = workdir.join("profile");
        let outdir = workdir.join("out");
        std::fs::create_dir_all(&outdir)?;

        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg(format!("-env:UserInstallation={}", file_url(&profile)))
            .arg("--convert-to")
            .arg(convert_filter(kind))
            .arg("--outdir")
            .arg(&outdir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(program = %self.program.display(), source = %source.display(), "starting office session");
        let child = command.spawn().map_err(|e| {
            PipelineError::render_failure(
                source,
                format!("cannot start {}: {e}", self.program.display()),
            )
        })?;

        let mut guard = ChildGuard::new(child);
        let (status, stderr) = guard
            .wait()
            .map_err(|e| PipelineError::render_failure(source, e.to_string()))?;

        if !status.success() {
            return Err(PipelineError::render_failure(
                source,
                format!("{} exited with {status}: {}", self.program.display(), stderr.trim()),
            ));
        }

        let rendered = outdir.join(output_file_name(source));
        if !rendered.is_file() {
            return Err(PipelineError::render_failure(
                source,
                format!("no PDF was produced: {}", stderr.trim()),
            ));
        }
        Ok(rendered)
    }
}

impl Renderer for SofficeRenderer {
    fn render(&self, job: &RenderJob<'_>) -> Result<()> {
        let _session = self.session(job.kind);
        let workdir = tempfile::tempdir()?;

        let rendered = self.export(job.source, job.kind, workdir.path())?;
        deliver(&rendered, job)
    }
}

/// Kills the child on drop unless it was waited for.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    /// Drain stderr and wait for exit.
    fn wait(&mut self) -> std::io::Result<(ExitStatus, String)> {
        let mut stderr = Vec::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_end(&mut stderr)?;
        }
        let status = self.child.wait()?;
        self.reaped = true;
        Ok((status, String::from_utf8_lossy(&stderr).into_owned()))
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

fn convert_filter(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Spreadsheet => SPREADSHEET_FILTER,
        _ => "pdf",
    }
}

/// `file://` URL for a local path, as LibreOffice expects for its profile.
fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

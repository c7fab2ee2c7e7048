//! Conversion passes over a real folder with a scripted renderer.

use pdfbinder::PipelineError;
use pdfbinder::config::ProjectConfig;
use pdfbinder::convert::{RenderJob, Renderer, convert_selected, deliver};
use pdfbinder::merge::merge_sources;
use pdfbinder::model::{ConversionStatus, Selection, edit};
use pdfbinder::scan::{reconcile, scan};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::common::{page_tags, touch, write_pdf};

/// Renders office documents as tagged PDFs with a fixed page count per file,
/// then lets [`deliver`] apply the selection.
struct ScriptedOffice {
    pages: HashMap<&'static str, (u32, i64)>,
    scratch: TempDir,
}

impl ScriptedOffice {
    fn new(pages: &[(&'static str, u32, i64)]) -> Self {
        Self {
            pages: pages.iter().map(|&(name, count, tag)| (name, (count, tag))).collect(),
            scratch: TempDir::new().unwrap(),
        }
    }
}

impl Renderer for ScriptedOffice {
    fn render(&self, job: &RenderJob<'_>) -> pdfbinder::Result<()> {
        let name = job.source.file_name().unwrap().to_str().unwrap();
        let Some(&(count, tag)) = self.pages.get(name) else {
            return Err(PipelineError::render_failure(job.source, "application refused the document"));
        };

        let rendered = self.scratch.path().join(format!("{name}.pdf"));
        write_pdf(&rendered, count, tag);
        deliver(&rendered, job)
    }
}

fn project_with(folder: &Path, names: &[&str]) -> ProjectConfig {
    for name in names {
        touch(&folder.join(name));
    }
    ProjectConfig::new("p", folder)
}

#[test]
fn test_convert_with_selectors() {
    let temp = TempDir::new().unwrap();
    let project = project_with(temp.path(), &["book.xlsx", "deck.pptx", "memo.docx"]);
    let renderer = ScriptedOffice::new(&[("book.xlsx", 3, 1), ("deck.pptx", 5, 2), ("memo.docx", 2, 3)]);

    let files = scan(&project.folder, &project.output_root(), false).unwrap();
    // Spreadsheets default to their first sheet.
    assert_eq!(files[0].page_range, "1-1");
    let files = edit::set_page_range(&files, "deck.pptx", "4,2").unwrap();

    let report = convert_selected(&files, &project.resolver(), &renderer, &CancellationToken::new());
    assert_eq!(report.succeeded(), 3);
    assert!(!report.cancelled);

    let out = project.output_root();
    assert_eq!(page_tags(&out.join("book.pdf")), [(1, 1)]);
    assert_eq!(page_tags(&out.join("deck.pdf")), [(2, 2), (2, 4)]);
    assert_eq!(page_tags(&out.join("memo.pdf")), [(3, 1), (3, 2)]);

    for file in &report.files {
        assert_eq!(file.status, ConversionStatus::Converted);
        assert!(!file.selected);
    }
}

#[test]
fn test_out_of_range_selector_fails_only_that_file() {
    let temp = TempDir::new().unwrap();
    let project = project_with(temp.path(), &["a.docx", "b.docx"]);
    let renderer = ScriptedOffice::new(&[("a.docx", 2, 1), ("b.docx", 2, 2)]);

    let files = scan(&project.folder, &project.output_root(), false).unwrap();
    let files = edit::set_page_range(&files, "a.docx", "2-4").unwrap();

    let report = convert_selected(&files, &project.resolver(), &renderer, &CancellationToken::new());
    match &report.outcomes[0].result {
        Err(PipelineError::OutOfRangeSelector { invalid, total, unit, .. }) => {
            assert_eq!(invalid, &[3, 4]);
            assert_eq!(*total, 2);
            assert_eq!(*unit, "pages");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(report.outcomes[1].result.is_ok());
    assert!(!project.output_root().join("a.pdf").exists());

    // The failed file stays selected for the next pass.
    let remaining: Vec<_> = report.files.iter().filter(|f| f.selected).map(|f| f.file_name.as_str()).collect();
    assert_eq!(remaining, ["a.docx"]);
}

#[test]
fn test_render_failure_is_reported_per_file() {
    let temp = TempDir::new().unwrap();
    let project = project_with(temp.path(), &["a.docx", "locked.docx", "z.docx"]);
    let renderer = ScriptedOffice::new(&[("a.docx", 1, 1), ("z.docx", 1, 2)]);

    let files = scan(&project.folder, &project.output_root(), false).unwrap();
    let report = convert_selected(&files, &project.resolver(), &renderer, &CancellationToken::new());

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].file_name, "locked.docx");
    assert!(matches!(failures[0].result, Err(PipelineError::RenderFailure { .. })));
    assert!(failures[0].result.as_ref().unwrap_err().is_recoverable());
    assert_eq!(report.succeeded(), 2);
}

#[test]
fn test_select_remaining_after_partial_pass() {
    let temp = TempDir::new().unwrap();
    let project = project_with(temp.path(), &["a.docx", "b.docx"]);
    let renderer = ScriptedOffice::new(&[("a.docx", 1, 1)]);

    let files = scan(&project.folder, &project.output_root(), false).unwrap();
    let report = convert_selected(&files, &project.resolver(), &renderer, &CancellationToken::new());
    assert_eq!(report.succeeded(), 1);

    // A later session reselects whatever has no PDF yet.
    let snapshots: Vec<_> = report.files.iter().map(pdfbinder::SourceFile::snapshot).collect();
    let files = reconcile(&project.folder, &project.output_root(), &snapshots, false)
        .unwrap()
        .files;
    let files = edit::select(&files, Selection::All);
    let files = edit::select(&files, Selection::Remaining);
    let selected: Vec<_> = files.iter().filter(|f| f.selected).map(|f| f.file_name.as_str()).collect();
    assert_eq!(selected, ["b.docx"]);
}

#[test]
fn test_pdf_source_sharing_a_stem_keeps_both_documents() {
    let temp = TempDir::new().unwrap();
    let project = project_with(temp.path(), &["a.docx"]);
    write_pdf(&temp.path().join("a.pdf"), 1, 9);
    let renderer = ScriptedOffice::new(&[("a.docx", 2, 1)]);

    let files = scan(&project.folder, &project.output_root(), false).unwrap();
    let report = convert_selected(&files, &project.resolver(), &renderer, &CancellationToken::new());
    assert_eq!(report.succeeded(), 2);

    let out = project.output_root();
    assert_eq!(page_tags(&out.join("a.pdf")), [(1, 1), (1, 2)]);
    // The source PDF is read in place and never copied.
    assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);

    let sources = merge_sources(&report.files, &project.resolver()).unwrap();
    assert_eq!(sources, [out.join("a.pdf"), temp.path().join("a.pdf")]);
    assert_eq!(page_tags(&sources[1]), [(9, 1)]);
}

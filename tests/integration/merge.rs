//! Merging converted projects and arbitrary PDFs.

use chrono::{Local, TimeZone};
use pdfbinder::PipelineError;
use pdfbinder::config::ProjectConfig;
use pdfbinder::merge::{PdfAssembler, merge_sources};
use pdfbinder::model::edit;
use pdfbinder::scan::{expand_inputs, scan};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::common::{page_tags, shown_text, touch, write_pdf};

#[test]
fn test_merge_project_in_display_order_with_page_numbers() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path();
    let mut project = ProjectConfig::new("Binder", folder);
    project.merge_name = "Quarterly".into();
    let out = project.output_root();

    touch(&folder.join("a.docx"));
    touch(&folder.join("b.xlsx"));
    write_pdf(&folder.join("c.pdf"), 1, 3);
    write_pdf(&out.join("a.pdf"), 2, 1);
    write_pdf(&out.join("b.pdf"), 3, 2);

    let files = scan(folder, &out, false).unwrap();
    let files = edit::move_to(&files, "c.pdf", 1).unwrap();
    let sources = merge_sources(&files, &project.resolver()).unwrap();
    assert_eq!(sources, [out.join("a.pdf"), folder.join("c.pdf"), out.join("b.pdf")]);

    let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
    let output = project.merge_output_path(&at);
    assert_eq!(output, folder.join("mergePDF").join("Quarterly_240501093000.pdf"));

    let stats = PdfAssembler::new().merge(&sources, &output, true).unwrap();
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.pages, 6);
    assert!(stats.page_numbers);

    assert_eq!(
        page_tags(&output),
        [(1, 1), (1, 2), (3, 1), (2, 1), (2, 2), (2, 3)]
    );
    let labels: Vec<Vec<String>> = (1..=6).map(|i| vec![format!("{i} / 6")]).collect();
    assert_eq!(shown_text(&output), labels);

    // Only the final file is left behind.
    let entries: Vec<_> = std::fs::read_dir(folder.join("mergePDF")).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_merge_refuses_unconverted_files() {
    let temp = TempDir::new().unwrap();
    let project = ProjectConfig::new("p", temp.path());
    touch(&temp.path().join("a.docx"));
    touch(&temp.path().join("b.pptx"));
    write_pdf(&project.output_root().join("a.pdf"), 1, 1);

    let files = scan(temp.path(), &project.output_root(), false).unwrap();
    match merge_sources(&files, &project.resolver()) {
        Err(err @ PipelineError::MissingMergeSources { .. }) => {
            assert!(err.to_string().contains("b.pptx"));
            assert!(!err.to_string().contains("a.docx"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_merge_replaces_existing_output() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("one.pdf");
    let second = temp.path().join("two.pdf");
    write_pdf(&first, 1, 1);
    write_pdf(&second, 2, 2);

    let output = temp.path().join("out.pdf");
    std::fs::write(&output, b"stale").unwrap();

    PdfAssembler::new().merge(&[first, second], &output, false).unwrap();
    assert_eq!(page_tags(&output), [(1, 1), (2, 1), (2, 2)]);
    assert!(shown_text(&output).iter().all(Vec::is_empty));
}

#[test]
fn test_join_expands_globs_in_order() {
    let temp = TempDir::new().unwrap();
    for (name, tag) in [("ch2.pdf", 2), ("ch1.pdf", 1), ("appendix.pdf", 9)] {
        write_pdf(&temp.path().join(name), 1, tag);
    }

    let patterns = [
        temp.path().join("ch*.pdf").display().to_string(),
        temp.path().join("appendix.pdf").display().to_string(),
    ];
    let inputs = expand_inputs(&patterns).unwrap();
    assert_eq!(inputs.len(), 3);

    let output = temp.path().join("book.pdf");
    let stats = PdfAssembler::new().merge(&inputs, &output, false).unwrap();
    assert_eq!(stats.pages, 3);
    assert_eq!(page_tags(&output), [(1, 1), (2, 1), (9, 1)]);
}

#[test]
fn test_cancelled_merge_leaves_no_output() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("a.pdf");
    write_pdf(&input, 2, 1);

    let token = CancellationToken::new();
    token.cancel();
    let output = temp.path().join("mergePDF").join("out.pdf");
    let result = PdfAssembler::with_cancellation(token).merge(&[input], &output, true);

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(result.unwrap_err().exit_code(), 130);
    assert!(!output.exists());
}

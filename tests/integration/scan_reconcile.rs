//! Scanning, persisting and reconciling a project's inventory.

use pdfbinder::config::{OutputPolicy, ProjectConfig, ProjectStore};
use pdfbinder::model::{ConversionStatus, Selection, edit};
use pdfbinder::scan::{reconcile, scan};
use pdfbinder::PipelineError;
use tempfile::TempDir;

use crate::common::{bump_mtime, touch, write_pdf};

fn names(files: &[pdfbinder::SourceFile]) -> Vec<&str> {
    files.iter().map(|f| f.file_name.as_str()).collect()
}

#[test]
fn test_state_survives_a_store_round_trip() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("docs");
    for name in ["a.docx", "b.xlsx", "c.pptx"] {
        touch(&folder.join(name));
    }
    write_pdf(&folder.join("d.pdf"), 2, 1);

    let store_path = temp.path().join("store").join("projects.json");
    let mut store = ProjectStore::open(&store_path).unwrap();
    let mut project = ProjectConfig::new("Reports", &folder);

    let files = scan(&folder, &project.output_root(), false).unwrap();
    assert_eq!(names(&files), ["a.docx", "b.xlsx", "c.pptx", "d.pdf"]);

    let files = edit::set_page_range(&files, "b.xlsx", "2-3").unwrap();
    let files = edit::set_selected(&files, "a.docx", false).unwrap();
    let files = edit::move_to(&files, "d.pdf", 0).unwrap();
    project.record_inventory(&files);
    store.add(project.clone()).unwrap();
    store.save().unwrap();

    let reopened = ProjectStore::open(&store_path).unwrap();
    let stored = reopened.find("Reports").unwrap();
    let report = reconcile(&folder, &stored.output_root(), &stored.files, stored.recursive).unwrap();

    assert!(report.is_unchanged());
    assert_eq!(report.files, files);
}

#[test]
fn test_update_after_edits_on_disk() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().to_path_buf();
    let project = ProjectConfig::new("p", &folder);
    let output = project.output_root();

    for name in ["a.docx", "b.xlsx", "c.pptx"] {
        touch(&folder.join(name));
    }
    // c.pptx has been converted before.
    write_pdf(&output.join("c.pdf"), 1, 3);

    let files = scan(&folder, &output, false).unwrap();
    assert_eq!(files[2].status, ConversionStatus::Converted);
    let files = edit::set_page_range(&files, "b.xlsx", "2").unwrap();
    let files = edit::select(&files, Selection::None);
    let files = edit::move_to(&files, "a.docx", 2).unwrap();
    let snapshots: Vec<_> = files.iter().map(pdfbinder::SourceFile::snapshot).collect();
    assert_eq!(names(&files), ["b.xlsx", "c.pptx", "a.docx"]);

    bump_mtime(&folder.join("a.docx"));
    std::fs::remove_file(folder.join("c.pptx")).unwrap();
    touch(&folder.join("new.docx"));

    let report = reconcile(&folder, &output, &snapshots, false).unwrap();
    assert_eq!(report.changed, ["a.docx"]);
    assert_eq!(report.added, ["new.docx"]);
    assert_eq!(report.removed, ["c.pptx"]);

    // Changed file first, unchanged in old order, new files last.
    assert_eq!(names(&report.files), ["a.docx", "b.xlsx", "new.docx"]);
    let orders: Vec<usize> = report.files.iter().map(|f| f.display_order).collect();
    assert_eq!(orders, [0, 1, 2]);

    let a = &report.files[0];
    assert!(a.selected);
    assert_eq!(a.page_range, "");
    let b = &report.files[1];
    assert!(!b.selected);
    assert_eq!(b.page_range, "2");
    assert!(report.files[2].selected);

    assert!(!output.join("c.pdf").exists());
}

#[test]
fn test_recursive_project_mirrors_subfolders() {
    let temp = TempDir::new().unwrap();
    let folder = temp.path().join("src");
    touch(&folder.join("top.docx"));
    touch(&folder.join("q1/sales.xlsx"));
    touch(&folder.join("q1/deep/notes.pptx"));

    let mut project = ProjectConfig::new("tree", &folder);
    project.recursive = true;
    assert!(matches!(project.validate(), Err(PipelineError::InvalidConfig { .. })));

    // Converted output inside the scanned tree would be picked up as sources.
    project.output = OutputPolicy::Custom(folder.join("PDF"));
    assert!(matches!(project.validate(), Err(PipelineError::InvalidConfig { .. })));

    project.output = OutputPolicy::Custom(temp.path().join("out"));
    project.validate().unwrap();

    let files = scan(&folder, &project.output_root(), project.recursive).unwrap();
    assert_eq!(names(&files), ["top.docx", "sales.xlsx", "notes.pptx"]);

    let resolver = project.resolver();
    assert_eq!(
        resolver.output_path(&files[2].path),
        temp.path().join("out/q1/deep/notes.pdf")
    );
}

#[test]
fn test_scan_rejects_missing_folder() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing");
    assert!(matches!(
        scan(&missing, &missing.join("PDF"), false),
        Err(PipelineError::FileNotFound { .. })
    ));
}

//! Shared helpers for the integration suite.
//!
//! PDF fixtures are built in memory with lopdf; every page carries a `Tag`
//! array of `(document tag, page number)` so tests can follow pages through
//! extraction and merging.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{Document, Object, Stream, dictionary};
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Write a PDF with `pages` pages tagged with `tag`.
pub fn write_pdf(path: &Path, pages: u32, tag: i64) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let kids: Vec<Object> = (1..=pages)
        .map(|n| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
                "Contents" => content_id,
                "Tag" => vec![tag.into(), i64::from(n).into()],
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(pages),
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    doc.save(path).unwrap();
}

/// `(tag, page number)` of every page of the PDF at `path`, in page order.
pub fn page_tags(path: &Path) -> Vec<(i64, i64)> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let tag = doc.get_dictionary(id).unwrap().get(b"Tag").unwrap().as_array().unwrap();
            (tag[0].as_i64().unwrap(), tag[1].as_i64().unwrap())
        })
        .collect()
}

/// Strings shown with `Tj` on each page.
pub fn shown_text(path: &Path) -> Vec<Vec<String>> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let content = Content::decode(&doc.get_page_content(id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(text, _)) => Some(String::from_utf8_lossy(text).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// Create a placeholder office document.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"office document").unwrap();
}

/// Push the modification time of `path` forward.
pub fn bump_mtime(path: &Path) {
    let modified = fs::metadata(path).unwrap().modified().unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified + Duration::from_secs(60))
        .unwrap();
}

/// Pin the modification time of `path`.
pub fn set_mtime(path: &Path, at: SystemTime) {
    File::options().write(true).open(path).unwrap().set_modified(at).unwrap();
}

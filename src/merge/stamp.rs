//! Page number stamping.
//!
//! Every page gets a right-aligned `"<page> / <total>"` label in 10pt
//! Helvetica, 20pt in from the top-right corner of its media box. The page's
//! existing content is wrapped in `q`/`Q` so the label is drawn in the default
//! coordinate system whatever state the page leaves behind.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::pages::page_attribute;
use crate::error::{PipelineError, Result};
use crate::io::{PdfReader, StagedOutput};

/// Font size of the label.
pub const FONT_SIZE: f32 = 10.0;

/// Distance of the label from the right and top edges.
pub const MARGIN: f32 = 20.0;

/// US Letter, used when a page has no usable media box.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Stamp page numbers onto the PDF at `path` and return the staged result.
///
/// Nothing at `path` changes until the returned stage is committed; dropping
/// it discards the stamped copy.
///
/// # Errors
///
/// Returns [`PipelineError::Cancelled`] if `cancel` fires between pages, or
/// the read/write error that stopped the pass.
pub fn stage_page_numbers(path: &Path, cancel: &CancellationToken) -> Result<StagedOutput> {
    let mut doc = PdfReader::read(path)?;
    stamp_document(&mut doc, cancel)?;
    doc.compress();

    let staged = StagedOutput::new(path);
    staged.write_document(&mut doc)?;
    Ok(staged)
}

/// Stamp page numbers onto the PDF at `path` in place.
pub fn stamp_page_numbers(path: &Path, cancel: &CancellationToken) -> Result<()> {
    stage_page_numbers(path, cancel)?.commit()?;
    Ok(())
}

/// Stamp every page of an in-memory document.
pub fn stamp_document(doc: &mut Document, cancel: &CancellationToken) -> Result<()> {
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = page_ids.len();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    for (idx, page_id) in page_ids.into_iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let label = format!("{} / {}", idx + 1, total);
        let [_, _, right, top] = media_box(doc, page_id);
        let x = right - MARGIN - text_width(&label, FONT_SIZE);
        let y = top - MARGIN;

        let font_name = attach_font(doc, page_id, font_id)?;
        let overlay = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("g", vec![0.into()]),
                Operation::new("Tf", vec![Object::Name(font_name), FONT_SIZE.into()]),
                Operation::new("Td", vec![x.into(), y.into()]),
                Operation::new("Tj", vec![Object::string_literal(label)]),
                Operation::new("ET", vec![]),
            ],
        };

        let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        // Leading newline keeps the final operator of the page apart from `Q`.
        let mut closing = b"\n".to_vec();
        closing.extend(overlay.encode()?);
        let close_id = doc.add_object(Stream::new(dictionary! {}, closing));
        wrap_contents(doc, page_id, open_id, close_id)?;
    }

    debug!(pages = total, "stamped page numbers");
    Ok(())
}

/// Width of `text` in Helvetica at `size` points.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | '/' => 278,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Effective media box `[llx, lly, urx, ury]` of a page.
fn media_box(doc: &Document, page_id: ObjectId) -> [f32; 4] {
    let Some(Object::Array(values)) = page_attribute(doc, page_id, b"MediaBox") else {
        return DEFAULT_MEDIA_BOX;
    };
    let numbers: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
    match numbers.as_slice() {
        [a, b, c, d] => [a.min(*c), b.min(*d), a.max(*c), b.max(*d)],
        _ => DEFAULT_MEDIA_BOX,
    }
}

/// Register the stamp font in the page's own resources and return its name.
///
/// Inherited or shared resources are copied inline first so other pages are
/// not affected.
fn attach_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<Vec<u8>> {
    let mut resources = match page_attribute(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict.clone(),
        _ => Dictionary::new(),
    };

    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(Dictionary::clone)
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    };

    let mut name = b"FStamp".to_vec();
    let mut suffix = 0;
    while fonts.has(&name) {
        suffix += 1;
        name = format!("FStamp{suffix}").into_bytes();
    }

    fonts.set(name.clone(), font_id);
    resources.set("Font", fonts);
    doc.get_object_mut(page_id)?.as_dict_mut()?.set("Resources", resources);
    Ok(name)
}

/// Surround the page's content streams with `open` and `close`.
fn wrap_contents(doc: &mut Document, page_id: ObjectId, open: ObjectId, close: ObjectId) -> Result<()> {
    let mut contents = vec![Object::Reference(open)];
    match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        // An indirect array of streams is spliced in, not nested.
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
            _ => contents.push(Object::Reference(*id)),
        },
        Ok(existing) => contents.push(existing.clone()),
        Err(_) => {}
    }
    contents.push(Object::Reference(close));

    doc.get_object_mut(page_id)?.as_dict_mut()?.set("Contents", contents);
    Ok(())
}

//! Page tree manipulation.
//!
//! Both page extraction and merging end by rebuilding the page tree as a
//! single flat `Pages` node. Attributes a page inherited from intermediate
//! nodes are copied onto the page first so nothing visible changes.

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::selector::PageSelection;

/// Page attributes that may be inherited from ancestor `Pages` nodes.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards against cyclic `Parent` chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Page extractor for reducing a document to a selection.
pub struct PageExtractor;

impl PageExtractor {
    /// Reduce `doc` to the pages in `selection`, in ascending order.
    ///
    /// An "all" selection leaves the document as is. `source` is only used in
    /// error messages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::OutOfRangeSelector`] naming every index beyond
    /// the document's page count, counted in `unit`.
    pub fn extract_pages(
        doc: &mut Document,
        selection: &PageSelection,
        source: &Path,
        unit: &'static str,
    ) -> Result<()> {
        let all_pages = doc.get_pages();
        let total = all_pages.len() as u32;

        let invalid = selection.out_of_range(total);
        if !invalid.is_empty() {
            return Err(PipelineError::OutOfRangeSelector {
                path: source.to_path_buf(),
                invalid,
                total,
                unit,
            });
        }

        if selection.is_all() {
            return Ok(());
        }

        let page_ids: Vec<ObjectId> = selection
            .resolve(total)
            .iter()
            .filter_map(|page| all_pages.get(page).copied())
            .collect();

        rebuild_page_tree(doc, &page_ids)
    }

    /// Get the number of pages in a document.
    pub fn page_count(doc: &Document) -> usize {
        doc.get_pages().len()
    }
}

/// Replace the page tree of `doc` with one flat node holding `page_ids`.
///
/// The existing catalog is kept when there is one; otherwise a new one is
/// created. Objects no longer reachable from the trailer are pruned.
pub(crate) fn rebuild_page_tree(doc: &mut Document, page_ids: &[ObjectId]) -> Result<()> {
    let pages_id = doc.new_object_id();

    for &page_id in page_ids {
        detach_page(doc, page_id, pages_id)?;
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_ids.len() as i64,
    };
    doc.objects.insert(pages_id, pages.into());

    if doc.catalog().is_ok() {
        doc.catalog_mut()?.set("Pages", pages_id);
    } else {
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
    }

    doc.prune_objects();
    Ok(())
}

/// Copy inherited attributes onto a page and point it at a new parent.
fn detach_page(doc: &mut Document, page_id: ObjectId, parent: ObjectId) -> Result<()> {
    let inherited = inherited_attributes(doc, page_id)?;

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        if !page.has(&key) {
            page.set(key, value);
        }
    }
    page.set("Parent", parent);
    Ok(())
}

/// Inheritable attributes defined on the page's ancestors, nearest first.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Result<Vec<(Vec<u8>, Object)>> {
    let mut found: Vec<(Vec<u8>, Object)> = Vec::new();
    let mut current = parent_of(doc.get_dictionary(page_id)?);

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = current else { break };
        let Ok(node) = doc.get_dictionary(node_id) else { break };

        for key in INHERITABLE {
            if found.iter().any(|(k, _)| k == key) {
                continue;
            }
            if let Ok(value) = node.get(key) {
                found.push((key.to_vec(), value.clone()));
            }
        }
        current = parent_of(node);
    }

    Ok(found)
}

fn parent_of(node: &Dictionary) -> Option<ObjectId> {
    node.get(b"Parent").and_then(Object::as_reference).ok()
}

/// Look up an attribute on a page, following inheritance and references.
pub(crate) fn page_attribute<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(current?).ok()?;
        if let Ok(value) = node.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).ok(),
                other => Some(other),
            };
        }
        current = parent_of(node);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_multi_page_pdf(pages: usize) -> Document {
        let mut doc = Document::with_version("1.4");

        let catalog_id = doc.new_object_id();
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for n in 0..pages {
            let page_id = doc.new_object_id();
            let page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Marker" => n as i64 + 1,
            };
            doc.objects.insert(page_id, page.into());
            page_ids.push(page_id);
        }

        let catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(|id| id.into()).collect::<Vec<Object>>(),
            "Count" => pages as i64,
        };

        doc.objects.insert(catalog_id, catalog.into());
        doc.objects.insert(pages_id, pages_dict.into());
        doc.trailer.set("Root", catalog_id);

        doc
    }

    fn markers(doc: &Document) -> Vec<i64> {
        doc.get_pages()
            .values()
            .map(|&id| {
                doc.get_dictionary(id)
                    .unwrap()
                    .get(b"Marker")
                    .unwrap()
                    .as_i64()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_page_count() {
        let doc = create_multi_page_pdf(5);
        assert_eq!(PageExtractor::page_count(&doc), 5);
    }

    #[test]
    fn test_extract_pages() {
        let mut doc = create_multi_page_pdf(10);
        let selection = PageSelection::parse("2,5-6").unwrap();

        PageExtractor::extract_pages(&mut doc, &selection, Path::new("a.pdf"), "pages").unwrap();

        assert_eq!(PageExtractor::page_count(&doc), 3);
        assert_eq!(markers(&doc), vec![2, 5, 6]);
    }

    #[test]
    fn test_extract_all_is_noop() {
        let mut doc = create_multi_page_pdf(4);
        PageExtractor::extract_pages(&mut doc, &PageSelection::all(), Path::new("a.pdf"), "pages").unwrap();
        assert_eq!(markers(&doc), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_extract_pages_out_of_range() {
        let mut doc = create_multi_page_pdf(3);
        let selection = PageSelection::parse("2,4-5").unwrap();

        let err = PageExtractor::extract_pages(&mut doc, &selection, Path::new("b.xlsx"), "sheets")
            .unwrap_err();
        match err {
            PipelineError::OutOfRangeSelector { invalid, total, unit, .. } => {
                assert_eq!(invalid, vec![4, 5]);
                assert_eq!(total, 3);
                assert_eq!(unit, "sheets");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Untouched on failure.
        assert_eq!(PageExtractor::page_count(&doc), 3);
    }

    #[test]
    fn test_inherited_attributes_are_copied() {
        let mut doc = Document::with_version("1.4");
        let catalog_id = doc.new_object_id();
        let root_id = doc.new_object_id();
        let middle_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(page_id, dictionary! { "Type" => "Page", "Parent" => middle_id }.into());
        doc.objects.insert(
            middle_id,
            dictionary! {
                "Type" => "Pages",
                "Parent" => root_id,
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1,
                "Rotate" => 90,
            }
            .into(),
        );
        doc.objects.insert(
            root_id,
            dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(middle_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 300.into(), 400.into()],
            }
            .into(),
        );
        doc.objects.insert(catalog_id, dictionary! { "Type" => "Catalog", "Pages" => root_id }.into());
        doc.trailer.set("Root", catalog_id);

        rebuild_page_tree(&mut doc, &[page_id]).unwrap();

        let page = doc.get_dictionary(page_id).unwrap();
        assert_eq!(page.get(b"Rotate").unwrap().as_i64().unwrap(), 90);
        assert!(page.get(b"MediaBox").is_ok());
        assert_ne!(page.get(b"Parent").unwrap().as_reference().unwrap(), middle_id);
        assert!(doc.get_object(middle_id).is_err());
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_page_attribute_follows_parent() {
        let doc = create_multi_page_pdf(1);
        let page_id = *doc.get_pages().get(&1).unwrap();
        assert!(page_attribute(&doc, page_id, b"MediaBox").is_some());
        assert!(page_attribute(&doc, page_id, b"Type").is_some());
        assert!(page_attribute(&doc, page_id, b"CropBox").is_none());
    }
}

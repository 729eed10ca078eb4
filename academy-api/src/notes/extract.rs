//! Single-page region extraction from a loaded PDF

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use super::geometry::{to_page_frame, PageSize, Rect};
use super::RegionError;

/// Guard against cyclic `Parent` chains in malformed page trees
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// A page's MediaBox, normalized so `left`/`bottom` is the lower-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    pub fn size(&self) -> PageSize {
        PageSize {
            width: self.width,
            height: self.height,
        }
    }
}

/// Original material document, parsed once and shared read-only by every
/// extraction in a request
#[derive(Debug)]
pub struct SourceDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl SourceDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, lopdf::Error> {
        let doc = Document::load_mem(bytes)?;
        let pages = doc.get_pages();
        Ok(Self { doc, pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_id(&self, page_number: i64) -> Option<ObjectId> {
        u32::try_from(page_number)
            .ok()
            .and_then(|n| self.pages.get(&n).copied())
    }

    /// MediaBox of a 1-based page, following page-tree inheritance
    pub fn page_box(&self, page_number: i64) -> Option<PageBox> {
        self.page_id(page_number)
            .and_then(|id| inherited_media_box(&self.doc, id))
    }

    /// Produce a standalone one-page PDF showing only `region` of `page_number`
    ///
    /// `region` is in reference space (see [`super::geometry`]). The shared
    /// document is never modified; the page is cut out of a private copy.
    pub fn extract_region(
        &self,
        question_number: i64,
        page_number: i64,
        region: &Rect,
    ) -> Result<Vec<u8>, RegionError> {
        let page_id = self
            .page_id(page_number)
            .ok_or(RegionError::PageOutOfRange {
                question_number,
                page_number,
                page_count: self.page_count(),
            })?;

        let extraction_error = |reason: String| RegionError::Extraction {
            question_number,
            reason,
        };

        let media = inherited_media_box(&self.doc, page_id)
            .ok_or_else(|| extraction_error("page has no usable MediaBox".to_string()))?;
        let target = to_page_frame(region, media.size());

        let mut single = self.doc.clone();
        let others: Vec<u32> = self
            .pages
            .keys()
            .copied()
            .filter(|n| i64::from(*n) != page_number)
            .collect();
        single.delete_pages(&others);

        {
            let page = single
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| extraction_error(format!("page object unreadable: {}", e)))?;

            // Pin the inherited MediaBox on the page itself so the crop stays
            // meaningful once the page tree is pruned.
            page.set(
                "MediaBox",
                box_array(
                    media.left,
                    media.bottom,
                    media.left + media.width,
                    media.bottom + media.height,
                ),
            );
            page.set(
                "CropBox",
                box_array(
                    media.left + target.x,
                    media.bottom + target.y,
                    media.left + target.x + target.width,
                    media.bottom + target.y + target.height,
                ),
            );
        }

        single.prune_objects();

        let mut out = Vec::new();
        single
            .save_to(&mut out)
            .map_err(|e| extraction_error(format!("serialization failed: {}", e)))?;

        Ok(out)
    }
}

fn box_array(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
    Object::Array(vec![
        Object::Real(llx as f32),
        Object::Real(lly as f32),
        Object::Real(urx as f32),
        Object::Real(ury as f32),
    ])
}

fn inherited_media_box(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    let mut current = Some(page_id);

    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let dict = doc.get_dictionary(current?).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            return parse_box(doc, media_box);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

fn parse_box(doc: &Document, object: &Object) -> Option<PageBox> {
    let values = resolve(doc, object)?.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }

    let coords: Vec<f64> = values
        .iter()
        .map(|v| resolve(doc, v).and_then(as_number))
        .collect::<Option<_>>()?;
    let (x1, y1, x2, y2) = (coords[0], coords[1], coords[2], coords[3]);

    Some(PageBox {
        left: x1.min(x2),
        bottom: y1.min(y2),
        width: (x2 - x1).abs(),
        height: (y2 - y1).abs(),
    })
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn as_number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

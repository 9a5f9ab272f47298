//! Page tree helpers.
//!
//! Original pages are re-parented under a fresh `Pages` node. Attributes a
//! page inherits from its ancestors would be lost by that move, so they are
//! copied onto the page first.

use crate::error::{ComposeError, ComposeResult};
use lopdf::{Document, Object, ObjectId};

/// Page attributes that may be inherited from ancestor `Pages` nodes.
pub const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Deepest page tree walked before giving up on a malformed (cyclic) tree.
const MAX_DEPTH: usize = 64;

fn parent_of(doc: &Document, node: ObjectId) -> Option<ObjectId> {
    doc.get_object(node)
        .ok()?
        .as_dict()
        .ok()?
        .get(b"Parent")
        .ok()?
        .as_reference()
        .ok()
}

/// Nearest ancestor value of `key` for `page`.
pub fn inherited(doc: &Document, page: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = parent_of(doc, page)?;
    for _ in 0..MAX_DEPTH {
        let node = doc.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Copy inherited attributes onto each page that does not define them.
pub fn materialize_inherited(doc: &mut Document, pages: &[ObjectId]) -> ComposeResult<()> {
    let mut updates = Vec::new();
    for &page in pages {
        let dict = doc
            .get_object(page)
            .and_then(Object::as_dict)
            .map_err(|e| ComposeError::PageTree {
                reason: format!("page {:?}: {}", page, e),
            })?;
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited(doc, page, key) {
                updates.push((page, key, value));
            }
        }
    }

    for (page, key, value) in updates {
        doc.get_object_mut(page)
            .and_then(Object::as_dict_mut)?
            .set(key.to_vec(), value);
    }
    Ok(())
}

/// Point every page at `parent`.
pub fn reparent(doc: &mut Document, pages: &[ObjectId], parent: ObjectId) -> ComposeResult<()> {
    for &page in pages {
        doc.get_object_mut(page)
            .and_then(Object::as_dict_mut)?
            .set("Parent", parent);
    }
    Ok(())
}

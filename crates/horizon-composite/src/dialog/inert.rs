//! Inert background computation.

use horizon_composite_core::{Document, ElementId};

/// Elements that must be inert for only `dialog` to stay reachable.
///
/// Walks from `dialog` up to the body and collects every sibling (light or
/// shadow) of each node on the way. The dialog's own subtree and its
/// ancestors are never included.
pub fn background_of(doc: &Document, dialog: ElementId) -> Vec<ElementId> {
    let body = doc.body();
    let mut background = Vec::new();
    let mut current = dialog;

    while current != body {
        let Some(parent) = doc.parent(current) else {
            break;
        };
        background.extend(
            doc.shadow_children(parent)
                .iter()
                .chain(doc.children(parent))
                .copied()
                .filter(|&sibling| sibling != current),
        );
        current = parent;
    }
    background
}

/// Mark `elements` inert, returning those that were not inert already.
pub fn mark(doc: &mut Document, elements: &[ElementId]) -> Vec<ElementId> {
    elements
        .iter()
        .copied()
        .filter(|&e| doc.toggle_attribute(e, "inert", true))
        .collect()
}

/// Lift the inert mark from `elements`.
pub fn release(doc: &mut Document, elements: &[ElementId]) {
    for &element in elements {
        doc.remove_attribute(element, "inert");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_covers_each_level() {
        let mut doc = Document::new();
        let header = doc.create_element("header");
        let main = doc.create_element("main");
        let aside = doc.create_element("aside");
        let dialog = doc.create_element("horizon-dialog");
        let content = doc.create_element("button");
        doc.append_child(doc.body(), header).unwrap();
        doc.append_child(doc.body(), main).unwrap();
        doc.append_child(main, aside).unwrap();
        doc.append_child(main, dialog).unwrap();
        doc.append_child(dialog, content).unwrap();

        let background = background_of(&doc, dialog);
        assert_eq!(background, vec![aside, header]);
        assert!(!background.contains(&content));
    }

    #[test]
    fn test_mark_skips_already_inert() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();
        doc.toggle_attribute(a, "inert", true);

        let marked = mark(&mut doc, &[a, b]);
        assert_eq!(marked, vec![b]);
        release(&mut doc, &marked);
        assert!(doc.has_attribute(a, "inert"));
        assert!(!doc.has_attribute(b, "inert"));
    }
}

//! Focus containment for the top dialog.

use horizon_composite_core::{Document, ElementId};

use crate::focus::{cycle_focus, tabbable_elements};

/// The element a dialog focuses when it opens: the first focusable element
/// carrying `autofocus`, if any.
pub fn autofocus_target(doc: &Document, dialog: ElementId) -> Option<ElementId> {
    doc.composed_preorder(dialog)
        .into_iter()
        .find(|&e| doc.has_attribute(e, "autofocus") && doc.is_focusable(e))
}

/// Move focus one Tab step within `dialog`, wrapping at the ends.
///
/// The tabbable set includes shadow content. With nothing tabbable inside,
/// focus stays where it is. The key is consumed either way.
pub fn trap_tab(doc: &mut Document, dialog: ElementId, backwards: bool) -> Option<ElementId> {
    if tabbable_elements(doc, dialog).is_empty() {
        return None;
    }
    cycle_focus(doc, dialog, backwards)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_cycles_inside_dialog() {
        let mut doc = Document::new();
        let outside = doc.create_element("button");
        let dialog = doc.create_element("horizon-dialog");
        let first = doc.create_element("button");
        let last = doc.create_element("input");
        doc.append_child(doc.body(), outside).unwrap();
        doc.append_child(doc.body(), dialog).unwrap();
        doc.append_child(dialog, first).unwrap();
        doc.attach_shadow_child(dialog, last).unwrap();
        doc.focus(outside);

        assert_eq!(trap_tab(&mut doc, dialog, false), Some(last));
        assert_eq!(trap_tab(&mut doc, dialog, false), Some(first));
        assert_eq!(trap_tab(&mut doc, dialog, false), Some(last));
        assert_eq!(trap_tab(&mut doc, dialog, true), Some(first));
    }

    #[test]
    fn test_empty_dialog_keeps_focus() {
        let mut doc = Document::new();
        let outside = doc.create_element("button");
        let dialog = doc.create_element("horizon-dialog");
        doc.append_child(doc.body(), outside).unwrap();
        doc.append_child(doc.body(), dialog).unwrap();
        doc.focus(outside);

        assert_eq!(trap_tab(&mut doc, dialog, false), None);
        assert_eq!(doc.active_element(), Some(outside));
    }

    #[test]
    fn test_autofocus_target() {
        let mut doc = Document::new();
        let dialog = doc.create_element("horizon-dialog");
        let plain = doc.create_element("button");
        let marked = doc.create_element("input");
        doc.append_child(doc.body(), dialog).unwrap();
        doc.append_child(dialog, plain).unwrap();
        doc.append_child(dialog, marked).unwrap();
        doc.toggle_attribute(marked, "autofocus", true);

        assert_eq!(autofocus_target(&doc, dialog), Some(marked));
    }
}

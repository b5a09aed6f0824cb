//! Keyboard dispatch of a tree.
//!
//! [`key_action`] maps a key press on the focused item to the action the
//! tree performs. It only reads the document, so it can be tested without
//! a container.

use horizon_composite_core::{Document, ElementId};

use crate::config::SelectionMode;
use crate::focus::{next_element, FocusDirection};
use crate::keyboard::Key;

use super::hierarchy::Hierarchy;

/// What a key press does to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeAction {
    /// Move focus to an item.
    Focus(ElementId),
    /// Expand an item.
    Expand(ElementId),
    /// Collapse an item.
    Collapse(ElementId),
    /// Flip the selection of an item.
    ToggleSelection(ElementId),
    /// Flip the expansion of an item.
    ToggleExpansion(ElementId),
}

/// Decide the action for `key` pressed on `current`.
///
/// Vertical movement runs over visible items in document order and does not
/// wrap. Returns `None` for keys the tree does not handle; a handled key
/// with nothing to do (ArrowDown on the last item) returns `Some(None)`.
pub fn key_action(
    doc: &Document,
    hierarchy: &Hierarchy,
    current: ElementId,
    key: Key,
    mode: SelectionMode,
) -> Option<Option<TreeAction>> {
    let visible = || hierarchy.visible_items(doc);
    let move_to = |direction| {
        next_element(doc, &visible(), Some(current), direction, false).map(TreeAction::Focus)
    };
    let has_children = hierarchy.has_children(current);
    let expanded = doc.has_attribute(current, "expanded");

    let action = match key {
        Key::ArrowDown => move_to(FocusDirection::Next),
        Key::ArrowUp => move_to(FocusDirection::Previous),
        Key::Home => move_to(FocusDirection::First),
        Key::End => move_to(FocusDirection::Last),
        Key::ArrowRight if has_children && !expanded => Some(TreeAction::Expand(current)),
        Key::ArrowRight if has_children => move_to(FocusDirection::Next),
        Key::ArrowRight => None,
        Key::ArrowLeft if has_children && expanded => Some(TreeAction::Collapse(current)),
        Key::ArrowLeft => hierarchy.parent(current).map(TreeAction::Focus),
        Key::Enter | Key::Space if mode == SelectionMode::None => {
            has_children.then_some(TreeAction::ToggleExpansion(current))
        }
        Key::Enter | Key::Space => Some(TreeAction::ToggleSelection(current)),
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TREE_ITEM_TAG;
    use crate::tree::TREE_TAG;

    /// tree > a(b, c), d
    fn setup() -> (Document, Hierarchy, [ElementId; 4]) {
        let mut doc = Document::new();
        let tree = doc.create_element(TREE_TAG);
        doc.append_child(doc.body(), tree).unwrap();
        let mut add = |parent: ElementId, nested: bool| {
            let id = doc.create_element(TREE_ITEM_TAG);
            if nested {
                doc.set_attribute(id, "slot", "children");
            }
            doc.append_child(parent, id).unwrap();
            id
        };
        let a = add(tree, false);
        let b = add(a, true);
        let c = add(a, true);
        let d = add(tree, false);
        let hierarchy = Hierarchy::build(&doc, tree);
        (doc, hierarchy, [a, b, c, d])
    }

    fn act(doc: &Document, h: &Hierarchy, current: ElementId, key: Key) -> Option<TreeAction> {
        key_action(doc, h, current, key, SelectionMode::Single).flatten()
    }

    #[test]
    fn test_vertical_movement_skips_collapsed_children() {
        let (doc, h, [a, _b, _c, d]) = setup();
        assert_eq!(act(&doc, &h, a, Key::ArrowDown), Some(TreeAction::Focus(d)));
        assert_eq!(act(&doc, &h, d, Key::ArrowDown), None);
        assert_eq!(act(&doc, &h, a, Key::ArrowUp), None);
        assert_eq!(act(&doc, &h, d, Key::Home), Some(TreeAction::Focus(a)));
    }

    #[test]
    fn test_right_expands_then_enters() {
        let (mut doc, h, [a, b, _c, d]) = setup();
        assert_eq!(act(&doc, &h, a, Key::ArrowRight), Some(TreeAction::Expand(a)));
        doc.toggle_attribute(a, "expanded", true);
        assert_eq!(act(&doc, &h, a, Key::ArrowRight), Some(TreeAction::Focus(b)));
        assert_eq!(act(&doc, &h, d, Key::ArrowRight), None);
        assert_eq!(act(&doc, &h, d, Key::End), Some(TreeAction::Focus(d)));
    }

    #[test]
    fn test_left_collapses_then_climbs() {
        let (mut doc, h, [a, _b, c, _d]) = setup();
        doc.toggle_attribute(a, "expanded", true);
        assert_eq!(act(&doc, &h, c, Key::ArrowLeft), Some(TreeAction::Focus(a)));
        assert_eq!(act(&doc, &h, a, Key::ArrowLeft), Some(TreeAction::Collapse(a)));
    }

    #[test]
    fn test_disabled_items_are_skipped() {
        let (mut doc, h, [a, b, c, _d]) = setup();
        doc.toggle_attribute(a, "expanded", true);
        doc.toggle_attribute(b, "disabled", true);
        assert_eq!(act(&doc, &h, a, Key::ArrowDown), Some(TreeAction::Focus(c)));
    }

    #[test]
    fn test_activation_depends_on_mode() {
        let (doc, h, [a, _b, _c, d]) = setup();
        assert_eq!(act(&doc, &h, d, Key::Space), Some(TreeAction::ToggleSelection(d)));
        assert_eq!(
            key_action(&doc, &h, a, Key::Enter, SelectionMode::None),
            Some(Some(TreeAction::ToggleExpansion(a)))
        );
        assert_eq!(key_action(&doc, &h, d, Key::Enter, SelectionMode::None), Some(None));
        assert_eq!(key_action(&doc, &h, d, Key::Character('x'), SelectionMode::Single), None);
    }
}

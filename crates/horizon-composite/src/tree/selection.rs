//! Selection rules of a tree.
//!
//! Every write here goes through [`Item::force_selection`], so none of it
//! produces item notifications. The tree announces the net effect once,
//! as `tree:selection-change`.

use horizon_composite_core::{Document, ElementId};

use crate::config::{SelectionMode, SelectionStrategy};
use crate::item::{Item, ItemKind};

use super::hierarchy::Hierarchy;

/// Selection options of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRules {
    /// Selection mode.
    pub mode: SelectionMode,
    /// Selectability strategy.
    pub strategy: SelectionStrategy,
    /// Restrict checkboxes to leaves under the leaf strategy.
    pub only_leaf_checkboxes: bool,
}

impl SelectionRules {
    /// Whether an item can be selected directly.
    ///
    /// Nothing is selectable without a selection mode. Under the leaf
    /// strategy, items with children are excluded in single mode, and in
    /// multiple mode when only leaves carry checkboxes.
    pub fn is_selectable(&self, has_children: bool) -> bool {
        let leaf_only = match self.mode {
            SelectionMode::None => return false,
            SelectionMode::Single => self.strategy == SelectionStrategy::Leaf,
            SelectionMode::Multiple => {
                self.strategy == SelectionStrategy::Leaf && self.only_leaf_checkboxes
            }
        };
        !(leaf_only && has_children)
    }

    /// Whether items show a tri-state checkbox.
    pub fn shows_checkbox(&self) -> bool {
        self.mode == SelectionMode::Multiple
    }
}

fn item(id: ElementId) -> Item {
    Item::of_kind(id, ItemKind::TreeItem)
}

/// Tri-state of a parent derived from its children.
///
/// All children selected and none mixed gives selected; none selected and
/// none mixed gives unselected; anything else is mixed.
pub fn derived_state(doc: &Document, children: &[ElementId]) -> (bool, bool) {
    let selected = |c: &ElementId| doc.has_attribute(*c, "selected");
    let mixed = |c: &ElementId| doc.has_attribute(*c, "indeterminate");

    if children.iter().all(|c| selected(c) && !mixed(c)) {
        (true, false)
    } else if children.iter().all(|c| !selected(c) && !mixed(c)) {
        (false, false)
    } else {
        (false, true)
    }
}

fn recompute(doc: &mut Document, hierarchy: &Hierarchy, node: ElementId) {
    let (selected, indeterminate) = derived_state(doc, hierarchy.children(node));
    item(node).force_selection(doc, selected, indeterminate);
}

/// Apply a selection change of `trigger` to the rest of the tree.
///
/// Selectable descendants follow the trigger, parent states inside the
/// trigger's subtree are re-derived bottom-up, then every ancestor is
/// re-derived up to the root.
pub fn propagate(doc: &mut Document, hierarchy: &Hierarchy, rules: &SelectionRules, trigger: ElementId) {
    let selected = doc.has_attribute(trigger, "selected");
    let descendants = hierarchy.descendants(trigger);

    for &d in &descendants {
        if rules.is_selectable(hierarchy.has_children(d)) {
            item(d).force_selection(doc, selected, false);
        }
    }
    for &d in descendants.iter().rev() {
        if hierarchy.has_children(d) {
            recompute(doc, hierarchy, d);
        }
    }
    for ancestor in hierarchy.ancestors(trigger) {
        recompute(doc, hierarchy, ancestor);
    }
}

/// Re-derive every parent from its children, deepest first.
pub fn recompute_all(doc: &mut Document, hierarchy: &Hierarchy) {
    for &node in hierarchy.preorder().iter().rev() {
        if hierarchy.has_children(node) {
            recompute(doc, hierarchy, node);
        }
    }
}

/// Leave `winner` as the only selected item.
pub fn select_only(doc: &mut Document, hierarchy: &Hierarchy, winner: Option<ElementId>) {
    for &node in hierarchy.preorder() {
        item(node).force_selection(doc, Some(node) == winner, false);
    }
}

/// Bring markup-provided selection in line with `rules`.
pub fn normalize(doc: &mut Document, hierarchy: &Hierarchy, rules: &SelectionRules) {
    match rules.mode {
        SelectionMode::None => select_only(doc, hierarchy, None),
        SelectionMode::Single => {
            let winner = hierarchy.preorder().iter().rev().copied().find(|&node| {
                doc.has_attribute(node, "selected")
                    && rules.is_selectable(hierarchy.has_children(node))
            });
            select_only(doc, hierarchy, winner);
        }
        SelectionMode::Multiple => {
            let marked: Vec<ElementId> = hierarchy
                .preorder()
                .iter()
                .copied()
                .filter(|&node| {
                    doc.has_attribute(node, "selected") && !doc.has_attribute(node, "indeterminate")
                })
                .collect();
            for node in marked {
                for d in hierarchy.descendants(node) {
                    if rules.is_selectable(hierarchy.has_children(d)) {
                        item(d).force_selection(doc, true, false);
                    }
                }
            }
            recompute_all(doc, hierarchy);
        }
    }
}

/// Selected items in document order.
pub fn selected_items(doc: &Document, hierarchy: &Hierarchy) -> Vec<ElementId> {
    hierarchy
        .preorder()
        .iter()
        .copied()
        .filter(|&node| doc.has_attribute(node, "selected"))
        .collect()
}

/// Whether two selections hold the same items, ignoring order.
pub fn same_selection(a: &[ElementId], b: &[ElementId]) -> bool {
    a.len() == b.len() && a.iter().all(|id| b.contains(id))
}

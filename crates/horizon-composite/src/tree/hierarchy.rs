//! Cached item hierarchy of a tree.
//!
//! The hierarchy is built once per structural change by walking the tree's
//! default slot for root items and each item's `children` slot for its
//! direct children. Lookups between rebuilds never touch the element tree.

use std::collections::HashMap;

use horizon_composite_core::{Document, ElementId};

use crate::composite::discover_items;
use crate::item::TREE_ITEM_TAG;

use super::TREE_TAG;

/// Position of one item in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Parent item, `None` for roots.
    pub parent: Option<ElementId>,
    /// Direct child items in document order.
    pub children: Vec<ElementId>,
    /// Depth, root = 1.
    pub level: usize,
    /// 1-based position among siblings.
    pub posinset: usize,
    /// Number of siblings, including the item.
    pub setsize: usize,
}

/// Item hierarchy of one tree.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    roots: Vec<ElementId>,
    nodes: HashMap<ElementId, TreeNode>,
    preorder: Vec<ElementId>,
}

impl Hierarchy {
    /// Walk the items under `host`.
    pub fn build(doc: &Document, host: ElementId) -> Self {
        let mut hierarchy = Self {
            roots: discover_items(doc, host, None, TREE_ITEM_TAG, TREE_TAG),
            ..Default::default()
        };
        let roots = hierarchy.roots.clone();
        hierarchy.add_siblings(doc, &roots, None, 1);
        hierarchy
    }

    fn add_siblings(
        &mut self,
        doc: &Document,
        siblings: &[ElementId],
        parent: Option<ElementId>,
        level: usize,
    ) {
        for (index, &item) in siblings.iter().enumerate() {
            // An item reachable twice would loop forever; keep the first.
            if self.nodes.contains_key(&item) {
                continue;
            }
            let children = discover_items(doc, item, Some("children"), TREE_ITEM_TAG, TREE_TAG);
            self.nodes.insert(
                item,
                TreeNode {
                    parent,
                    children: children.clone(),
                    level,
                    posinset: index + 1,
                    setsize: siblings.len(),
                },
            );
            self.preorder.push(item);
            self.add_siblings(doc, &children, Some(item), level + 1);
        }
    }

    /// Root items in document order.
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Every item, parents before children.
    pub fn preorder(&self) -> &[ElementId] {
        &self.preorder
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.preorder.len()
    }

    /// Whether the tree has no items.
    pub fn is_empty(&self) -> bool {
        self.preorder.is_empty()
    }

    /// Whether `item` belongs to this hierarchy.
    pub fn contains(&self, item: ElementId) -> bool {
        self.nodes.contains_key(&item)
    }

    /// Position data of `item`.
    pub fn node(&self, item: ElementId) -> Option<&TreeNode> {
        self.nodes.get(&item)
    }

    /// Parent item of `item`.
    pub fn parent(&self, item: ElementId) -> Option<ElementId> {
        self.nodes.get(&item).and_then(|n| n.parent)
    }

    /// Direct child items of `item`.
    pub fn children(&self, item: ElementId) -> &[ElementId] {
        self.nodes
            .get(&item)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `item` has child items.
    pub fn has_children(&self, item: ElementId) -> bool {
        !self.children(item).is_empty()
    }

    /// Every item below `item`, parents before children.
    pub fn descendants(&self, item: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.children(item).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Ancestor items of `item`, nearest first.
    pub fn ancestors(&self, item: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut current = self.parent(item);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Whether every ancestor of `item` is expanded.
    pub fn is_visible(&self, doc: &Document, item: ElementId) -> bool {
        self.ancestors(item)
            .iter()
            .all(|&a| doc.has_attribute(a, "expanded"))
    }

    /// Items whose ancestors are all expanded, in document order.
    pub fn visible_items(&self, doc: &Document) -> Vec<ElementId> {
        self.preorder
            .iter()
            .copied()
            .filter(|&item| self.is_visible(doc, item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(doc: &mut Document, parent: ElementId, slot: Option<&str>) -> ElementId {
        let id = doc.create_element(TREE_ITEM_TAG);
        if let Some(slot) = slot {
            doc.set_attribute(id, "slot", slot);
        }
        doc.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_levels_and_positions() {
        let mut doc = Document::new();
        let tree = doc.create_element(TREE_TAG);
        doc.append_child(doc.body(), tree).unwrap();
        let a = add(&mut doc, tree, None);
        let b = add(&mut doc, a, Some("children"));
        let c = add(&mut doc, a, Some("children"));
        let d = add(&mut doc, tree, None);

        let hierarchy = Hierarchy::build(&doc, tree);
        assert_eq!(hierarchy.roots(), &[a, d]);
        assert_eq!(hierarchy.preorder(), &[a, b, c, d]);

        let node = hierarchy.node(c).unwrap();
        assert_eq!((node.level, node.posinset, node.setsize), (2, 2, 2));
        assert_eq!(hierarchy.parent(c), Some(a));
        assert_eq!(hierarchy.descendants(a), vec![b, c]);
        assert_eq!(hierarchy.ancestors(b), vec![a]);
        assert!(!hierarchy.has_children(d));
    }

    #[test]
    fn test_items_outside_children_slot_are_ignored() {
        let mut doc = Document::new();
        let tree = doc.create_element(TREE_TAG);
        doc.append_child(doc.body(), tree).unwrap();
        let a = add(&mut doc, tree, None);
        add(&mut doc, a, None);

        let hierarchy = Hierarchy::build(&doc, tree);
        assert_eq!(hierarchy.len(), 1);
        assert!(!hierarchy.has_children(a));
    }

    #[test]
    fn test_visibility_follows_expansion() {
        let mut doc = Document::new();
        let tree = doc.create_element(TREE_TAG);
        doc.append_child(doc.body(), tree).unwrap();
        let a = add(&mut doc, tree, None);
        let b = add(&mut doc, a, Some("children"));

        let hierarchy = Hierarchy::build(&doc, tree);
        assert_eq!(hierarchy.visible_items(&doc), vec![a]);
        doc.toggle_attribute(a, "expanded", true);
        assert_eq!(hierarchy.visible_items(&doc), vec![a, b]);
    }
}

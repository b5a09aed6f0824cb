//! Tree: a hierarchical list with expandable nodes and selection.
//!
//! Root items sit in the tree's default slot; each item nests its children
//! in its own `children` slot. The tree caches the resulting
//! [`Hierarchy`] and rebuilds it on every slot change.
//!
//! # Selection
//!
//! | Mode       | Behaviour                                                  |
//! |------------|------------------------------------------------------------|
//! | `none`     | Nothing is selectable; activation toggles expansion.       |
//! | `single`   | At most one item is selected; the latest selection wins.   |
//! | `multiple` | Tri-state checkboxes; selection propagates up and down.    |
//!
//! The net effect of every change is announced once as
//! `tree:selection-change`, and only when the set of selected items
//! actually changed.
//!
//! # Focus
//!
//! The tree is a single tab stop. While focus is outside it, the host
//! element carries `tabindex="0"` and focusing it moves focus to the last
//! focused item (or the first enabled one). Inside, items use a roving
//! tabindex.

mod hierarchy;
mod navigation;
mod selection;

use std::any::Any;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{
    ChangeSet, CompositeError, Document, ElementId, Notification, NotificationDetail, Property,
    Result,
};

pub use hierarchy::{Hierarchy, TreeNode};
pub use navigation::{key_action, TreeAction};
pub use selection::{derived_state, SelectionRules};

use crate::accordion::bool_attribute;
use crate::aria::{self, AriaState};
use crate::composite::{owning_item, Composite, CompositeKind};
use crate::config::{SelectionMode, SelectionStrategy, TreeConfig};
use crate::focus::{next_element, set_roving_tabindex, FocusDirection};
use crate::item::{Item, ItemKind};
use crate::keyboard::KeyEvent;

/// Tag of tree containers.
pub const TREE_TAG: &str = "horizon-tree";

/// Hierarchy, selection and keyboard handling for a tree element.
pub struct Tree {
    element: ElementId,
    selection: Property<SelectionMode>,
    strategy: Property<SelectionStrategy>,
    only_leaf_checkboxes: Property<bool>,
    hierarchy: Hierarchy,
    last_selection: Vec<ElementId>,
    last_focused: Option<ElementId>,
    propagating: bool,
}

impl Tree {
    /// Bind tree behaviour to `element`.
    ///
    /// Options come from the `selection`, `strategy` and
    /// `only-leaf-checkboxes` attributes, falling back to `config`.
    pub fn new(doc: &Document, element: ElementId, config: &TreeConfig) -> Result<Self> {
        let tag = doc.tag(element).ok_or(CompositeError::InvalidElement)?;
        if tag != TREE_TAG {
            return Err(CompositeError::unexpected_tag(TREE_TAG, tag));
        }
        let selection = doc
            .attribute(element, "selection")
            .and_then(SelectionMode::parse)
            .unwrap_or(config.selection);
        let strategy = doc
            .attribute(element, "strategy")
            .and_then(SelectionStrategy::parse)
            .unwrap_or(config.strategy);
        let only_leaf_checkboxes = bool_attribute(
            doc,
            element,
            "only-leaf-checkboxes",
            config.only_leaf_checkboxes,
        );
        Ok(Self {
            element,
            selection: Property::new(selection),
            strategy: Property::new(strategy),
            only_leaf_checkboxes: Property::new(only_leaf_checkboxes),
            hierarchy: Hierarchy::default(),
            last_selection: Vec::new(),
            last_focused: None,
            propagating: false,
        })
    }

    /// The cached item hierarchy.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Every item, parents before children.
    pub fn items(&self) -> &[ElementId] {
        self.hierarchy.preorder()
    }

    /// Selection mode.
    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.get()
    }

    /// Selectability strategy.
    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy.get()
    }

    /// Current selection options.
    pub fn rules(&self) -> SelectionRules {
        SelectionRules {
            mode: self.selection.get(),
            strategy: self.strategy.get(),
            only_leaf_checkboxes: self.only_leaf_checkboxes.get(),
        }
    }

    /// Selected items in document order.
    pub fn selected_items(&self, doc: &Document) -> Vec<ElementId> {
        selection::selected_items(doc, &self.hierarchy)
    }

    /// The item that last had focus.
    pub fn last_focused(&self) -> Option<ElementId> {
        self.last_focused
    }

    /// Items whose ancestors are all expanded.
    pub fn visible_items(&self, doc: &Document) -> Vec<ElementId> {
        self.hierarchy.visible_items(doc)
    }

    /// Change the selection mode.
    pub fn set_selection_mode(&mut self, doc: &mut Document, mode: SelectionMode) {
        let mut changes = ChangeSet::new();
        if changes.track("selection", self.selection.set(mode)) {
            doc.set_attribute(self.element, "selection", mode.as_str());
        }
        self.updated(doc, &changes);
    }

    /// Change the selectability strategy.
    pub fn set_strategy(&mut self, doc: &mut Document, strategy: SelectionStrategy) {
        let mut changes = ChangeSet::new();
        if changes.track("strategy", self.strategy.set(strategy)) {
            doc.set_attribute(self.element, "strategy", strategy.as_str());
        }
        self.updated(doc, &changes);
    }

    /// Restrict checkboxes to leaves under the leaf strategy.
    pub fn set_only_leaf_checkboxes(&mut self, doc: &mut Document, only_leaves: bool) {
        let mut changes = ChangeSet::new();
        if changes.track("only-leaf-checkboxes", self.only_leaf_checkboxes.set(only_leaves)) {
            doc.toggle_attribute(self.element, "only-leaf-checkboxes", only_leaves);
        }
        self.updated(doc, &changes);
    }

    /// Post-update hook: re-derive item state when a selection option
    /// changed, announcing the resulting selection change.
    pub fn updated(&mut self, doc: &mut Document, changes: &ChangeSet) {
        if changes.is_empty() {
            return;
        }
        tracing::debug!(target: targets::TREE, changed = ?changes.names(), "options changed");
        self.derive(doc);
        self.emit_selection_change_if_needed(doc);
    }

    fn item(&self, id: ElementId) -> Item {
        Item::of_kind(id, ItemKind::TreeItem)
    }

    /// Assign position and selectability to every item, then bring the
    /// selection in line with the options.
    fn derive(&mut self, doc: &mut Document) {
        let rules = self.rules();
        let host = AriaState {
            role: Some("tree"),
            multiselectable: Some(rules.mode == SelectionMode::Multiple),
            ..Default::default()
        };
        aria::apply(doc, self.element, &host);

        for &id in self.hierarchy.preorder() {
            let Some(node) = self.hierarchy.node(id) else {
                continue;
            };
            let has_children = !node.children.is_empty();
            let (level, posinset, setsize) = (node.level, node.posinset, node.setsize);
            let item = self.item(id);
            item.ensure_parts(doc);
            item.update_properties(doc, |p| {
                p.has_children = has_children;
                p.level = level;
                p.posinset = posinset;
                p.setsize = setsize;
                p.selectable = rules.is_selectable(has_children);
                p.show_checkbox = rules.shows_checkbox();
            });
            item.sync_aria(doc);
        }

        self.propagating = true;
        selection::normalize(doc, &self.hierarchy, &rules);
        self.propagating = false;
    }

    /// React to `trigger` becoming `selected`. In single mode the state
    /// carried by the trigger is authoritative, so the last trigger of a
    /// flush wins.
    fn on_selection_changed(&mut self, doc: &mut Document, trigger: ElementId, selected: bool) {
        if self.propagating || !self.hierarchy.contains(trigger) {
            return;
        }
        let rules = self.rules();
        let selectable = rules.is_selectable(self.hierarchy.has_children(trigger));

        self.propagating = true;
        match rules.mode {
            SelectionMode::None => {
                self.item(trigger).force_selection(doc, false, false);
            }
            SelectionMode::Single if selected && selectable => {
                selection::select_only(doc, &self.hierarchy, Some(trigger));
            }
            SelectionMode::Single => {
                self.item(trigger).force_selection(doc, false, false);
            }
            SelectionMode::Multiple => {
                selection::propagate(doc, &self.hierarchy, &rules, trigger);
            }
        }
        self.propagating = false;

        self.emit_selection_change_if_needed(doc);
    }

    fn emit_selection_change_if_needed(&mut self, doc: &mut Document) {
        let current = self.selected_items(doc);
        if selection::same_selection(&current, &self.last_selection) {
            return;
        }
        tracing::debug!(target: targets::TREE, count = current.len(), "selection changed");
        self.last_selection = current.clone();
        let notification = doc
            .notification(self.element, "tree", "selection-change")
            .with_detail(NotificationDetail::Items(current));
        doc.queue_notification(notification);
    }

    /// Move focus out of a collapsed subtree onto its root.
    fn on_collapsed(&mut self, doc: &mut Document, item: ElementId) {
        let Some(active) = doc.active_element() else {
            return;
        };
        let focused = owning_item(doc, self.hierarchy.preorder(), active);
        if focused.is_some_and(|f| self.hierarchy.descendants(item).contains(&f)) {
            self.focus_item(doc, item);
        }
    }

    fn focus_item(&mut self, doc: &mut Document, item: ElementId) {
        self.set_tab_stop(doc, Some(item));
        if doc.focus(item) {
            self.last_focused = Some(item);
            doc.set_attribute(self.element, "tabindex", "-1");
        }
    }

    fn set_tab_stop(&self, doc: &mut Document, item: Option<ElementId>) {
        set_roving_tabindex(doc, self.hierarchy.preorder(), item);
    }

    fn toggle_selection(&self, doc: &mut Document, id: ElementId) {
        let item = self.item(id);
        if item.is_disabled(doc) || !item.properties(doc).selectable {
            return;
        }
        item.set_selected(doc, !item.is_selected(doc));
    }

    fn toggle_expansion(&self, doc: &mut Document, id: ElementId) {
        if self.hierarchy.has_children(id) && !self.item(id).is_disabled(doc) {
            self.item(id).toggle(doc);
        }
    }

    fn perform(&mut self, doc: &mut Document, action: TreeAction) {
        match action {
            TreeAction::Focus(item) => self.focus_item(doc, item),
            TreeAction::Expand(item) => {
                if !self.item(item).is_disabled(doc) {
                    self.item(item).open(doc);
                }
            }
            TreeAction::Collapse(item) => {
                if !self.item(item).is_disabled(doc) {
                    self.item(item).close(doc);
                    self.on_collapsed(doc, item);
                }
            }
            TreeAction::ToggleSelection(item) => self.toggle_selection(doc, item),
            TreeAction::ToggleExpansion(item) => self.toggle_expansion(doc, item),
        }
    }
}

impl Composite for Tree {
    fn element(&self) -> ElementId {
        self.element
    }

    fn kind(&self) -> CompositeKind {
        CompositeKind::Tree
    }

    fn slot_changed(&mut self, doc: &mut Document) {
        self.hierarchy = Hierarchy::build(doc, self.element);
        tracing::debug!(target: targets::TREE, count = self.hierarchy.len(), "hierarchy rebuilt");
        self.derive(doc);
        self.last_selection = self.selected_items(doc);

        if self.last_focused.is_some_and(|f| !self.hierarchy.contains(f)) {
            self.last_focused = None;
        }
        let focus_inside = doc
            .active_element()
            .is_some_and(|a| owning_item(doc, self.hierarchy.preorder(), a).is_some());
        if focus_inside {
            self.set_tab_stop(doc, self.last_focused);
        } else {
            self.set_tab_stop(doc, None);
            doc.set_attribute(self.element, "tabindex", "0");
        }
    }

    fn owns(&self, element: ElementId) -> bool {
        self.hierarchy.contains(element)
    }

    fn handle_notification(&mut self, doc: &mut Document, notification: &Notification) {
        if notification.namespace() != ItemKind::TreeItem.namespace() {
            return;
        }
        let item = notification.source();
        match notification.name() {
            "select" | "deselect" => {
                let selected = notification
                    .item()
                    .map_or_else(|| self.item(item).is_selected(doc), |snapshot| snapshot.selected);
                self.on_selection_changed(doc, item, selected);
            }
            "collapse" => self.on_collapsed(doc, item),
            _ => {}
        }
    }

    fn attribute_changed(&mut self, doc: &mut Document, element: ElementId, name: &str) {
        if !self.hierarchy.contains(element) {
            return;
        }
        self.item(element).sync_aria(doc);
        match name {
            "selected" => {
                if self.item(element).is_selected(doc) {
                    doc.toggle_attribute(element, "indeterminate", false);
                    self.item(element).sync_aria(doc);
                }
                let selected = self.item(element).is_selected(doc);
                self.on_selection_changed(doc, element, selected);
            }
            "expanded" if !self.item(element).is_expanded(doc) => self.on_collapsed(doc, element),
            _ => {}
        }
    }

    fn handle_key(&mut self, doc: &mut Document, target: ElementId, event: &mut KeyEvent) {
        if !self.hierarchy.contains(target) {
            return;
        }
        let Some(action) = key_action(doc, &self.hierarchy, target, event.key, self.selection_mode())
        else {
            return;
        };
        if let Some(action) = action {
            tracing::trace!(target: targets::TREE, ?action, "key action");
            self.perform(doc, action);
        }
        event.accept();
    }

    fn handle_click(&mut self, doc: &mut Document, target: ElementId) -> bool {
        let Some(id) = owning_item(doc, self.hierarchy.preorder(), target) else {
            return false;
        };
        let item = self.item(id);
        if item.is_disabled(doc) {
            return true;
        }
        let props = item.properties(doc);
        let on_expand_button = props
            .parts
            .expand_button
            .is_some_and(|button| doc.contains(button, target));

        if on_expand_button || (!props.selectable && props.has_children) {
            self.toggle_expansion(doc, id);
        } else {
            self.toggle_selection(doc, id);
        }
        self.focus_item(doc, id);
        true
    }

    fn focus_in(&mut self, doc: &mut Document, target: ElementId) {
        if target == self.element {
            let visible = self.hierarchy.visible_items(doc);
            let remembered = self.last_focused.filter(|&f| {
                visible.contains(&f) && !self.item(f).is_disabled(doc)
            });
            let destination = remembered
                .or_else(|| next_element(doc, &visible, None, FocusDirection::First, false));
            if let Some(item) = destination {
                self.focus_item(doc, item);
            }
            return;
        }
        if let Some(item) = owning_item(doc, self.hierarchy.preorder(), target) {
            self.last_focused = Some(item);
            self.set_tab_stop(doc, Some(item));
            doc.set_attribute(self.element, "tabindex", "-1");
        }
    }

    fn focus_out(&mut self, doc: &mut Document) {
        self.set_tab_stop(doc, None);
        doc.set_attribute(self.element, "tabindex", "0");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

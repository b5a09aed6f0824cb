//! Composite items.
//!
//! An [`Item`] is a handle to an element taking part in a composite: an
//! accordion item, a tab or a tree item. The item is the source of truth
//! for its own state, which is reflected as boolean attributes:
//!
//! | Attribute       | Accordion item | Tab | Tree item |
//! |-----------------|:--------------:|:---:|:---------:|
//! | `expanded`      | yes            |     | yes       |
//! | `selected`      |                | yes | yes       |
//! | `disabled`      | yes            | yes | yes       |
//! | `indeterminate` |                |     | yes       |
//!
//! Derived state that the owning container assigns (collapsibility,
//! selectability, tree position) is kept in [`ItemProperties`], a typed
//! dynamic property that is not reflected.
//!
//! Every user-visible state change queues a cancelable notification in the
//! item's namespace (`accordion-item:open`, `tree-item:select`, ...). The
//! notifications are delivered on the next microtask flush, after which the
//! owning container reacts to them. Calls that would not change state are
//! no-ops and queue nothing.

use std::sync::atomic::{AtomicU64, Ordering};

use horizon_composite_core::{Document, ElementId, ItemSnapshot, NotificationDetail};

use crate::aria::{self, AriaChecked, AriaState};
use crate::config::DEFAULT_HEADING_LEVEL;

/// Name of the dynamic property holding [`ItemProperties`].
pub const ITEM_PROPERTIES: &str = "composite-item";

/// Tag of accordion items.
pub const ACCORDION_ITEM_TAG: &str = "horizon-accordion-item";
/// Tag of tabs.
pub const TAB_TAG: &str = "horizon-tab";
/// Tag of tree items.
pub const TREE_ITEM_TAG: &str = "horizon-tree-item";

/// The kind of composite item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// An accordion item (expandable section).
    AccordionItem,
    /// A tab in a tab group.
    Tab,
    /// A node in a tree.
    TreeItem,
}

impl ItemKind {
    /// Element tag for this kind.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::AccordionItem => ACCORDION_ITEM_TAG,
            Self::Tab => TAB_TAG,
            Self::TreeItem => TREE_ITEM_TAG,
        }
    }

    /// Notification namespace for this kind.
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::AccordionItem => "accordion-item",
            Self::Tab => "tab",
            Self::TreeItem => "tree-item",
        }
    }

    /// Look up the kind of an element tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            ACCORDION_ITEM_TAG => Some(Self::AccordionItem),
            TAB_TAG => Some(Self::Tab),
            TREE_ITEM_TAG => Some(Self::TreeItem),
            _ => None,
        }
    }

    /// Whether items of this kind expand and collapse.
    pub const fn expands(self) -> bool {
        !matches!(self, Self::Tab)
    }

    /// Whether items of this kind can be selected.
    pub const fn selects(self) -> bool {
        !matches!(self, Self::AccordionItem)
    }

    /// Notification names for expanding and collapsing.
    const fn expand_names(self) -> (&'static str, &'static str) {
        match self {
            Self::AccordionItem => ("open", "close"),
            _ => ("expand", "collapse"),
        }
    }
}

/// Shadow parts of an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemParts {
    /// Accordion: heading wrapper carrying the heading level.
    pub heading: Option<ElementId>,
    /// Accordion: the header button that toggles the item.
    pub header: Option<ElementId>,
    /// Accordion: the collapsible content region.
    pub content: Option<ElementId>,
    /// Tree: the expand/collapse button.
    pub expand_button: Option<ElementId>,
    /// Tree: the selection checkbox.
    pub checkbox: Option<ElementId>,
}

/// Container-assigned state of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemProperties {
    /// Whether the user may close the item right now.
    pub collapsible: bool,
    /// Whether the item can be selected directly.
    pub selectable: bool,
    /// Whether the item shows a tri-state checkbox.
    pub show_checkbox: bool,
    /// Whether the item has child items.
    pub has_children: bool,
    /// Depth in a tree, root = 1.
    pub level: usize,
    /// 1-based position among siblings.
    pub posinset: usize,
    /// Number of siblings, including the item.
    pub setsize: usize,
    /// Accordion heading level (1 to 6).
    pub heading_level: u8,
    /// Shadow parts.
    pub parts: ItemParts,
}

impl Default for ItemProperties {
    fn default() -> Self {
        Self {
            collapsible: true,
            selectable: false,
            show_checkbox: false,
            has_children: false,
            level: 1,
            posinset: 1,
            setsize: 1,
            heading_level: DEFAULT_HEADING_LEVEL,
            parts: ItemParts::default(),
        }
    }
}

static NEXT_GENERATED_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a document-unique `id` attribute value.
pub fn generate_dom_id(prefix: &str) -> String {
    format!("{prefix}-{}", NEXT_GENERATED_ID.fetch_add(1, Ordering::Relaxed))
}

/// Return the element's `id`, assigning a generated one if it has none.
pub fn ensure_dom_id(doc: &mut Document, id: ElementId, prefix: &str) -> String {
    if let Some(existing) = doc.attribute(id, "id").filter(|v| !v.is_empty()) {
        return existing.to_string();
    }
    let generated = generate_dom_id(prefix);
    doc.set_attribute(id, "id", generated.clone());
    generated
}

/// Handle to a composite item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    id: ElementId,
    kind: ItemKind,
}

impl Item {
    /// Wrap an element whose tag is an item tag.
    pub fn new(doc: &Document, id: ElementId) -> Option<Self> {
        let kind = ItemKind::from_tag(doc.tag(id)?)?;
        Some(Self { id, kind })
    }

    /// Wrap an element known to be an item of `kind`.
    pub(crate) fn of_kind(id: ElementId, kind: ItemKind) -> Self {
        Self { id, kind }
    }

    /// The item element.
    pub fn id(&self) -> ElementId {
        self.id
    }

    /// The item kind.
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Whether the item is expanded.
    pub fn is_expanded(&self, doc: &Document) -> bool {
        doc.has_attribute(self.id, "expanded")
    }

    /// Whether the item is selected.
    pub fn is_selected(&self, doc: &Document) -> bool {
        doc.has_attribute(self.id, "selected")
    }

    /// Whether the item is disabled.
    pub fn is_disabled(&self, doc: &Document) -> bool {
        doc.has_attribute(self.id, "disabled")
    }

    /// Whether the item is in the mixed tri-state.
    pub fn is_indeterminate(&self, doc: &Document) -> bool {
        doc.has_attribute(self.id, "indeterminate")
    }

    /// Whether the user may close the item.
    pub fn is_collapsible(&self, doc: &Document) -> bool {
        self.properties(doc).collapsible
    }

    /// Container-assigned properties, or defaults if none were assigned.
    pub fn properties(&self, doc: &Document) -> ItemProperties {
        doc.property::<ItemProperties>(self.id, ITEM_PROPERTIES)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutate the container-assigned properties.
    pub fn update_properties(&self, doc: &mut Document, f: impl FnOnce(&mut ItemProperties)) {
        // The only failure is a destroyed element, which has nothing to update.
        let _ = doc.update_property::<ItemProperties, _>(self.id, ITEM_PROPERTIES, f);
    }

    /// Snapshot of the current state.
    pub fn snapshot(&self, doc: &Document) -> ItemSnapshot {
        ItemSnapshot {
            expanded: self.is_expanded(doc),
            selected: self.is_selected(doc),
            disabled: self.is_disabled(doc),
            indeterminate: self.is_indeterminate(doc),
            collapsible: self.is_collapsible(doc),
        }
    }

    // =========================================================================
    // User-facing transitions
    // =========================================================================

    /// Expand the item. Returns `true` if the state changed.
    pub fn open(&self, doc: &mut Document) -> bool {
        if !self.kind.expands() || self.is_expanded(doc) {
            return false;
        }
        self.write_expanded(doc, true)
    }

    /// Collapse the item. No-op while the container marks it non-collapsible.
    pub fn close(&self, doc: &mut Document) -> bool {
        if !self.kind.expands() || !self.is_expanded(doc) || !self.is_collapsible(doc) {
            return false;
        }
        self.write_expanded(doc, false)
    }

    /// Flip the expanded state.
    pub fn toggle(&self, doc: &mut Document) -> bool {
        if self.is_expanded(doc) {
            self.close(doc)
        } else {
            self.open(doc)
        }
    }

    /// Open or close.
    pub fn set_expanded(&self, doc: &mut Document, expanded: bool) -> bool {
        if expanded {
            self.open(doc)
        } else {
            self.close(doc)
        }
    }

    /// Select the item, clearing any mixed state.
    pub fn select(&self, doc: &mut Document) -> bool {
        self.set_selected(doc, true)
    }

    /// Deselect the item.
    pub fn deselect(&self, doc: &mut Document) -> bool {
        self.set_selected(doc, false)
    }

    /// Select or deselect. Returns `true` if the state changed.
    pub fn set_selected(&self, doc: &mut Document, selected: bool) -> bool {
        if !self.kind.selects() || self.is_selected(doc) == selected {
            return false;
        }
        doc.toggle_attribute(self.id, "selected", selected);
        doc.toggle_attribute(self.id, "indeterminate", false);
        self.sync_aria(doc);
        self.emit(doc, if selected { "select" } else { "deselect" });
        true
    }

    /// Disable the item. Its expanded state is left as it is.
    pub fn disable(&self, doc: &mut Document) -> bool {
        self.set_disabled(doc, true)
    }

    /// Enable the item.
    pub fn enable(&self, doc: &mut Document) -> bool {
        self.set_disabled(doc, false)
    }

    /// Disable or enable. Returns `true` if the state changed.
    pub fn set_disabled(&self, doc: &mut Document, disabled: bool) -> bool {
        if !doc.toggle_attribute(self.id, "disabled", disabled) {
            return false;
        }
        self.sync_aria(doc);
        self.emit(doc, if disabled { "disable" } else { "enable" });
        true
    }

    // =========================================================================
    // Container-side transitions
    // =========================================================================

    /// Set whether the user may close the item.
    pub fn set_collapsible(&self, doc: &mut Document, collapsible: bool) {
        if self.is_collapsible(doc) == collapsible {
            return;
        }
        self.update_properties(doc, |p| p.collapsible = collapsible);
        self.sync_aria(doc);
    }

    /// Expand or collapse regardless of collapsibility.
    ///
    /// With `notify` unset the change is applied silently, as for state
    /// derived while a container initializes.
    pub(crate) fn force_expanded(&self, doc: &mut Document, expanded: bool, notify: bool) -> bool {
        if !self.kind.expands() || self.is_expanded(doc) == expanded {
            return false;
        }
        if notify {
            return self.write_expanded(doc, expanded);
        }
        doc.toggle_attribute(self.id, "expanded", expanded);
        self.sync_aria(doc);
        true
    }

    /// Set the selection pair without notifying.
    pub(crate) fn force_selection(
        &self,
        doc: &mut Document,
        selected: bool,
        indeterminate: bool,
    ) -> bool {
        let mut changed = doc.toggle_attribute(self.id, "selected", selected);
        changed |= doc.toggle_attribute(self.id, "indeterminate", indeterminate);
        if changed {
            self.sync_aria(doc);
        }
        changed
    }

    fn write_expanded(&self, doc: &mut Document, expanded: bool) -> bool {
        doc.toggle_attribute(self.id, "expanded", expanded);
        self.sync_aria(doc);
        let (open, close) = self.kind.expand_names();
        self.emit(doc, if expanded { open } else { close });
        true
    }

    fn emit(&self, doc: &mut Document, name: &str) {
        let notification = doc
            .notification(self.id, self.kind.namespace(), name)
            .cancelable(true)
            .with_detail(NotificationDetail::Item(self.snapshot(doc)));
        doc.queue_notification(notification);
    }

    // =========================================================================
    // Parts and ARIA
    // =========================================================================

    /// Create the item's shadow parts if they do not exist yet.
    pub fn ensure_parts(&self, doc: &mut Document) {
        let mut parts = self.properties(doc).parts;
        match self.kind {
            ItemKind::AccordionItem if parts.header.is_none() => {
                let item_id = ensure_dom_id(doc, self.id, "horizon-accordion-item");
                let heading = doc.create_element("div");
                let header = doc.create_element("button");
                let content = doc.create_element("div");
                doc.set_attribute(heading, "part", "heading");
                doc.set_attribute(header, "part", "header");
                doc.set_attribute(header, "id", format!("{item_id}-header"));
                doc.set_attribute(header, "aria-controls", format!("{item_id}-content"));
                doc.set_attribute(content, "part", "content");
                doc.set_attribute(content, "id", format!("{item_id}-content"));
                doc.set_attribute(content, "role", "region");
                doc.set_attribute(content, "aria-labelledby", format!("{item_id}-header"));
                let _ = doc.attach_shadow_child(self.id, heading);
                let _ = doc.append_child(heading, header);
                let _ = doc.attach_shadow_child(self.id, content);
                parts.heading = Some(heading);
                parts.header = Some(header);
                parts.content = Some(content);
            }
            ItemKind::TreeItem if parts.expand_button.is_none() => {
                let expand_button = doc.create_element("span");
                let checkbox = doc.create_element("input");
                doc.set_attribute(expand_button, "part", "expand-button");
                doc.set_attribute(expand_button, "aria-hidden", "true");
                doc.set_attribute(checkbox, "part", "checkbox");
                doc.set_attribute(checkbox, "type", "checkbox");
                doc.set_attribute(checkbox, "tabindex", "-1");
                let _ = doc.attach_shadow_child(self.id, expand_button);
                let _ = doc.attach_shadow_child(self.id, checkbox);
                parts.expand_button = Some(expand_button);
                parts.checkbox = Some(checkbox);
            }
            _ => return,
        }
        self.update_properties(doc, |p| p.parts = parts);
        self.sync_aria(doc);
    }

    /// Re-project the item's state onto its ARIA attributes.
    pub fn sync_aria(&self, doc: &mut Document) {
        let props = self.properties(doc);
        let expanded = self.is_expanded(doc);
        let selected = self.is_selected(doc);
        let disabled = self.is_disabled(doc);
        let indeterminate = self.is_indeterminate(doc);

        match self.kind {
            ItemKind::AccordionItem => {
                if let Some(heading) = props.parts.heading {
                    let state = AriaState {
                        role: Some("heading"),
                        level: Some(usize::from(props.heading_level)),
                        ..Default::default()
                    };
                    aria::apply(doc, heading, &state);
                }
                if let Some(header) = props.parts.header {
                    let state = AriaState {
                        expanded: Some(expanded),
                        disabled: Some(disabled || (expanded && !props.collapsible)),
                        ..Default::default()
                    };
                    aria::apply(doc, header, &state);
                    doc.toggle_attribute(header, "disabled", disabled);
                }
                if let Some(content) = props.parts.content {
                    doc.toggle_attribute(content, "hidden", !expanded);
                }
            }
            ItemKind::Tab => {
                let state = AriaState {
                    role: Some("tab"),
                    selected: Some(selected),
                    disabled: Some(disabled),
                    ..Default::default()
                };
                aria::apply(doc, self.id, &state);
            }
            ItemKind::TreeItem => {
                let state = AriaState {
                    role: Some("treeitem"),
                    expanded: props.has_children.then_some(expanded),
                    selected: (props.selectable && !props.show_checkbox).then_some(selected),
                    checked: props
                        .show_checkbox
                        .then(|| AriaChecked::from_state(selected, indeterminate)),
                    disabled: Some(disabled),
                    level: Some(props.level),
                    posinset: Some(props.posinset),
                    setsize: Some(props.setsize),
                    ..Default::default()
                };
                aria::apply(doc, self.id, &state);
                if let Some(button) = props.parts.expand_button {
                    doc.toggle_attribute(button, "hidden", !props.has_children);
                }
                if let Some(checkbox) = props.parts.checkbox {
                    doc.toggle_attribute(checkbox, "hidden", !props.show_checkbox);
                    doc.toggle_attribute(checkbox, "checked", selected);
                    doc.toggle_attribute(checkbox, "indeterminate", indeterminate);
                    doc.toggle_attribute(checkbox, "disabled", disabled || !props.selectable);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(doc: &mut Document, kind: ItemKind) -> Item {
        let id = doc.create_element(kind.tag());
        doc.append_child(doc.body(), id).unwrap();
        let item = Item::new(doc, id).unwrap();
        item.ensure_parts(doc);
        item
    }

    fn names(doc: &mut Document) -> Vec<String> {
        doc.take_pending_notifications()
            .iter()
            .map(|n| n.qualified_name())
            .collect()
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::AccordionItem);

        assert!(item.open(&mut doc));
        assert!(!item.open(&mut doc));
        assert_eq!(names(&mut doc), vec!["accordion-item:open"]);
    }

    #[test]
    fn test_disable_is_idempotent_and_keeps_expanded() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::AccordionItem);
        item.open(&mut doc);
        doc.take_pending_notifications();

        assert!(item.disable(&mut doc));
        assert!(!item.disable(&mut doc));
        assert!(item.is_expanded(&doc));
        assert_eq!(names(&mut doc), vec!["accordion-item:disable"]);
    }

    #[test]
    fn test_close_respects_collapsible() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::AccordionItem);
        item.open(&mut doc);
        item.set_collapsible(&mut doc, false);

        assert!(!item.close(&mut doc));
        assert!(!item.toggle(&mut doc));
        assert!(item.is_expanded(&doc));

        assert!(item.force_expanded(&mut doc, false, false));
        assert!(!item.is_expanded(&doc));
        assert_eq!(names(&mut doc), vec!["accordion-item:open"]);
    }

    #[test]
    fn test_accordion_aria_follows_state() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::AccordionItem);
        let parts = item.properties(&doc).parts;
        let header = parts.header.unwrap();
        let content = parts.content.unwrap();

        assert_eq!(doc.attribute(header, "aria-expanded"), Some("false"));
        assert!(doc.has_attribute(content, "hidden"));

        item.open(&mut doc);
        assert_eq!(doc.attribute(header, "aria-expanded"), Some("true"));
        assert!(!doc.has_attribute(content, "hidden"));
        assert_eq!(doc.attribute(parts.heading.unwrap(), "aria-level"), Some("3"));

        item.set_collapsible(&mut doc, false);
        assert_eq!(doc.attribute(header, "aria-disabled"), Some("true"));
    }

    #[test]
    fn test_tree_item_checkbox_projection() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::TreeItem);
        item.update_properties(&mut doc, |p| {
            p.selectable = true;
            p.show_checkbox = true;
            p.level = 2;
        });
        item.force_selection(&mut doc, false, true);
        assert_eq!(doc.attribute(item.id(), "aria-checked"), Some("mixed"));
        assert!(!doc.has_attribute(item.id(), "aria-selected"));
        assert_eq!(doc.attribute(item.id(), "aria-level"), Some("2"));
        assert!(doc.take_pending_notifications().is_empty());

        item.select(&mut doc);
        assert_eq!(doc.attribute(item.id(), "aria-checked"), Some("true"));
        assert!(!item.is_indeterminate(&doc));
        assert_eq!(names(&mut doc), vec!["tree-item:select"]);
    }

    #[test]
    fn test_tab_does_not_expand() {
        let mut doc = Document::new();
        let tab = item(&mut doc, ItemKind::Tab);
        assert!(!tab.open(&mut doc));
        assert!(tab.select(&mut doc));
        assert_eq!(doc.attribute(tab.id(), "aria-selected"), Some("true"));
        assert_eq!(doc.attribute(tab.id(), "role"), Some("tab"));
    }

    #[test]
    fn test_notification_carries_snapshot() {
        let mut doc = Document::new();
        let item = item(&mut doc, ItemKind::TreeItem);
        item.open(&mut doc);
        let pending = doc.take_pending_notifications();
        let snapshot = pending[0].item().copied().unwrap();
        assert!(snapshot.expanded);
        assert!(pending[0].is_cancelable());
        assert!(pending[0].id().is_none());
    }
}

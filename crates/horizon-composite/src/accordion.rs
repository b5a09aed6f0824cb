//! Accordion: a vertically stacked set of expandable sections.
//!
//! The accordion finds its [`AccordionItem`](crate::item::ItemKind::AccordionItem)s
//! in its default slot and enforces its expansion policy over them:
//!
//! - `multiple`: any number of items may be open.
//! - otherwise at most one item is open; opening an item closes the others.
//! - `collapsible = false` (single mode): exactly one item is always open
//!   and that item cannot be closed by the user.
//!
//! Headers are buttons in each item's shadow tree. Arrow keys move focus
//! between enabled headers, wrapping at the ends; Home and End jump to the
//! first and last enabled header; Enter and Space toggle.

use std::any::Any;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{
    ChangeSet, CompositeError, Document, ElementId, Notification, NotificationDetail, Property,
    Result,
};

use crate::composite::{discover_items, owning_item, Composite, CompositeKind};
use crate::config::{AccordionConfig, DEFAULT_HEADING_LEVEL};
use crate::focus::{next_element, FocusDirection};
use crate::item::{Item, ItemKind, ACCORDION_ITEM_TAG};
use crate::keyboard::{Key, KeyEvent};

/// Tag of accordion containers.
pub const ACCORDION_TAG: &str = "horizon-accordion";

/// Read a boolean option attribute. `"false"` counts as off.
pub(crate) fn bool_attribute(doc: &Document, id: ElementId, name: &str, default: bool) -> bool {
    match doc.attribute(id, name) {
        None => default,
        Some(value) => !value.trim().eq_ignore_ascii_case("false"),
    }
}

/// Parse an item's `heading-level` attribute, falling back to `default`
/// when absent and to level 3 when invalid.
fn heading_level(doc: &Document, item: ElementId, default: u8) -> u8 {
    let Some(raw) = doc.attribute(item, "heading-level") else {
        return default;
    };
    match raw.trim().parse::<u8>() {
        Ok(level) if (1..=6).contains(&level) => level,
        _ => {
            tracing::warn!(
                target: targets::ACCORDION,
                ?item,
                value = raw,
                "invalid heading-level; using {DEFAULT_HEADING_LEVEL}"
            );
            DEFAULT_HEADING_LEVEL
        }
    }
}

/// Expansion policy and keyboard handling for an accordion element.
pub struct Accordion {
    element: ElementId,
    multiple: Property<bool>,
    collapsible: Property<bool>,
    default_heading_level: u8,
    wrap: bool,
    items: Vec<ElementId>,
    last_expanded: Vec<ElementId>,
}

impl Accordion {
    /// Bind accordion behaviour to `element`.
    ///
    /// Options come from the `multiple` and `collapsible` attributes, falling
    /// back to `config`. Items are not discovered until
    /// [`slot_changed`](Composite::slot_changed) runs.
    pub fn new(doc: &Document, element: ElementId, config: &AccordionConfig) -> Result<Self> {
        let tag = doc.tag(element).ok_or(CompositeError::InvalidElement)?;
        if tag != ACCORDION_TAG {
            return Err(CompositeError::unexpected_tag(ACCORDION_TAG, tag));
        }
        Ok(Self {
            element,
            multiple: Property::new(bool_attribute(doc, element, "multiple", config.multiple)),
            collapsible: Property::new(bool_attribute(
                doc,
                element,
                "collapsible",
                config.collapsible,
            )),
            default_heading_level: config.heading_level,
            wrap: config.wrap,
            items: Vec::new(),
            last_expanded: Vec::new(),
        })
    }

    /// The items found on the last slot change, in document order.
    pub fn items(&self) -> &[ElementId] {
        &self.items
    }

    /// Whether several items may be open at once.
    pub fn is_multiple(&self) -> bool {
        self.multiple.get()
    }

    /// Whether the last open item may be closed.
    pub fn is_collapsible(&self) -> bool {
        self.collapsible.get()
    }

    /// Currently expanded items, in document order.
    pub fn expanded_items(&self, doc: &Document) -> Vec<ElementId> {
        self.items
            .iter()
            .copied()
            .filter(|&id| doc.has_attribute(id, "expanded"))
            .collect()
    }

    /// Change the `multiple` option.
    pub fn set_multiple(&mut self, doc: &mut Document, multiple: bool) {
        let mut changes = ChangeSet::new();
        if changes.track("multiple", self.multiple.set(multiple)) {
            doc.toggle_attribute(self.element, "multiple", multiple);
        }
        self.updated(doc, &changes);
    }

    /// Change the `collapsible` option.
    pub fn set_collapsible(&mut self, doc: &mut Document, collapsible: bool) {
        let mut changes = ChangeSet::new();
        if changes.track("collapsible", self.collapsible.set(collapsible)) {
            doc.toggle_attribute(self.element, "collapsible", collapsible);
        }
        self.updated(doc, &changes);
    }

    /// Post-update hook: re-derive item state when a policy option changed.
    pub fn updated(&mut self, doc: &mut Document, changes: &ChangeSet) {
        if changes.contains("multiple") || changes.contains("collapsible") {
            tracing::debug!(target: targets::ACCORDION, changed = ?changes.names(), "options changed");
            self.derive_defaults(doc);
        }
    }

    fn item(&self, id: ElementId) -> Item {
        Item::of_kind(id, ItemKind::AccordionItem)
    }

    fn header(&self, doc: &Document, id: ElementId) -> Option<ElementId> {
        self.item(id).properties(doc).parts.header
    }

    fn derive_defaults(&mut self, doc: &mut Document) {
        if self.items.is_empty() {
            return;
        }
        let items = self.items.clone();

        if self.is_multiple() {
            for &id in &items {
                self.item(id).set_collapsible(doc, true);
            }
            return;
        }

        // Single mode: keep the first open item and close the rest. This is
        // derived state, so nothing is announced.
        let open: Vec<ElementId> = self.expanded_items(doc);
        for &extra in open.iter().skip(1) {
            self.item(extra).force_expanded(doc, false, false);
        }

        if self.is_collapsible() {
            for &id in &items {
                self.item(id).set_collapsible(doc, true);
            }
            return;
        }

        let keep = open.first().copied().unwrap_or(items[0]);
        for &id in &items {
            self.item(id).set_collapsible(doc, false);
        }
        self.item(keep).force_expanded(doc, true, false);
        tracing::debug!(target: targets::ACCORDION, ?keep, "pinned open item");
    }

    fn on_item_opened(&mut self, doc: &mut Document, opened: ElementId) {
        if self.is_multiple() || !doc.has_attribute(opened, "expanded") {
            return;
        }
        let items = self.items.clone();
        for &id in items.iter().filter(|&&id| id != opened) {
            self.item(id).force_expanded(doc, false, true);
        }
        if !self.is_collapsible() {
            for &id in &items {
                self.item(id).set_collapsible(doc, id != opened);
            }
        }
    }

    fn emit_change_if_needed(&mut self, doc: &mut Document) {
        let expanded = self.expanded_items(doc);
        if expanded == self.last_expanded {
            return;
        }
        self.last_expanded = expanded.clone();
        let notification = doc
            .notification(self.element, "accordion", "change")
            .with_detail(NotificationDetail::Items(expanded));
        doc.queue_notification(notification);
    }

    fn focus_header(&self, doc: &mut Document, item: ElementId) {
        if let Some(header) = self.header(doc, item) {
            doc.focus(header);
        }
    }
}

impl Composite for Accordion {
    fn element(&self) -> ElementId {
        self.element
    }

    fn kind(&self) -> CompositeKind {
        CompositeKind::Accordion
    }

    fn slot_changed(&mut self, doc: &mut Document) {
        self.items = discover_items(doc, self.element, None, ACCORDION_ITEM_TAG, ACCORDION_TAG);
        tracing::debug!(target: targets::ACCORDION, count = self.items.len(), "items discovered");

        for &id in &self.items {
            let item = self.item(id);
            item.ensure_parts(doc);
            let level = heading_level(doc, id, self.default_heading_level);
            item.update_properties(doc, |p| p.heading_level = level);
            item.sync_aria(doc);
        }
        self.derive_defaults(doc);
        self.last_expanded = self.expanded_items(doc);
    }

    fn owns(&self, element: ElementId) -> bool {
        self.items.contains(&element)
    }

    fn handle_notification(&mut self, doc: &mut Document, notification: &Notification) {
        if notification.namespace() != ItemKind::AccordionItem.namespace() {
            return;
        }
        match notification.name() {
            "open" => {
                self.on_item_opened(doc, notification.source());
                self.emit_change_if_needed(doc);
            }
            "close" => self.emit_change_if_needed(doc),
            _ => {}
        }
    }

    fn attribute_changed(&mut self, doc: &mut Document, element: ElementId, name: &str) {
        if !self.items.contains(&element) {
            return;
        }
        self.item(element).sync_aria(doc);
        if name != "expanded" {
            return;
        }
        let pinned = !self.is_multiple() && !self.is_collapsible();
        if pinned && self.expanded_items(doc).is_empty() {
            self.item(element).force_expanded(doc, true, false);
        } else {
            self.on_item_opened(doc, element);
        }
        self.emit_change_if_needed(doc);
    }

    fn handle_key(&mut self, doc: &mut Document, target: ElementId, event: &mut KeyEvent) {
        let Some(current) = owning_item(doc, &self.items, target) else {
            return;
        };
        if self.header(doc, current) != Some(target) {
            return;
        }

        let direction = match event.key {
            Key::ArrowDown | Key::ArrowRight => Some(FocusDirection::Next),
            Key::ArrowUp | Key::ArrowLeft => Some(FocusDirection::Previous),
            Key::Home => Some(FocusDirection::First),
            Key::End => Some(FocusDirection::Last),
            _ => None,
        };

        if let Some(direction) = direction {
            if let Some(next) = next_element(doc, &self.items, Some(current), direction, self.wrap) {
                self.focus_header(doc, next);
            }
            event.accept();
        } else if event.key.is_activation() {
            let item = self.item(current);
            if !item.is_disabled(doc) {
                item.toggle(doc);
            }
            event.accept();
        }
    }

    fn handle_click(&mut self, doc: &mut Document, target: ElementId) -> bool {
        let Some(current) = owning_item(doc, &self.items, target) else {
            return false;
        };
        let Some(header) = self.header(doc, current) else {
            return false;
        };
        if !doc.contains(header, target) {
            return false;
        }
        let item = self.item(current);
        if !item.is_disabled(doc) {
            item.toggle(doc);
            doc.focus(header);
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(count: usize) -> (Document, ElementId, Vec<ElementId>) {
        let mut doc = Document::new();
        let host = doc.create_element(ACCORDION_TAG);
        doc.append_child(doc.body(), host).unwrap();
        let items = (0..count)
            .map(|_| {
                let id = doc.create_element(ACCORDION_ITEM_TAG);
                doc.append_child(host, id).unwrap();
                id
            })
            .collect();
        (doc, host, items)
    }

    #[test]
    fn test_rejects_wrong_tag() {
        let (doc, _, items) = setup(1);
        let err = Accordion::new(&doc, items[0], &AccordionConfig::default()).err();
        assert!(matches!(err, Some(CompositeError::UnexpectedTag { .. })));
    }

    #[test]
    fn test_first_item_pinned_open_when_not_collapsible() {
        let (mut doc, host, items) = setup(3);
        let mut accordion = Accordion::new(&doc, host, &AccordionConfig::default()).unwrap();
        accordion.slot_changed(&mut doc);

        let item = |id| Item::of_kind(id, ItemKind::AccordionItem);
        assert!(item(items[0]).is_expanded(&doc));
        assert!(!item(items[0]).is_collapsible(&doc));
        for &id in &items[1..] {
            assert!(!item(id).is_expanded(&doc));
            assert!(!item(id).is_collapsible(&doc));
        }
    }

    #[test]
    fn test_markup_open_items_reduced_to_first() {
        let (mut doc, host, items) = setup(3);
        doc.toggle_attribute(items[1], "expanded", true);
        doc.toggle_attribute(items[2], "expanded", true);
        let mut accordion = Accordion::new(&doc, host, &AccordionConfig::default()).unwrap();
        accordion.slot_changed(&mut doc);

        assert_eq!(accordion.expanded_items(&doc), vec![items[1]]);
    }

    #[test]
    fn test_multiple_marks_all_collapsible() {
        let (mut doc, host, items) = setup(2);
        doc.toggle_attribute(host, "multiple", true);
        let mut accordion = Accordion::new(&doc, host, &AccordionConfig::default()).unwrap();
        accordion.slot_changed(&mut doc);

        assert!(accordion.is_multiple());
        assert!(accordion.expanded_items(&doc).is_empty());
        assert!(items
            .iter()
            .all(|&id| Item::of_kind(id, ItemKind::AccordionItem).is_collapsible(&doc)));
    }

    #[test]
    fn test_invalid_heading_level_falls_back() {
        let (mut doc, host, items) = setup(2);
        doc.set_attribute(items[0], "heading-level", "5");
        doc.set_attribute(items[1], "heading-level", "12");
        let mut accordion = Accordion::new(&doc, host, &AccordionConfig::default()).unwrap();
        accordion.slot_changed(&mut doc);

        let level = |id| {
            let heading = Item::of_kind(id, ItemKind::AccordionItem)
                .properties(&doc)
                .parts
                .heading
                .unwrap();
            doc.attribute(heading, "aria-level").map(str::to_string)
        };
        assert_eq!(level(items[0]).as_deref(), Some("5"));
        assert_eq!(level(items[1]).as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_accordion_is_noop() {
        let (mut doc, host, _) = setup(0);
        let mut accordion = Accordion::new(&doc, host, &AccordionConfig::default()).unwrap();
        accordion.slot_changed(&mut doc);
        accordion.set_collapsible(&mut doc, true);
        assert!(accordion.items().is_empty());
        assert!(!doc.has_pending_notifications());
    }

    #[test]
    fn test_bool_attribute() {
        let (mut doc, host, _) = setup(0);
        assert!(bool_attribute(&doc, host, "multiple", true));
        doc.set_attribute(host, "multiple", "false");
        assert!(!bool_attribute(&doc, host, "multiple", true));
        doc.set_attribute(host, "multiple", "");
        assert!(bool_attribute(&doc, host, "multiple", false));
    }
}

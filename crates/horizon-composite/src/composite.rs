//! The container side of the composite protocol.
//!
//! A container ([`Accordion`](crate::Accordion), [`TabGroup`](crate::TabGroup),
//! [`Tree`](crate::Tree)) implements [`Composite`]. The [`Page`](crate::Page)
//! owns the containers and calls into them when:
//!
//! - the light DOM under them changes ([`Composite::slot_changed`]),
//! - a notification from one of their items has been delivered and not
//!   cancelled ([`Composite::handle_notification`]),
//! - an item attribute was written from outside
//!   ([`Composite::attribute_changed`]),
//! - a key press or click lands inside them,
//! - focus enters or leaves them.
//!
//! Items are found by containment, never by registration: see
//! [`discover_items`].

use std::any::Any;

use horizon_composite_core::{Document, ElementId, Notification};

use crate::keyboard::KeyEvent;

/// The kind of a registered container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    /// An accordion.
    Accordion,
    /// A tab group.
    TabGroup,
    /// A tree.
    Tree,
}

/// Behaviour bound to a container element.
pub trait Composite: Send {
    /// The host element.
    fn element(&self) -> ElementId;

    /// The container kind.
    fn kind(&self) -> CompositeKind;

    /// Re-discover items and re-derive their state after a structural change.
    fn slot_changed(&mut self, doc: &mut Document);

    /// Whether `element` is one of this container's own items.
    fn owns(&self, element: ElementId) -> bool;

    /// React to a delivered, uncancelled notification from an owned item.
    fn handle_notification(&mut self, doc: &mut Document, notification: &Notification);

    /// An attribute of an owned item was written directly, bypassing the
    /// item's own transitions.
    fn attribute_changed(&mut self, _doc: &mut Document, _element: ElementId, _name: &str) {}

    /// Handle a key pressed while `target` has focus. Accepts the event if
    /// it was consumed.
    fn handle_key(&mut self, doc: &mut Document, target: ElementId, event: &mut KeyEvent);

    /// Handle a click on `target`. Returns `true` if the click was consumed.
    fn handle_click(&mut self, _doc: &mut Document, _target: ElementId) -> bool {
        false
    }

    /// Focus moved to `target` inside the container.
    fn focus_in(&mut self, _doc: &mut Document, _target: ElementId) {}

    /// Focus left the container.
    fn focus_out(&mut self, _doc: &mut Document) {}

    /// Get this as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Get this as mutable Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Find the items of a container in the given slot of `host`.
///
/// Assigned elements are walked recursively in document order, flattening
/// through wrapper elements. Recursion stops at an item (it is collected)
/// and at a nested container with `container_tag` (its items belong to it).
pub fn discover_items(
    doc: &Document,
    host: ElementId,
    slot: Option<&str>,
    item_tag: &str,
    container_tag: &str,
) -> Vec<ElementId> {
    let mut found = Vec::new();
    for child in doc.assigned_elements(host, slot) {
        collect(doc, child, item_tag, container_tag, &mut found);
    }
    found
}

fn collect(
    doc: &Document,
    element: ElementId,
    item_tag: &str,
    container_tag: &str,
    found: &mut Vec<ElementId>,
) {
    match doc.tag(element) {
        Some(tag) if tag == item_tag => found.push(element),
        Some(tag) if tag == container_tag => {}
        Some(_) => {
            for &child in doc.children(element) {
                collect(doc, child, item_tag, container_tag, found);
            }
        }
        None => {}
    }
}

/// The nearest inclusive ancestor of `target` that is in `items`.
pub fn owning_item(doc: &Document, items: &[ElementId], target: ElementId) -> Option<ElementId> {
    std::iter::once(target)
        .chain(doc.ancestors(target))
        .find(|e| items.contains(e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(doc: &mut Document, parent: ElementId, tag: &str) -> ElementId {
        let id = doc.create_element(tag);
        doc.append_child(parent, id).unwrap();
        id
    }

    #[test]
    fn test_discovery_flattens_wrappers_and_stops_at_nested_container() {
        let mut doc = Document::new();
        let body = doc.body();
        let outer = add(&mut doc, body, "horizon-accordion");
        let first = add(&mut doc, outer, "horizon-accordion-item");
        let wrapper = add(&mut doc, outer, "div");
        let wrapped = add(&mut doc, wrapper, "horizon-accordion-item");
        let inner = add(&mut doc, wrapped, "horizon-accordion");
        add(&mut doc, inner, "horizon-accordion-item");
        let sibling_inner = add(&mut doc, wrapper, "horizon-accordion");
        add(&mut doc, sibling_inner, "horizon-accordion-item");

        let items = discover_items(&doc, outer, None, "horizon-accordion-item", "horizon-accordion");
        assert_eq!(items, vec![first, wrapped]);
    }

    #[test]
    fn test_discovery_respects_slot() {
        let mut doc = Document::new();
        let body = doc.body();
        let group = add(&mut doc, body, "horizon-tab-group");
        let tab = add(&mut doc, group, "horizon-tab");
        doc.set_attribute(tab, "slot", "nav");
        add(&mut doc, group, "horizon-tab");

        let nav = discover_items(&doc, group, Some("nav"), "horizon-tab", "horizon-tab-group");
        assert_eq!(nav, vec![tab]);
    }

    #[test]
    fn test_owning_item() {
        let mut doc = Document::new();
        let body = doc.body();
        let item = add(&mut doc, body, "horizon-accordion-item");
        let header = doc.create_element("button");
        doc.attach_shadow_child(item, header).unwrap();

        assert_eq!(owning_item(&doc, &[item], header), Some(item));
        assert_eq!(owning_item(&doc, &[item], doc.body()), None);
    }
}

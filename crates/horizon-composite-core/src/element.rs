//! Element tree for Horizon Composite.
//!
//! [`Document`] is a small arena-backed model of the light DOM the composite
//! widgets operate on:
//!
//! - Stable [`ElementId`] handles via slotmap storage
//! - Parent-child relationships, with a separate list of shadow children per
//!   host so focus and containment queries can cross shadow boundaries
//! - String attributes (the reflected state of every item lives here)
//! - Typed dynamic properties for derived state that is not reflected
//! - The active (focused) element and the page scroll lock
//!
//! Structural mutation returns [`Result`]; lookups on missing elements return
//! `None` or an empty list so callers degrade gracefully.
//!
//! # Example
//!
//! ```
//! use horizon_composite_core::Document;
//!
//! let mut doc = Document::new();
//! let list = doc.create_element("div");
//! doc.append_child(doc.body(), list).unwrap();
//!
//! let button = doc.create_element("button");
//! doc.append_child(list, button).unwrap();
//!
//! assert!(doc.contains(list, button));
//! assert!(doc.focus(button));
//! assert_eq!(doc.active_element(), Some(button));
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};

use slotmap::{new_key_type, SlotMap};

use crate::error::{CompositeError, Result};
use crate::logging::targets;
use crate::notify::Notification;
use crate::signal::Signal;

new_key_type! {
    /// A unique identifier for an element in a [`Document`].
    ///
    /// `ElementId`s are stable handles that remain valid while the element
    /// moves around the tree. They become invalid when the element is
    /// destroyed.
    pub struct ElementId;
}

/// Tags that are focusable without an explicit `tabindex`.
const NATIVE_FOCUSABLE_TAGS: &[&str] = &["button", "input", "select", "textarea", "summary"];

/// Internal data stored for each element.
struct ElementData {
    tag: String,
    parent: Option<ElementId>,
    /// Light DOM children.
    children: Vec<ElementId>,
    /// Children living in this element's shadow tree.
    shadow_children: Vec<ElementId>,
    /// Whether this element lives in its parent's shadow tree.
    in_shadow: bool,
    attributes: BTreeMap<String, String>,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ElementData {
    fn new(tag: String) -> Self {
        Self {
            tag,
            parent: None,
            children: Vec::new(),
            shadow_children: Vec::new(),
            in_shadow: false,
            attributes: BTreeMap::new(),
            properties: HashMap::new(),
        }
    }
}

/// The element tree together with focus and notification state.
pub struct Document {
    elements: SlotMap<ElementId, ElementData>,
    body: ElementId,
    active_element: Option<ElementId>,
    scroll_locked: bool,
    pub(crate) listeners: HashMap<ElementId, Signal<Notification>>,
    pub(crate) pending: VecDeque<Notification>,
}

impl Document {
    /// Create an empty document containing only a `body` element.
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let body = elements.insert(ElementData::new("body".to_string()));
        Self {
            elements,
            body,
            active_element: None,
            scroll_locked: false,
            listeners: HashMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// The root `body` element.
    #[inline]
    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        let tag = tag.into().to_ascii_lowercase();
        let id = self.elements.insert(ElementData::new(tag));
        tracing::trace!(target: targets::DOCUMENT, ?id, "created element");
        id
    }

    /// Check if an element exists.
    pub fn exists(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of live elements, including the body.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append `child` to the light children of `parent`, moving it if it is
    /// already attached elsewhere.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.prepare_insert(parent, child)?;
        if let Some(data) = self.elements.get_mut(parent) {
            data.children.push(child);
        }
        self.finish_insert(parent, child, false);
        Ok(())
    }

    /// Insert `child` into `parent` before `reference`.
    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: ElementId,
    ) -> Result<()> {
        if !self.children(parent).contains(&reference) {
            return Err(CompositeError::NotAChild { parent, reference });
        }
        self.prepare_insert(parent, child)?;
        if let Some(data) = self.elements.get_mut(parent) {
            let pos = data
                .children
                .iter()
                .position(|&c| c == reference)
                .unwrap_or(data.children.len());
            data.children.insert(pos, child);
        }
        self.finish_insert(parent, child, false);
        Ok(())
    }

    /// Append `child` to the shadow tree of `host`.
    pub fn attach_shadow_child(&mut self, host: ElementId, child: ElementId) -> Result<()> {
        self.prepare_insert(host, child)?;
        if let Some(data) = self.elements.get_mut(host) {
            data.shadow_children.push(child);
        }
        self.finish_insert(host, child, true);
        Ok(())
    }

    fn prepare_insert(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if !self.exists(parent) || !self.exists(child) {
            return Err(CompositeError::InvalidElement);
        }
        if self.contains(child, parent) {
            return Err(CompositeError::CircularParentage);
        }
        self.unlink(child);
        Ok(())
    }

    fn finish_insert(&mut self, parent: ElementId, child: ElementId, in_shadow: bool) {
        if let Some(data) = self.elements.get_mut(child) {
            data.parent = Some(parent);
            data.in_shadow = in_shadow;
        }
    }

    /// Remove an element from its parent without destroying it.
    pub fn detach(&mut self, id: ElementId) -> Result<()> {
        if !self.exists(id) {
            return Err(CompositeError::InvalidElement);
        }
        self.unlink(id);
        if let Some(active) = self.active_element
            && self.contains(id, active)
        {
            self.active_element = None;
        }
        Ok(())
    }

    fn unlink(&mut self, id: ElementId) {
        let Some(parent) = self.elements.get(id).and_then(|d| d.parent) else {
            return;
        };
        if let Some(parent_data) = self.elements.get_mut(parent) {
            parent_data.children.retain(|&c| c != id);
            parent_data.shadow_children.retain(|&c| c != id);
        }
        if let Some(data) = self.elements.get_mut(id) {
            data.parent = None;
            data.in_shadow = false;
        }
    }

    /// Destroy an element and its whole subtree, shadow children included.
    pub fn destroy(&mut self, id: ElementId) -> Result<()> {
        if id == self.body {
            return Err(CompositeError::InvalidElement);
        }
        self.detach(id)?;
        let doomed = self.composed_preorder(id);
        tracing::trace!(target: targets::DOCUMENT, ?id, count = doomed.len(), "destroying subtree");
        for element in doomed {
            self.elements.remove(element);
            self.listeners.remove(&element);
        }
        Ok(())
    }

    /// Parent of an element (the shadow host for shadow children).
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id).and_then(|d| d.parent)
    }

    /// Light children of an element.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map(|d| d.children.as_slice())
            .unwrap_or(&[])
    }

    /// Shadow children of an element.
    pub fn shadow_children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(id)
            .map(|d| d.shadow_children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the element lives in its parent's shadow tree.
    pub fn is_in_shadow(&self, id: ElementId) -> bool {
        self.elements.get(id).is_some_and(|d| d.in_shadow)
    }

    /// Tag name of an element, lower-cased.
    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.elements.get(id).map(|d| d.tag.as_str())
    }

    /// Check the tag of an element.
    pub fn has_tag(&self, id: ElementId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    /// All ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            result.push(ancestor);
            current = self.parent(ancestor);
        }
        result
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(element) = current {
            if self.has_tag(element, tag) {
                return Some(element);
            }
            current = self.parent(element);
        }
        None
    }

    /// Whether `node` is `ancestor` or one of its (composed) descendants.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(element) = current {
            if element == ancestor {
                return true;
            }
            current = self.parent(element);
        }
        false
    }

    /// Whether the element is attached to the body.
    pub fn is_connected(&self, id: ElementId) -> bool {
        self.exists(id) && self.contains(self.body, id)
    }

    /// Depth-first pre-order traversal across shadow boundaries.
    ///
    /// Each element is visited before its shadow children, which are visited
    /// before its light children.
    pub fn composed_preorder(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        self.composed_preorder_into(id, &mut result);
        result
    }

    fn composed_preorder_into(&self, id: ElementId, result: &mut Vec<ElementId>) {
        let Some(data) = self.elements.get(id) else {
            return;
        };
        result.push(id);
        for &child in &data.shadow_children {
            self.composed_preorder_into(child, result);
        }
        for &child in &data.children {
            self.composed_preorder_into(child, result);
        }
    }

    /// Light children of `host` assigned to a slot.
    ///
    /// `None` selects the default slot (children without a `slot` attribute).
    pub fn assigned_elements(&self, host: ElementId, slot: Option<&str>) -> Vec<ElementId> {
        self.children(host)
            .iter()
            .copied()
            .filter(|&child| {
                let assigned = self.attribute(child, "slot").filter(|s| !s.is_empty());
                assigned == slot
            })
            .collect()
    }

    /// Find a connected element by its `id` attribute.
    pub fn element_by_dom_id(&self, dom_id: &str) -> Option<ElementId> {
        self.composed_preorder(self.body)
            .into_iter()
            .find(|&e| self.attribute(e, "id") == Some(dom_id))
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Get an attribute value.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements
            .get(id)
            .and_then(|d| d.attributes.get(name))
            .map(String::as_str)
    }

    /// Check if an attribute is present.
    pub fn has_attribute(&self, id: ElementId, name: &str) -> bool {
        self.elements
            .get(id)
            .is_some_and(|d| d.attributes.contains_key(name))
    }

    /// Set an attribute, returning `true` if the stored value changed.
    ///
    /// Missing elements are ignored and report `false`.
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: impl Into<String>) -> bool {
        let Some(data) = self.elements.get_mut(id) else {
            return false;
        };
        let value = value.into();
        if data.attributes.get(name) == Some(&value) {
            return false;
        }
        tracing::trace!(target: targets::DOCUMENT, ?id, name, value = %value, "set attribute");
        data.attributes.insert(name.to_string(), value);
        true
    }

    /// Remove an attribute, returning `true` if it was present.
    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        let removed = self
            .elements
            .get_mut(id)
            .is_some_and(|d| d.attributes.remove(name).is_some());
        if removed {
            tracing::trace!(target: targets::DOCUMENT, ?id, name, "removed attribute");
        }
        removed
    }

    /// Force a boolean attribute on or off, returning `true` if it changed.
    pub fn toggle_attribute(&mut self, id: ElementId, name: &str, force: bool) -> bool {
        if !force {
            return self.remove_attribute(id, name);
        }
        // Presence is the state; an existing value is left untouched.
        let Some(data) = self.elements.get_mut(id) else {
            return false;
        };
        if data.attributes.contains_key(name) {
            return false;
        }
        tracing::trace!(target: targets::DOCUMENT, ?id, name, "set boolean attribute");
        data.attributes.insert(name.to_string(), String::new());
        true
    }

    /// Attribute names and values of an element, in name order.
    pub fn attributes(&self, id: ElementId) -> Vec<(&str, &str)> {
        self.elements
            .get(id)
            .map(|d| {
                d.attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Dynamic properties
    // =========================================================================

    /// Store a typed, non-reflected property on an element.
    pub fn set_property<T: Any + Send + Sync>(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        value: T,
    ) -> Result<()> {
        let data = self
            .elements
            .get_mut(id)
            .ok_or(CompositeError::InvalidElement)?;
        data.properties.insert(name.into(), Box::new(value));
        Ok(())
    }

    /// Read a typed property. Returns `None` if missing or of another type.
    pub fn property<T: Any>(&self, id: ElementId, name: &str) -> Option<&T> {
        self.elements
            .get(id)
            .and_then(|d| d.properties.get(name))
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// Mutate a typed property in place, inserting `T::default()` first if
    /// it is missing or of another type.
    pub fn update_property<T, F>(&mut self, id: ElementId, name: &str, f: F) -> Result<()>
    where
        T: Any + Send + Sync + Default,
        F: FnOnce(&mut T),
    {
        let data = self
            .elements
            .get_mut(id)
            .ok_or(CompositeError::InvalidElement)?;
        let slot = data
            .properties
            .entry(name.to_string())
            .or_insert_with(|| Box::new(T::default()));
        if !slot.is::<T>() {
            *slot = Box::new(T::default());
        }
        if let Some(value) = slot.downcast_mut::<T>() {
            f(value);
        }
        Ok(())
    }

    /// Remove a property, returning whether it existed.
    pub fn remove_property(&mut self, id: ElementId, name: &str) -> bool {
        self.elements
            .get_mut(id)
            .is_some_and(|d| d.properties.remove(name).is_some())
    }

    // =========================================================================
    // Focus
    // =========================================================================

    /// Parsed `tabindex` attribute.
    pub fn tab_index(&self, id: ElementId) -> Option<i32> {
        self.attribute(id, "tabindex")
            .and_then(|v| v.trim().parse::<i32>().ok())
    }

    /// Whether the element or one of its ancestors is inert.
    pub fn is_inert(&self, id: ElementId) -> bool {
        self.has_attribute(id, "inert") || self.ancestors(id).iter().any(|&a| self.has_attribute(a, "inert"))
    }

    /// Whether the element or one of its ancestors is hidden.
    pub fn is_hidden(&self, id: ElementId) -> bool {
        self.has_attribute(id, "hidden") || self.ancestors(id).iter().any(|&a| self.has_attribute(a, "hidden"))
    }

    /// Whether the element can receive focus programmatically.
    pub fn is_focusable(&self, id: ElementId) -> bool {
        let Some(tag) = self.tag(id) else {
            return false;
        };
        if !self.is_connected(id)
            || self.has_attribute(id, "disabled")
            || self.is_hidden(id)
            || self.is_inert(id)
        {
            return false;
        }
        let native = NATIVE_FOCUSABLE_TAGS.contains(&tag)
            || (tag == "a" && self.has_attribute(id, "href"));
        native || self.tab_index(id).is_some()
    }

    /// Whether the element takes part in sequential (Tab) navigation.
    pub fn is_tabbable(&self, id: ElementId) -> bool {
        self.is_focusable(id) && self.tab_index(id).is_none_or(|t| t >= 0)
    }

    /// The element that currently has focus.
    #[inline]
    pub fn active_element(&self) -> Option<ElementId> {
        self.active_element
    }

    /// Move focus to an element. Returns `false` if it cannot take focus.
    pub fn focus(&mut self, id: ElementId) -> bool {
        if !self.is_focusable(id) {
            tracing::trace!(target: targets::FOCUS, ?id, "element is not focusable");
            return false;
        }
        if self.active_element != Some(id) {
            tracing::trace!(target: targets::FOCUS, from = ?self.active_element, to = ?id, "focus moved");
            self.active_element = Some(id);
        }
        true
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        self.active_element = None;
    }

    /// Whether page scrolling is currently locked (an overlay is open).
    #[inline]
    pub fn is_scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    /// Lock or restore page scrolling.
    pub fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(Document: Send);

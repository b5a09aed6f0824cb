//! Open dialog stack.
//!
//! [`DialogStack`] tracks the modal dialogs that are currently open, most
//! recently opened on top. The top dialog is the only one that answers
//! Escape, traps Tab and stays reachable; everything around it is marked
//! inert.
//!
//! The stack is a service object rather than global state: a
//! [`Page`](crate::Page) creates one, or the host injects its own through a
//! [`SharedDialogStack`] and keeps a handle to inspect it. Element ids are
//! per document, so one stack serves one document. Tests reset it with
//! [`DialogStack::reset`].
//!
//! # Usage
//!
//! ```
//! use horizon_composite::dialog::DialogStack;
//! use horizon_composite_core::Document;
//!
//! let mut doc = Document::new();
//! let first = doc.create_element("horizon-dialog");
//! let second = doc.create_element("horizon-dialog");
//!
//! let mut stack = DialogStack::new();
//! stack.register(first);
//! stack.register(second);
//! assert_eq!(stack.top(), Some(second));
//! assert_eq!(stack.z_index_of(second), Some(1010));
//! ```

use std::sync::Arc;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{Document, ElementId};
use parking_lot::Mutex;

use super::inert;

/// A dialog stack shared between pages.
pub type SharedDialogStack = Arc<Mutex<DialogStack>>;

/// One open dialog.
#[derive(Debug, Clone)]
struct StackEntry {
    dialog: ElementId,
    /// Elements this stack marked inert while the dialog was on top.
    inert: Vec<ElementId>,
}

/// Ordered collection of open dialogs.
#[derive(Debug, Clone)]
pub struct DialogStack {
    entries: Vec<StackEntry>,
    instances: usize,
    base_z_index: u32,
    z_index_step: u32,
}

impl DialogStack {
    /// Create an empty stack with the default z-index scheme.
    pub fn new() -> Self {
        Self::with_z_index(1000, 10)
    }

    /// Create an empty stack placing the bottom dialog at `base` and each
    /// further dialog `step` above the previous one.
    pub fn with_z_index(base: u32, step: u32) -> Self {
        Self {
            entries: Vec::new(),
            instances: 0,
            base_z_index: base,
            z_index_step: step,
        }
    }

    /// Create a stack that can be shared between pages.
    pub fn shared() -> SharedDialogStack {
        Arc::new(Mutex::new(Self::new()))
    }

    // =========================================================================
    // Instances
    // =========================================================================

    /// Count a newly defined dialog element.
    pub fn add_instance(&mut self) -> usize {
        self.instances += 1;
        if self.instances == 1 {
            tracing::debug!(target: targets::DIALOG, "document-level dialog keys enabled");
        }
        self.instances
    }

    /// Forget a dialog element that is no longer defined.
    pub fn remove_instance(&mut self) -> usize {
        self.instances = self.instances.saturating_sub(1);
        if self.instances == 0 {
            tracing::debug!(target: targets::DIALOG, "document-level dialog keys disabled");
        }
        self.instances
    }

    /// Number of defined dialog elements, open or not.
    pub fn instance_count(&self) -> usize {
        self.instances
    }

    /// Whether document-level dialog keys (Escape, Tab trapping) apply.
    pub fn handles_document_keys(&self) -> bool {
        self.instances > 0
    }

    // =========================================================================
    // Stack
    // =========================================================================

    /// Push `dialog` on top. Returns `false` if it is already open.
    pub fn register(&mut self, dialog: ElementId) -> bool {
        if self.contains(dialog) {
            return false;
        }
        self.entries.push(StackEntry {
            dialog,
            inert: Vec::new(),
        });
        tracing::debug!(target: targets::DIALOG, ?dialog, depth = self.entries.len(), "dialog opened");
        true
    }

    /// Remove `dialog`, lifting the inert marks it placed. Returns `false`
    /// if it was not open.
    pub fn unregister(&mut self, doc: &mut Document, dialog: ElementId) -> bool {
        let Some(position) = self.entries.iter().position(|e| e.dialog == dialog) else {
            return false;
        };
        let entry = self.entries.remove(position);
        inert::release(doc, &entry.inert);
        tracing::debug!(target: targets::DIALOG, ?dialog, depth = self.entries.len(), "dialog closed");
        true
    }

    /// The topmost dialog.
    pub fn top(&self) -> Option<ElementId> {
        self.entries.last().map(|e| e.dialog)
    }

    /// Whether `dialog` is open.
    pub fn contains(&self, dialog: ElementId) -> bool {
        self.entries.iter().any(|e| e.dialog == dialog)
    }

    /// Open dialogs, bottom first.
    pub fn dialogs(&self) -> Vec<ElementId> {
        self.entries.iter().map(|e| e.dialog).collect()
    }

    /// Number of open dialogs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dialog is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 1-based stacking level of `dialog`.
    pub fn level_of(&self, dialog: ElementId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.dialog == dialog)
            .map(|index| index + 1)
    }

    /// z-index of `dialog`.
    pub fn z_index_of(&self, dialog: ElementId) -> Option<u32> {
        self.level_of(dialog).map(|level| self.z_index_at(level - 1))
    }

    fn z_index_at(&self, index: usize) -> u32 {
        let offset = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_z_index
            .saturating_add(self.z_index_step.saturating_mul(offset))
    }

    /// Empty the stack and forget every instance. Inert marks are left in
    /// place; call [`clear_inert`](Self::clear_inert) first to lift them.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.instances = 0;
    }

    // =========================================================================
    // Document effects
    // =========================================================================

    /// Write `data-level` and `data-z-index` onto every open dialog.
    pub fn apply_levels(&self, doc: &mut Document) {
        for (index, entry) in self.entries.iter().enumerate() {
            let z_index = self.z_index_at(index);
            doc.set_attribute(entry.dialog, "data-level", (index + 1).to_string());
            doc.set_attribute(entry.dialog, "data-z-index", z_index.to_string());
        }
    }

    /// Lift every inert mark this stack placed.
    pub fn clear_inert(&mut self, doc: &mut Document) {
        for entry in &mut self.entries {
            inert::release(doc, &entry.inert);
            entry.inert.clear();
        }
    }

    /// Make everything around the top dialog inert, lifting the marks of
    /// dialogs further down first.
    pub fn apply_inert(&mut self, doc: &mut Document) {
        self.clear_inert(doc);
        let Some(top) = self.entries.last_mut() else {
            return;
        };
        let background = inert::background_of(doc, top.dialog);
        top.inert = inert::mark(doc, &background);
        tracing::trace!(
            target: targets::DIALOG,
            dialog = ?top.dialog,
            count = top.inert.len(),
            "background made inert"
        );
    }
}

impl Default for DialogStack {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(DialogStack: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog(doc: &mut Document) -> ElementId {
        let id = doc.create_element("horizon-dialog");
        doc.append_child(doc.body(), id).unwrap();
        id
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut doc = Document::new();
        let d = dialog(&mut doc);
        let mut stack = DialogStack::new();
        assert!(stack.register(d));
        assert!(!stack.register(d));
        assert_eq!(stack.len(), 1);
        assert!(stack.unregister(&mut doc, d));
        assert!(!stack.unregister(&mut doc, d));
    }

    #[test]
    fn test_levels_and_z_index() {
        let mut doc = Document::new();
        let d1 = dialog(&mut doc);
        let d2 = dialog(&mut doc);
        let mut stack = DialogStack::new();
        stack.register(d1);
        stack.register(d2);
        stack.apply_levels(&mut doc);

        assert_eq!(stack.level_of(d2), Some(2));
        assert_eq!(stack.z_index_of(d1), Some(1000));
        assert_eq!(doc.attribute(d2, "data-level"), Some("2"));
        assert_eq!(doc.attribute(d2, "data-z-index"), Some("1010"));
    }

    #[test]
    fn test_inert_follows_top() {
        let mut doc = Document::new();
        let content = doc.create_element("main");
        doc.append_child(doc.body(), content).unwrap();
        let d1 = dialog(&mut doc);
        let d2 = dialog(&mut doc);
        let mut stack = DialogStack::new();

        stack.register(d1);
        stack.apply_inert(&mut doc);
        assert!(doc.is_inert(content));
        assert!(doc.is_inert(d2));
        assert!(!doc.is_inert(d1));

        stack.register(d2);
        stack.apply_inert(&mut doc);
        assert!(doc.is_inert(d1));
        assert!(!doc.is_inert(d2));

        stack.unregister(&mut doc, d2);
        stack.apply_inert(&mut doc);
        assert!(!doc.is_inert(d1));
        assert!(doc.is_inert(content));

        stack.unregister(&mut doc, d1);
        stack.apply_inert(&mut doc);
        assert!(!doc.is_inert(content));
        assert!(!doc.is_inert(d2));
    }

    #[test]
    fn test_instances_gate_document_keys() {
        let mut stack = DialogStack::new();
        assert!(!stack.handles_document_keys());
        stack.add_instance();
        stack.add_instance();
        stack.remove_instance();
        assert!(stack.handles_document_keys());
        stack.remove_instance();
        stack.remove_instance();
        assert_eq!(stack.instance_count(), 0);
    }
}

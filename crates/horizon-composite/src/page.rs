//! The page host.
//!
//! A [`Page`] owns a [`Document`], the composites bound to its elements and
//! the two deferred queues that stand in for a browser event loop:
//!
//! - the **microtask** queue, flushed by [`Page::run_microtasks`]: queued
//!   notifications are delivered to listeners and then to the composite
//!   owning their source, and posted tasks run;
//! - the **animation-frame** queue, run by [`Page::run_animation_frame`]:
//!   dialog transitions start here.
//!
//! Input entry points ([`key_down`](Page::key_down), [`click`](Page::click),
//! [`focus`](Page::focus)) handle the event synchronously and then run a
//! microtask checkpoint, so a composite's corrective reaction to a user
//! action is visible as soon as the call returns. Programmatic changes made
//! through the document or the item API take effect on the next
//! [`run_microtasks`](Page::run_microtasks).
//!
//! # Example
//!
//! ```
//! use horizon_composite::{Item, Page, ACCORDION_ITEM_TAG, ACCORDION_TAG};
//!
//! let mut page = Page::new();
//! let doc = page.document_mut();
//! let accordion = doc.create_element(ACCORDION_TAG);
//! doc.append_child(doc.body(), accordion).unwrap();
//! let items: Vec<_> = (0..2)
//!     .map(|_| {
//!         let item = doc.create_element(ACCORDION_ITEM_TAG);
//!         doc.append_child(accordion, item).unwrap();
//!         item
//!     })
//!     .collect();
//! page.define_accordion(accordion).unwrap();
//!
//! // Not collapsible: the first item is pinned open.
//! assert!(page.document().has_attribute(items[0], "expanded"));
//!
//! let second = Item::new(page.document(), items[1]).unwrap();
//! second.open(page.document_mut());
//! page.run_microtasks();
//! assert!(!page.document().has_attribute(items[0], "expanded"));
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{
    CompositeError, Document, ElementId, Notification, Result, TaskId, TaskQueue,
};
use parking_lot::Mutex;

use crate::accordion::{bool_attribute, Accordion};
use crate::composite::Composite;
use crate::config::{
    Activation, CompositeConfig, Orientation, SelectionMode, SelectionStrategy,
};
use crate::dialog::{trap_tab, CloseSource, Dialog, DialogStack, SharedDialogStack};
use crate::focus::cycle_focus;
use crate::keyboard::{Key, KeyEvent};
use crate::tab_group::TabGroup;
use crate::tree::Tree;

/// Rounds after which a microtask checkpoint gives up on reaching quiescence.
const MAX_MICROTASK_ROUNDS: usize = 1000;

/// A document with composite behaviour bound to its elements.
pub struct Page {
    document: Document,
    config: CompositeConfig,
    composites: HashMap<ElementId, Box<dyn Composite>>,
    dialogs: HashMap<ElementId, Dialog>,
    dialog_stack: SharedDialogStack,
    microtasks: TaskQueue<Page>,
    animation_frames: TaskQueue<Page>,
}

impl Page {
    /// Create a page with default configuration.
    pub fn new() -> Self {
        Self::with_config(CompositeConfig::default())
    }

    /// Create a page with the given configuration.
    pub fn with_config(config: CompositeConfig) -> Self {
        let config = config.validated();
        let stack = DialogStack::with_z_index(config.dialog.base_z_index, config.dialog.z_index_step);
        Self {
            document: Document::new(),
            config,
            composites: HashMap::new(),
            dialogs: HashMap::new(),
            dialog_stack: Arc::new(Mutex::new(stack)),
            microtasks: TaskQueue::new(),
            animation_frames: TaskQueue::new(),
        }
    }

    /// Use `stack` instead of the page's own dialog stack.
    pub fn with_dialog_stack(mut self, stack: SharedDialogStack) -> Self {
        self.dialog_stack = stack;
        self
    }

    /// The document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The document, for structural and attribute changes.
    ///
    /// Report structural changes with [`slot_changed`](Self::slot_changed)
    /// and direct attribute writes with
    /// [`attribute_changed`](Self::attribute_changed).
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The configuration.
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    /// The dialog stack service.
    pub fn dialog_stack(&self) -> SharedDialogStack {
        self.dialog_stack.clone()
    }

    // =========================================================================
    // Definition
    // =========================================================================

    fn ensure_undefined(&self, element: ElementId) -> Result<()> {
        if !self.document.exists(element) {
            return Err(CompositeError::InvalidElement);
        }
        if self.composites.contains_key(&element) || self.dialogs.contains_key(&element) {
            return Err(CompositeError::AlreadyDefined(element));
        }
        Ok(())
    }

    fn define(&mut self, mut composite: Box<dyn Composite>) {
        let element = composite.element();
        tracing::debug!(target: targets::PAGE, ?element, kind = ?composite.kind(), "composite defined");
        composite.slot_changed(&mut self.document);
        self.composites.insert(element, composite);
    }

    /// Bind accordion behaviour to `element`.
    pub fn define_accordion(&mut self, element: ElementId) -> Result<()> {
        self.ensure_undefined(element)?;
        let accordion = Accordion::new(&self.document, element, &self.config.accordion)?;
        self.define(Box::new(accordion));
        Ok(())
    }

    /// Bind tab group behaviour to `element`.
    pub fn define_tab_group(&mut self, element: ElementId) -> Result<()> {
        self.ensure_undefined(element)?;
        let group = TabGroup::new(&self.document, element, &self.config.tab_group)?;
        self.define(Box::new(group));
        Ok(())
    }

    /// Bind tree behaviour to `element`.
    pub fn define_tree(&mut self, element: ElementId) -> Result<()> {
        self.ensure_undefined(element)?;
        let tree = Tree::new(&self.document, element, &self.config.tree)?;
        self.define(Box::new(tree));
        Ok(())
    }

    /// Bind dialog behaviour to `element`. A dialog marked `open` in markup
    /// is shown right away.
    pub fn define_dialog(&mut self, element: ElementId) -> Result<()> {
        self.ensure_undefined(element)?;
        let dialog = Dialog::new(&mut self.document, element, &self.config.dialog)?;
        self.dialog_stack.lock().add_instance();
        self.dialogs.insert(element, dialog);
        tracing::debug!(target: targets::PAGE, ?element, "dialog defined");

        if self.document.remove_attribute(element, "open") {
            self.show_dialog(element);
        }
        Ok(())
    }

    /// Remove the behaviour bound to `element`. An open dialog is hidden
    /// first. Returns `false` if nothing was bound.
    pub fn undefine(&mut self, element: ElementId) -> bool {
        if self.composites.remove(&element).is_some() {
            return true;
        }
        if !self.dialogs.contains_key(&element) {
            return false;
        }
        self.hide_dialog(element);
        if let Some(mut dialog) = self.dialogs.remove(&element) {
            dialog.finish_transition(&mut self.document);
        }
        self.dialog_stack.lock().remove_instance();
        true
    }

    // =========================================================================
    // Typed access
    // =========================================================================

    fn composite_as<T: 'static>(&self, element: ElementId) -> Option<&T> {
        self.composites.get(&element)?.as_any().downcast_ref()
    }

    /// The accordion bound to `element`.
    pub fn accordion(&self, element: ElementId) -> Option<&Accordion> {
        self.composite_as(element)
    }

    /// The accordion bound to `element`, with the document, for option
    /// changes.
    pub fn accordion_mut(&mut self, element: ElementId) -> Option<(&mut Accordion, &mut Document)> {
        let accordion = self.composites.get_mut(&element)?.as_any_mut().downcast_mut()?;
        Some((accordion, &mut self.document))
    }

    /// The tab group bound to `element`.
    pub fn tab_group(&self, element: ElementId) -> Option<&TabGroup> {
        self.composite_as(element)
    }

    /// The tab group bound to `element`, with the document.
    pub fn tab_group_mut(&mut self, element: ElementId) -> Option<(&mut TabGroup, &mut Document)> {
        let group = self.composites.get_mut(&element)?.as_any_mut().downcast_mut()?;
        Some((group, &mut self.document))
    }

    /// The tree bound to `element`.
    pub fn tree(&self, element: ElementId) -> Option<&Tree> {
        self.composite_as(element)
    }

    /// The tree bound to `element`, with the document.
    pub fn tree_mut(&mut self, element: ElementId) -> Option<(&mut Tree, &mut Document)> {
        let tree = self.composites.get_mut(&element)?.as_any_mut().downcast_mut()?;
        Some((tree, &mut self.document))
    }

    /// The dialog bound to `element`.
    pub fn dialog(&self, element: ElementId) -> Option<&Dialog> {
        self.dialogs.get(&element)
    }

    /// Composites whose host is `element` or one of its ancestors,
    /// innermost first.
    fn composites_containing(&self, element: ElementId) -> Vec<ElementId> {
        if !self.document.exists(element) {
            return Vec::new();
        }
        std::iter::once(element)
            .chain(self.document.ancestors(element))
            .filter(|id| self.composites.contains_key(id))
            .collect()
    }

    // =========================================================================
    // Structural and attribute changes
    // =========================================================================

    /// Report that the light children under `element` changed. Every
    /// composite containing it re-derives, innermost first.
    pub fn slot_changed(&mut self, element: ElementId) {
        for id in self.composites_containing(element) {
            if let Some(composite) = self.composites.get_mut(&id) {
                composite.slot_changed(&mut self.document);
            }
        }
    }

    /// Report a direct write of attribute `name` on `element`.
    ///
    /// On a composite or dialog host this re-reads the matching option; on
    /// an item it lets the owning container correct its state.
    pub fn attribute_changed(&mut self, element: ElementId, name: &str) {
        if self.dialogs.contains_key(&element) {
            self.dialog_attribute_changed(element, name);
            return;
        }
        if self.composites.contains_key(&element) {
            self.host_attribute_changed(element, name);
        }
        for id in self.composites_containing(element) {
            if let Some(composite) = self.composites.get_mut(&id)
                && composite.owns(element)
            {
                composite.attribute_changed(&mut self.document, element, name);
            }
        }
    }

    fn host_attribute_changed(&mut self, element: ElementId, name: &str) {
        let config = self.config.clone();
        if let Some((accordion, doc)) = self.accordion_mut(element) {
            match name {
                "multiple" => {
                    let value = bool_attribute(doc, element, name, config.accordion.multiple);
                    accordion.set_multiple(doc, value);
                }
                "collapsible" => {
                    let value = bool_attribute(doc, element, name, config.accordion.collapsible);
                    accordion.set_collapsible(doc, value);
                }
                _ => {}
            }
        } else if let Some((group, doc)) = self.tab_group_mut(element) {
            match name {
                "activation" => {
                    let value = doc
                        .attribute(element, name)
                        .and_then(Activation::parse)
                        .unwrap_or(config.tab_group.activation);
                    group.set_activation(doc, value);
                }
                "orientation" => {
                    let value = doc
                        .attribute(element, name)
                        .and_then(Orientation::parse)
                        .unwrap_or(config.tab_group.orientation);
                    group.set_orientation(doc, value);
                }
                _ => {}
            }
        } else if let Some((tree, doc)) = self.tree_mut(element) {
            match name {
                "selection" => {
                    let value = doc
                        .attribute(element, name)
                        .and_then(SelectionMode::parse)
                        .unwrap_or(config.tree.selection);
                    tree.set_selection_mode(doc, value);
                }
                "strategy" => {
                    let value = doc
                        .attribute(element, name)
                        .and_then(SelectionStrategy::parse)
                        .unwrap_or(config.tree.strategy);
                    tree.set_strategy(doc, value);
                }
                "only-leaf-checkboxes" => {
                    let value =
                        bool_attribute(doc, element, name, config.tree.only_leaf_checkboxes);
                    tree.set_only_leaf_checkboxes(doc, value);
                }
                _ => {}
            }
        }
    }

    fn dialog_attribute_changed(&mut self, element: ElementId, name: &str) {
        let config = self.config.dialog.clone();
        match name {
            "open" => {
                let Some(dialog) = self.dialogs.get(&element) else {
                    return;
                };
                // `open` is written by show/hide too; only act on a mismatch
                // with the stack.
                let in_stack = self.dialog_stack.lock().contains(element);
                let marked = dialog.is_open(&self.document);
                if marked && !in_stack {
                    self.document.remove_attribute(element, "open");
                    self.show_dialog(element);
                } else if !marked && in_stack {
                    self.document.toggle_attribute(element, "open", true);
                    self.hide_dialog(element);
                }
            }
            "dismissable" | "animated" => {
                let Some(dialog) = self.dialogs.get_mut(&element) else {
                    return;
                };
                let doc = &mut self.document;
                if name == "dismissable" {
                    let value = bool_attribute(doc, element, name, config.dismissable);
                    dialog.set_dismissable(doc, value);
                } else {
                    let value = bool_attribute(doc, element, name, config.animated);
                    dialog.set_animated(doc, value);
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Deliver a key press to the focused element.
    ///
    /// Escape and Tab are resolved at the document level first: Escape asks
    /// the top dialog to close and Tab is trapped inside it. Other keys go
    /// to the composites containing the focused element, innermost first,
    /// until one consumes them. Returns `true` if the key was consumed.
    pub fn key_down(&mut self, event: KeyEvent) -> bool {
        let mut event = event;
        let previous = self.document.active_element();

        let (handles_keys, top) = {
            let stack = self.dialog_stack.lock();
            (stack.handles_document_keys(), stack.top())
        };
        if handles_keys && let Some(top) = top {
            match event.key {
                Key::Escape => {
                    let close = self
                        .dialogs
                        .get(&top)
                        .is_some_and(|d| d.request_close(&self.document, CloseSource::Keyboard));
                    if close {
                        self.hide_dialog(top);
                        event.accept();
                    }
                }
                Key::Tab => {
                    trap_tab(&mut self.document, top, event.modifiers.shift);
                    event.accept();
                }
                _ => {}
            }
        }

        if !event.is_accepted() && event.key == Key::Tab {
            let body = self.document.body();
            if cycle_focus(&mut self.document, body, event.modifiers.shift).is_some() {
                event.accept();
            }
        }

        if !event.is_accepted()
            && let Some(target) = previous
        {
            for id in self.composites_containing(target) {
                if let Some(composite) = self.composites.get_mut(&id) {
                    composite.handle_key(&mut self.document, target, &mut event);
                }
                if event.is_accepted() {
                    break;
                }
            }
        }

        tracing::trace!(target: targets::PAGE, key = ?event.key, accepted = event.is_accepted(), "key handled");
        self.sync_focus(previous);
        self.run_microtasks();
        event.is_accepted()
    }

    /// Deliver a click on `target`. Returns `true` if a composite or dialog
    /// consumed it.
    ///
    /// Clicks on inert content are dropped. A click that nothing consumes
    /// focuses its target when the target is focusable.
    pub fn click(&mut self, target: ElementId) -> bool {
        if !self.document.exists(target) || self.document.is_inert(target) {
            return false;
        }
        let previous = self.document.active_element();
        let mut consumed = false;

        let backdrop = self
            .dialogs
            .iter()
            .find(|(_, d)| d.is_backdrop(target))
            .map(|(&id, _)| id);
        if let Some(dialog) = backdrop {
            consumed = true;
            let close = self
                .dialogs
                .get(&dialog)
                .is_some_and(|d| d.request_close(&self.document, CloseSource::Backdrop));
            if close {
                self.hide_dialog(dialog);
            }
        } else {
            for id in self.composites_containing(target) {
                if let Some(composite) = self.composites.get_mut(&id)
                    && composite.handle_click(&mut self.document, target)
                {
                    consumed = true;
                    break;
                }
            }
        }

        if !consumed && self.document.is_focusable(target) {
            self.document.focus(target);
        }
        self.sync_focus(previous);
        self.run_microtasks();
        consumed
    }

    /// Move focus to `target`. Returns `false` if it cannot take focus.
    pub fn focus(&mut self, target: ElementId) -> bool {
        let previous = self.document.active_element();
        let focused = self.document.focus(target);
        self.sync_focus(previous);
        self.run_microtasks();
        focused
    }

    /// Clear focus.
    pub fn blur(&mut self) {
        let previous = self.document.active_element();
        self.document.blur();
        self.sync_focus(previous);
    }

    /// Tell composites about a focus move from `previous` to the current
    /// active element.
    fn sync_focus(&mut self, previous: Option<ElementId>) {
        let current = self.document.active_element();
        if current == previous {
            return;
        }
        let entered = current
            .map(|c| self.composites_containing(c))
            .unwrap_or_default();
        if let Some(previous) = previous {
            for id in self.composites_containing(previous) {
                if entered.contains(&id) {
                    continue;
                }
                if let Some(composite) = self.composites.get_mut(&id) {
                    composite.focus_out(&mut self.document);
                }
            }
        }
        if let Some(current) = current {
            for id in entered {
                if let Some(composite) = self.composites.get_mut(&id) {
                    composite.focus_in(&mut self.document, current);
                }
            }
        }
    }

    // =========================================================================
    // Dialogs
    // =========================================================================

    /// Show the dialog bound to `element`. Returns `false` if it is unknown,
    /// already open or in a transition.
    pub fn show_dialog(&mut self, element: ElementId) -> bool {
        let previous = self.document.active_element();
        let Some(dialog) = self.dialogs.get_mut(&element) else {
            return false;
        };
        let shown = dialog.show(&mut self.document, &self.dialog_stack);
        if shown && dialog.transition().is_some() {
            self.animation_frames
                .post(move |page: &mut Page| page.start_dialog_transition(element));
        }
        self.sync_focus(previous);
        shown
    }

    /// Hide the dialog bound to `element`. Returns `false` if it is unknown,
    /// already closed or in a transition.
    pub fn hide_dialog(&mut self, element: ElementId) -> bool {
        let previous = self.document.active_element();
        let Some(dialog) = self.dialogs.get_mut(&element) else {
            return false;
        };
        let hidden = dialog.hide(&mut self.document, &self.dialog_stack);
        if hidden && dialog.transition().is_some() {
            self.animation_frames
                .post(move |page: &mut Page| page.start_dialog_transition(element));
        }
        self.sync_focus(previous);
        hidden
    }

    /// Report that the show or hide transition of `element` has settled.
    pub fn finish_transition(&mut self, element: ElementId) -> bool {
        let previous = self.document.active_element();
        let finished = self
            .dialogs
            .get_mut(&element)
            .is_some_and(|d| d.finish_transition(&mut self.document));
        self.sync_focus(previous);
        finished
    }

    fn start_dialog_transition(&mut self, element: ElementId) {
        if let Some(dialog) = self.dialogs.get(&element) {
            dialog.start_transition(&mut self.document);
        }
    }

    // =========================================================================
    // Deferred work
    // =========================================================================

    /// Post a task to the microtask queue.
    pub fn post_microtask<F>(&mut self, task: F) -> TaskId
    where
        F: FnOnce(&mut Page) + Send + 'static,
    {
        self.microtasks.post(task)
    }

    /// Post a task to run on the next animation frame.
    pub fn request_animation_frame<F>(&mut self, task: F) -> TaskId
    where
        F: FnOnce(&mut Page) + Send + 'static,
    {
        self.animation_frames.post(task)
    }

    /// Whether notifications or tasks are waiting.
    pub fn has_pending_work(&self) -> bool {
        self.document.has_pending_notifications()
            || self.microtasks.has_pending()
            || self.animation_frames.has_pending()
    }

    /// Run a microtask checkpoint.
    ///
    /// Each round delivers the notifications queued so far, in order, then
    /// runs the posted microtasks. Work queued during a round runs in the
    /// next one, until nothing is left.
    pub fn run_microtasks(&mut self) {
        for round in 0.. {
            if round == MAX_MICROTASK_ROUNDS {
                tracing::warn!(
                    target: targets::PAGE,
                    rounds = MAX_MICROTASK_ROUNDS,
                    "microtasks did not settle; deferring the rest"
                );
                return;
            }
            let notifications = self.document.take_pending_notifications();
            let tasks = self.microtasks.drain();
            if notifications.is_empty() && tasks.is_empty() {
                return;
            }
            for notification in &notifications {
                self.deliver(notification);
            }
            for task in tasks {
                task.run(self);
            }
        }
    }

    fn deliver(&mut self, notification: &Notification) {
        if !self.document.notify(notification) {
            tracing::debug!(
                target: targets::PAGE,
                name = %notification.qualified_name(),
                prevented = notification.default_prevented(),
                "notification not acted on"
            );
            return;
        }
        let source = notification.source();
        for id in self.composites_containing(source) {
            if let Some(composite) = self.composites.get_mut(&id)
                && composite.owns(source)
            {
                composite.handle_notification(&mut self.document, notification);
                return;
            }
        }
    }

    /// Run one animation frame, followed by a microtask checkpoint.
    pub fn run_animation_frame(&mut self) {
        for task in self.animation_frames.drain() {
            task.run(self);
        }
        self.run_microtasks();
    }

    /// Run microtasks and animation frames until no work is left.
    pub fn run_until_idle(&mut self) {
        self.run_microtasks();
        for _ in 0..MAX_MICROTASK_ROUNDS {
            if !self.animation_frames.has_pending() {
                return;
            }
            self.run_animation_frame();
        }
        tracing::warn!(target: targets::PAGE, "animation frames did not settle");
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(Page: Send);

//! Modal dialog.
//!
//! A dialog element gets two shadow parts: an `overlay` (the backdrop) and
//! a `panel` with `role="dialog"`. While open it sits in the page's
//! [`DialogStack`]: everything around the top dialog is inert, page scroll
//! is locked and Tab cycles inside it.
//!
//! # Lifecycle
//!
//! | Step                | Notification        |
//! |---------------------|---------------------|
//! | `show()` starts     | `dialog:show`       |
//! | entry finished      | `dialog:after-show` |
//! | `hide()` starts     | `dialog:hide`       |
//! | exit finished       | `dialog:after-hide` |
//!
//! Without animation a step finishes immediately. An animated dialog stays
//! in its transition until the host calls
//! [`Page::finish_transition`](crate::Page::finish_transition); a second
//! show or hide during a transition is ignored.
//!
//! Escape and backdrop clicks first dispatch a cancelable
//! `dialog:request-close` whose detail names the source (`"keyboard"` or
//! `"backdrop"`). Preventing it keeps the dialog open.

mod focus_trap;
mod inert;
mod stack;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{
    ChangeSet, CompositeError, Document, ElementId, NotificationDetail, Property, Result,
};
use parking_lot::Mutex;

pub use focus_trap::{autofocus_target, trap_tab};
pub use inert::background_of;
pub use stack::{DialogStack, SharedDialogStack};

use crate::accordion::bool_attribute;
use crate::aria::{self, AriaState};
use crate::config::DialogConfig;

/// Tag of dialog elements.
pub const DIALOG_TAG: &str = "horizon-dialog";

/// A show or hide in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Opening.
    Entering,
    /// Closing.
    Leaving,
}

impl Transition {
    /// Value of the `data-transition` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entering => "enter",
            Self::Leaving => "leave",
        }
    }
}

/// Why a dialog was asked to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseSource {
    /// The Escape key.
    Keyboard,
    /// A click on the backdrop.
    Backdrop,
}

impl CloseSource {
    /// Value carried by `dialog:request-close`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Backdrop => "backdrop",
        }
    }
}

/// Modal behaviour bound to a dialog element.
pub struct Dialog {
    element: ElementId,
    dismissable: Property<bool>,
    animated: Property<bool>,
    overlay: Option<ElementId>,
    panel: Option<ElementId>,
    transition: Option<Transition>,
    previously_focused: Option<ElementId>,
}

impl Dialog {
    /// Bind dialog behaviour to `element`.
    ///
    /// Options come from the `dismissable` and `animated` attributes, falling
    /// back to `config`.
    pub fn new(doc: &mut Document, element: ElementId, config: &DialogConfig) -> Result<Self> {
        let tag = doc.tag(element).ok_or(CompositeError::InvalidElement)?;
        if tag != DIALOG_TAG {
            return Err(CompositeError::unexpected_tag(DIALOG_TAG, tag));
        }
        let mut dialog = Self {
            element,
            dismissable: Property::new(bool_attribute(
                doc,
                element,
                "dismissable",
                config.dismissable,
            )),
            animated: Property::new(bool_attribute(doc, element, "animated", config.animated)),
            overlay: None,
            panel: None,
            transition: None,
            previously_focused: None,
        };
        dialog.ensure_parts(doc);
        Ok(dialog)
    }

    /// The dialog element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Whether the dialog is open (or opening).
    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_attribute(self.element, "open")
    }

    /// Whether Escape and backdrop clicks may close the dialog.
    pub fn is_dismissable(&self) -> bool {
        self.dismissable.get()
    }

    /// Whether show and hide wait for the host to finish a transition.
    pub fn is_animated(&self) -> bool {
        self.animated.get()
    }

    /// The transition in progress.
    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// The backdrop part.
    pub fn overlay(&self) -> Option<ElementId> {
        self.overlay
    }

    /// The panel part.
    pub fn panel(&self) -> Option<ElementId> {
        self.panel
    }

    /// Change whether the dialog is dismissable.
    pub fn set_dismissable(&mut self, doc: &mut Document, dismissable: bool) {
        let mut changes = ChangeSet::new();
        changes.track("dismissable", self.dismissable.set(dismissable));
        self.updated(doc, &changes);
    }

    /// Change whether the dialog animates.
    pub fn set_animated(&mut self, doc: &mut Document, animated: bool) {
        let mut changes = ChangeSet::new();
        changes.track("animated", self.animated.set(animated));
        self.updated(doc, &changes);
    }

    /// Post-update hook: reflect changed options.
    pub fn updated(&mut self, doc: &mut Document, changes: &ChangeSet) {
        if changes.contains("dismissable") {
            doc.set_attribute(
                self.element,
                "dismissable",
                if self.is_dismissable() { "true" } else { "false" },
            );
        }
        if changes.contains("animated") {
            doc.toggle_attribute(self.element, "animated", self.is_animated());
        }
    }

    fn ensure_parts(&mut self, doc: &mut Document) {
        if self.panel.is_some_and(|p| doc.exists(p)) {
            return;
        }
        let overlay = doc.create_element("div");
        let panel = doc.create_element("div");
        doc.set_attribute(overlay, "part", "overlay");
        doc.set_attribute(panel, "part", "panel");
        doc.set_attribute(panel, "tabindex", "-1");
        let state = AriaState {
            role: Some("dialog"),
            modal: Some(true),
            ..Default::default()
        };
        aria::apply(doc, panel, &state);
        let _ = doc.attach_shadow_child(self.element, overlay);
        let _ = doc.attach_shadow_child(self.element, panel);
        self.overlay = Some(overlay);
        self.panel = Some(panel);
    }

    fn emit(&self, doc: &Document, name: &str) {
        let notification = doc.notification(self.element, "dialog", name);
        doc.notify(&notification);
    }

    /// Open the dialog on top of `stack`. Returns `false` if it was already
    /// open or in a transition.
    ///
    /// The stack is locked only while it is updated; lifecycle listeners run
    /// with it released.
    pub fn show(&mut self, doc: &mut Document, stack: &Mutex<DialogStack>) -> bool {
        if self.is_open(doc) || self.transition.is_some() {
            return false;
        }
        tracing::debug!(target: targets::DIALOG, dialog = ?self.element, "showing dialog");
        self.ensure_parts(doc);
        doc.toggle_attribute(self.element, "open", true);
        self.previously_focused = doc.active_element();
        self.emit(doc, "show");

        {
            let mut stack = stack.lock();
            stack.register(self.element);
            stack.apply_inert(doc);
            stack.apply_levels(doc);
        }
        doc.set_scroll_locked(true);

        if self.is_animated() {
            self.transition = Some(Transition::Entering);
        } else {
            self.complete_show(doc);
        }
        true
    }

    /// Close the dialog and remove it from `stack`. Returns `false` if it was
    /// already closed or in a transition.
    pub fn hide(&mut self, doc: &mut Document, stack: &Mutex<DialogStack>) -> bool {
        if !self.is_open(doc) || self.transition.is_some() {
            return false;
        }
        tracing::debug!(target: targets::DIALOG, dialog = ?self.element, "hiding dialog");
        doc.toggle_attribute(self.element, "open", false);
        self.emit(doc, "hide");

        let empty = {
            let mut stack = stack.lock();
            stack.unregister(doc, self.element);
            doc.remove_attribute(self.element, "data-level");
            doc.remove_attribute(self.element, "data-z-index");
            stack.apply_levels(doc);
            if !stack.is_empty() {
                stack.apply_inert(doc);
            }
            stack.is_empty()
        };
        if empty {
            doc.set_scroll_locked(false);
        }

        if self.is_animated() {
            self.transition = Some(Transition::Leaving);
        } else {
            self.complete_hide(doc);
        }
        true
    }

    /// Finish the transition in progress. Returns `false` if there was none.
    pub fn finish_transition(&mut self, doc: &mut Document) -> bool {
        let Some(transition) = self.transition.take() else {
            return false;
        };
        doc.remove_attribute(self.element, "data-transition");
        match transition {
            Transition::Entering => self.complete_show(doc),
            Transition::Leaving => self.complete_hide(doc),
        }
        true
    }

    /// Reflect the transition in progress onto the element, as the first
    /// animation frame after show or hide does.
    pub fn start_transition(&self, doc: &mut Document) {
        if let Some(transition) = self.transition {
            doc.set_attribute(self.element, "data-transition", transition.as_str());
        }
    }

    fn complete_show(&mut self, doc: &mut Document) {
        let target = autofocus_target(doc, self.element).or(self.panel);
        if let Some(target) = target {
            doc.focus(target);
        }
        self.emit(doc, "after-show");
    }

    fn complete_hide(&mut self, doc: &mut Document) {
        match self.previously_focused.take() {
            Some(previous) if doc.focus(previous) => {}
            _ => {
                if doc
                    .active_element()
                    .is_some_and(|a| doc.contains(self.element, a))
                {
                    doc.blur();
                }
            }
        }
        self.emit(doc, "after-hide");
    }

    /// Ask to close on behalf of the user.
    ///
    /// Returns `true` when the dialog is open, dismissable and no listener
    /// prevented the cancelable `dialog:request-close`. The caller hides it.
    pub fn request_close(&self, doc: &Document, source: CloseSource) -> bool {
        if !self.is_open(doc) || !self.is_dismissable() {
            return false;
        }
        let notification = doc
            .notification(self.element, "dialog", "request-close")
            .cancelable(true)
            .with_detail(NotificationDetail::Reason(source.as_str().to_string()));
        let proceed = doc.notify(&notification);
        if !proceed {
            tracing::debug!(
                target: targets::DIALOG,
                dialog = ?self.element,
                source = source.as_str(),
                "close request prevented"
            );
        }
        proceed
    }

    /// Whether a click on `target` is a click on the backdrop itself.
    pub fn is_backdrop(&self, target: ElementId) -> bool {
        self.overlay == Some(target)
    }
}

static_assertions::assert_impl_all!(Dialog: Send);

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn setup() -> (Document, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let trigger = doc.create_element("button");
        let host = doc.create_element(DIALOG_TAG);
        let ok = doc.create_element("button");
        doc.append_child(doc.body(), trigger).unwrap();
        doc.append_child(doc.body(), host).unwrap();
        doc.append_child(host, ok).unwrap();
        (doc, trigger, host, ok)
    }

    #[test]
    fn test_parts() {
        let (mut doc, _, host, _) = setup();
        let dialog = Dialog::new(&mut doc, host, &DialogConfig::default()).unwrap();
        let panel = dialog.panel().unwrap();
        assert_eq!(doc.attribute(panel, "role"), Some("dialog"));
        assert_eq!(doc.attribute(panel, "aria-modal"), Some("true"));
        assert!(dialog.is_backdrop(dialog.overlay().unwrap()));
        assert!(!dialog.is_backdrop(panel));
    }

    #[test]
    fn test_show_and_hide_restore_focus() {
        let (mut doc, trigger, host, ok) = setup();
        let stack = Mutex::new(DialogStack::new());
        let mut dialog = Dialog::new(&mut doc, host, &DialogConfig::default()).unwrap();
        doc.toggle_attribute(ok, "autofocus", true);
        doc.focus(trigger);

        assert!(dialog.show(&mut doc, &stack));
        assert!(!dialog.show(&mut doc, &stack));
        assert_eq!(doc.active_element(), Some(ok));
        assert!(doc.is_inert(trigger));
        assert!(doc.is_scroll_locked());
        assert_eq!(doc.attribute(host, "data-z-index"), Some("1000"));

        assert!(dialog.hide(&mut doc, &stack));
        assert!(!dialog.hide(&mut doc, &stack));
        assert_eq!(doc.active_element(), Some(trigger));
        assert!(!doc.is_inert(trigger));
        assert!(!doc.is_scroll_locked());
        assert!(stack.lock().is_empty());
    }

    #[test]
    fn test_focus_falls_back_to_panel() {
        let (mut doc, _, host, _) = setup();
        let stack = Mutex::new(DialogStack::new());
        let mut dialog = Dialog::new(&mut doc, host, &DialogConfig::default()).unwrap();
        dialog.show(&mut doc, &stack);
        assert_eq!(doc.active_element(), dialog.panel());
    }

    #[test]
    fn test_animated_dialog_waits_for_transition() {
        let (mut doc, _, host, _) = setup();
        doc.toggle_attribute(host, "animated", true);
        let stack = Mutex::new(DialogStack::new());
        let mut dialog = Dialog::new(&mut doc, host, &DialogConfig::default()).unwrap();

        let after_show = Arc::new(AtomicUsize::new(0));
        let counter = after_show.clone();
        doc.listen(host, Some("dialog:after-show"), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dialog.show(&mut doc, &stack);
        assert_eq!(dialog.transition(), Some(Transition::Entering));
        assert!(!dialog.hide(&mut doc, &stack));
        dialog.start_transition(&mut doc);
        assert_eq!(doc.attribute(host, "data-transition"), Some("enter"));
        assert_eq!(after_show.load(Ordering::SeqCst), 0);

        assert!(dialog.finish_transition(&mut doc));
        assert_eq!(after_show.load(Ordering::SeqCst), 1);
        assert!(!doc.has_attribute(host, "data-transition"));
        assert!(!dialog.finish_transition(&mut doc));
    }

    #[test]
    fn test_request_close() {
        let (mut doc, _, host, _) = setup();
        let stack = Mutex::new(DialogStack::new());
        let mut dialog = Dialog::new(&mut doc, host, &DialogConfig::default()).unwrap();
        assert!(!dialog.request_close(&doc, CloseSource::Keyboard));

        dialog.show(&mut doc, &stack);
        assert!(dialog.request_close(&doc, CloseSource::Keyboard));

        let listener = doc.listen(host, Some("dialog:request-close"), |n| {
            assert_eq!(n.detail(), &NotificationDetail::Reason("backdrop".into()));
            n.prevent_default();
        });
        assert!(!dialog.request_close(&doc, CloseSource::Backdrop));
        doc.unlisten(listener);

        dialog.set_dismissable(&mut doc, false);
        assert!(!dialog.request_close(&doc, CloseSource::Keyboard));
        assert_eq!(doc.attribute(host, "dismissable"), Some("false"));
    }
}

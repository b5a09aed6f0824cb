//! Notification bus for Horizon Composite.
//!
//! Composite items and containers announce state changes with namespaced
//! [`Notification`]s (`accordion-item:open`, `tree:selection-change`, ...).
//! A notification is dispatched from its source element and, when it
//! bubbles, up the composed ancestor chain. Listeners registered on any of
//! those elements may call [`Notification::prevent_default`] on cancelable
//! notifications.
//!
//! Two delivery modes exist:
//!
//! - [`Document::notify`] dispatches synchronously and reports whether the
//!   notification was delivered and not cancelled.
//! - [`Document::queue_notification`] defers delivery. Everything queued in
//!   one synchronous turn is handed out together, in order, by
//!   [`Document::take_pending_notifications`] on the next flush.
//!
//! A listener that panics is contained at the emission boundary. The panic
//! is logged and the dispatch reports `false`, as if the default had been
//! prevented.
//!
//! # Example
//!
//! ```
//! use horizon_composite_core::{Document, Notification};
//!
//! let mut doc = Document::new();
//! let item = doc.create_element("horizon-accordion-item");
//! doc.append_child(doc.body(), item).unwrap();
//!
//! doc.listen(doc.body(), Some("accordion-item:close"), |n: &Notification| {
//!     n.prevent_default();
//! });
//!
//! let close = doc.notification(item, "accordion-item", "close").cancelable(true);
//! assert!(!doc.notify(&close));
//! assert!(close.default_prevented());
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::element::{Document, ElementId};
use crate::logging::targets;
use crate::signal::{ConnectionId, Signal};

/// State snapshot of a composite item carried by its notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemSnapshot {
    /// Whether the item is expanded.
    pub expanded: bool,
    /// Whether the item is selected.
    pub selected: bool,
    /// Whether the item is disabled.
    pub disabled: bool,
    /// Whether the item is in the mixed tri-state.
    pub indeterminate: bool,
    /// Whether the user may currently toggle the item.
    pub collapsible: bool,
}

/// Payload of a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NotificationDetail {
    /// No payload.
    #[default]
    None,
    /// The state of the emitting item.
    Item(ItemSnapshot),
    /// A set of elements, such as the selected items of a tree.
    Items(Vec<ElementId>),
    /// A short reason string, such as the source of a close request.
    Reason(String),
}

/// A namespaced change notification.
pub struct Notification {
    namespace: String,
    name: String,
    source: ElementId,
    id: Option<String>,
    timestamp: DateTime<Utc>,
    detail: NotificationDetail,
    cancelable: bool,
    bubbles: bool,
    default_prevented: AtomicBool,
    delivery_failed: AtomicBool,
}

impl Notification {
    /// Create a bubbling, non-cancelable notification stamped with the
    /// current time.
    pub fn new(source: ElementId, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            source,
            id: None,
            timestamp: Utc::now(),
            detail: NotificationDetail::None,
            cancelable: false,
            bubbles: true,
            default_prevented: AtomicBool::new(false),
            delivery_failed: AtomicBool::new(false),
        }
    }

    /// Attach a payload.
    pub fn with_detail(mut self, detail: NotificationDetail) -> Self {
        self.detail = detail;
        self
    }

    /// Set the DOM id of the source element.
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Set whether listeners may cancel the notification.
    pub fn cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Set whether the notification travels up the ancestor chain.
    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// The emitter's namespace, e.g. `accordion-item`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The unqualified name, e.g. `open`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"{namespace}:{name}"`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.namespace, self.name)
    }

    /// Whether this notification has the given namespace and name.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.namespace == namespace && self.name == name
    }

    /// The element that emitted the notification.
    pub fn source(&self) -> ElementId {
        self.source
    }

    /// The DOM id of the source element, if it had one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// When the notification was created.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The payload.
    pub fn detail(&self) -> &NotificationDetail {
        &self.detail
    }

    /// The item snapshot, if the payload carries one.
    pub fn item(&self) -> Option<&ItemSnapshot> {
        match &self.detail {
            NotificationDetail::Item(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Whether listeners may cancel the notification.
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether the notification bubbles.
    pub fn is_bubbling(&self) -> bool {
        self.bubbles
    }

    /// Cancel the notification's default action. Ignored unless cancelable.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.store(true, Ordering::SeqCst);
        }
    }

    /// Whether a listener cancelled the notification.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    /// Whether a listener panicked while the notification was dispatched.
    pub fn delivery_failed(&self) -> bool {
        self.delivery_failed.load(Ordering::SeqCst)
    }

    /// Whether the default action should proceed.
    pub fn should_proceed(&self) -> bool {
        !self.default_prevented() && !self.delivery_failed()
    }
}

impl Clone for Notification {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            source: self.source,
            id: self.id.clone(),
            timestamp: self.timestamp,
            detail: self.detail.clone(),
            cancelable: self.cancelable,
            bubbles: self.bubbles,
            default_prevented: AtomicBool::new(self.default_prevented()),
            delivery_failed: AtomicBool::new(self.delivery_failed()),
        }
    }
}

impl std::fmt::Debug for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notification")
            .field("name", &self.qualified_name())
            .field("source", &self.source)
            .field("id", &self.id)
            .field("detail", &self.detail)
            .field("default_prevented", &self.default_prevented())
            .finish()
    }
}

/// Handle for a registered notification listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId {
    target: ElementId,
    connection: ConnectionId,
}

impl ListenerId {
    /// The element the listener is registered on.
    pub fn target(&self) -> ElementId {
        self.target
    }
}

impl Document {
    /// Start a notification from `source`, filling in its DOM id.
    pub fn notification(
        &self,
        source: ElementId,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Notification {
        Notification::new(source, namespace, name)
            .with_id(self.attribute(source, "id").map(str::to_string))
    }

    /// Register a listener on `target`.
    ///
    /// `name` filters on the qualified name (`"tree:selection-change"`);
    /// `None` receives every notification reaching `target`.
    pub fn listen<F>(&mut self, target: ElementId, name: Option<&str>, callback: F) -> ListenerId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let filter = name.map(str::to_string);
        let connection = self
            .listeners
            .entry(target)
            .or_insert_with(Signal::new)
            .connect(move |n: &Notification| {
                if filter.as_deref().is_none_or(|f| f == n.qualified_name()) {
                    callback(n);
                }
            });
        ListenerId { target, connection }
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unlisten(&mut self, listener: ListenerId) -> bool {
        self.listeners
            .get(&listener.target)
            .is_some_and(|signal| signal.disconnect(listener.connection))
    }

    /// Dispatch synchronously.
    ///
    /// Returns `true` when every listener ran and none prevented the default.
    pub fn notify(&self, notification: &Notification) -> bool {
        let mut path = vec![notification.source];
        if notification.bubbles {
            path.extend(self.ancestors(notification.source));
        }

        tracing::debug!(
            target: targets::NOTIFY,
            name = %notification.qualified_name(),
            source = ?notification.source,
            "dispatching notification"
        );

        for target in path {
            let Some(signal) = self.listeners.get(&target) else {
                continue;
            };
            let delivered =
                panic::catch_unwind(AssertUnwindSafe(|| signal.emit(notification))).is_ok();
            if !delivered {
                tracing::warn!(
                    target: targets::NOTIFY,
                    name = %notification.qualified_name(),
                    ?target,
                    "listener panicked; notification not delivered"
                );
                notification.delivery_failed.store(true, Ordering::SeqCst);
                return false;
            }
        }

        notification.should_proceed()
    }

    /// Defer a notification to the next flush.
    pub fn queue_notification(&mut self, notification: Notification) {
        tracing::trace!(
            target: targets::NOTIFY,
            name = %notification.qualified_name(),
            pending = self.pending.len() + 1,
            "queued notification"
        );
        self.pending.push_back(notification);
    }

    /// Whether notifications are waiting for a flush.
    pub fn has_pending_notifications(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take every queued notification, in queue order.
    pub fn take_pending_notifications(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }
}

static_assertions::assert_impl_all!(Notification: Send, Sync);

//! Core systems for Horizon Composite.
//!
//! This crate provides the host-independent plumbing the composite widgets
//! are built on:
//!
//! - **Element Tree**: Light children, shadow children, attributes, typed
//!   dynamic properties and focus, addressed by stable [`ElementId`]s
//! - **Notification Bus**: Namespaced, cancelable change notifications with
//!   synchronous bubbling dispatch and deferred, coalesced delivery
//! - **Signal/Slot System**: Type-safe observers with re-entrant connect and
//!   disconnect
//! - **Property System**: Change-detecting properties for container options
//! - **Task Queue**: Deferred continuations for the microtask and
//!   animation-frame queues
//!
//! # Example
//!
//! ```
//! use horizon_composite_core::{Document, NotificationDetail};
//!
//! let mut doc = Document::new();
//! let tree = doc.create_element("horizon-tree");
//! doc.append_child(doc.body(), tree).unwrap();
//!
//! let note = doc
//!     .notification(tree, "tree", "selection-change")
//!     .with_detail(NotificationDetail::Items(Vec::new()));
//! doc.queue_notification(note);
//!
//! // Delivered on the next flush.
//! for n in doc.take_pending_notifications() {
//!     assert!(doc.notify(&n));
//! }
//! ```

pub mod element;
mod error;
pub mod logging;
pub mod notify;
pub mod property;
pub mod signal;
pub mod task;

pub use element::{Document, ElementId};
pub use error::{CompositeError, Result};
pub use logging::{ElementTreeDebug, TreeFormatOptions, TreeStyle};
pub use notify::{ItemSnapshot, ListenerId, Notification, NotificationDetail};
pub use property::{ChangeSet, Property};
pub use signal::{ConnectionId, Signal};
pub use task::{Task, TaskId, TaskQueue};

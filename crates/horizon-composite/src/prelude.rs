//! Prelude module for Horizon Composite.
//!
//! ```
//! use horizon_composite::prelude::*;
//! ```
//!
//! This provides access to:
//! - The page host (`Page`) and its configuration
//! - Element tree and notifications (`Document`, `ElementId`, `Notification`)
//! - The widgets and their tags
//! - The keyboard model

// ============================================================================
// Host and Configuration
// ============================================================================

pub use crate::config::{
    Activation, CompositeConfig, Orientation, SelectionMode, SelectionStrategy,
};
pub use crate::page::Page;

// ============================================================================
// Element Tree and Notifications
// ============================================================================

pub use horizon_composite_core::{
    Document, ElementId, ItemSnapshot, Notification, NotificationDetail,
};

// ============================================================================
// Widgets
// ============================================================================

pub use crate::accordion::{Accordion, ACCORDION_TAG};
pub use crate::dialog::{Dialog, DialogStack, DIALOG_TAG};
pub use crate::item::{Item, ItemKind, ACCORDION_ITEM_TAG, TAB_TAG, TREE_ITEM_TAG};
pub use crate::tab_group::{TabGroup, TAB_GROUP_TAG, TAB_PANEL_TAG};
pub use crate::tree::{Tree, TREE_TAG};

// ============================================================================
// Input
// ============================================================================

pub use crate::keyboard::{Key, KeyEvent, KeyboardModifiers};

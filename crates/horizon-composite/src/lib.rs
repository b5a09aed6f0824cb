//! Horizon Composite - accessible composite widget behaviour.
//!
//! This crate implements the coordination protocol behind accordions, tab
//! groups, trees and modal dialogs, independent of any rendering layer:
//! containers discover their items through slotted content, derive their
//! state (expansion policy, selection, tri-state checkboxes, ARIA), react
//! to items changing themselves, and drive keyboard navigation with a
//! roving tabindex.
//!
//! The host-independent plumbing (element tree, notification bus, tasks)
//! lives in [`horizon_composite_core`] and is re-exported here.
//!
//! # Example
//!
//! ```
//! use horizon_composite::prelude::*;
//!
//! let mut page = Page::new();
//! let doc = page.document_mut();
//! let tree = doc.create_element(TREE_TAG);
//! doc.set_attribute(tree, "selection", "multiple");
//! doc.append_child(doc.body(), tree).unwrap();
//! let root = doc.create_element(TREE_ITEM_TAG);
//! doc.append_child(tree, root).unwrap();
//! let leaf = doc.create_element(TREE_ITEM_TAG);
//! doc.set_attribute(leaf, "slot", "children");
//! doc.append_child(root, leaf).unwrap();
//! page.define_tree(tree).unwrap();
//!
//! page.click(leaf);
//! assert!(page.document().has_attribute(root, "selected"));
//! ```

pub use horizon_composite_core::*;

pub mod accordion;
pub mod aria;
pub mod composite;
pub mod config;
pub mod dialog;
pub mod focus;
pub mod item;
pub mod keyboard;
pub mod page;
pub mod prelude;
pub mod tab_group;
pub mod tree;

pub use accordion::{Accordion, ACCORDION_TAG};
pub use composite::{Composite, CompositeKind};
pub use config::{CompositeConfig, ConfigError};
pub use dialog::{Dialog, DialogStack, SharedDialogStack, DIALOG_TAG};
pub use item::{Item, ItemKind, ACCORDION_ITEM_TAG, TAB_TAG, TREE_ITEM_TAG};
pub use keyboard::{Key, KeyEvent, KeyboardModifiers};
pub use page::Page;
pub use tab_group::{TabGroup, TAB_GROUP_TAG, TAB_PANEL_TAG};
pub use tree::{Tree, TREE_TAG};

//! Logging and debugging facilities for Horizon Composite.
//!
//! Horizon Composite uses the `tracing` crate for instrumentation. Install a
//! subscriber in the host application to see the output:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_composite=debug")
//!     .init();
//! ```
//!
//! [`ElementTreeDebug`] renders a document subtree with its attributes,
//! which is handy when a container derives unexpected state.

use std::fmt::Write as FmtWrite;

use crate::element::{Document, ElementId};

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Element tree target.
    pub const DOCUMENT: &str = "horizon_composite_core::document";
    /// Focus movement target.
    pub const FOCUS: &str = "horizon_composite_core::focus";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_composite_core::signal";
    /// Notification bus target.
    pub const NOTIFY: &str = "horizon_composite_core::notify";
    /// Deferred task queue target.
    pub const TASK: &str = "horizon_composite_core::task";
    /// Accordion container target.
    pub const ACCORDION: &str = "horizon_composite::accordion";
    /// Tab group container target.
    pub const TAB_GROUP: &str = "horizon_composite::tab_group";
    /// Tree container target.
    pub const TREE: &str = "horizon_composite::tree";
    /// Dialog and dialog stack target.
    pub const DIALOG: &str = "horizon_composite::dialog";
    /// Page host target.
    pub const PAGE: &str = "horizon_composite::page";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_composite::config";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for element tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show element IDs.
    pub show_ids: bool,
    /// Whether to show attributes.
    pub show_attributes: bool,
    /// Whether to include shadow children.
    pub show_shadow: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_attributes: true,
            show_shadow: true,
            max_depth: None,
        }
    }
}

/// Debug utility for visualizing element trees.
#[derive(Debug, Clone, Default)]
pub struct ElementTreeDebug {
    options: TreeFormatOptions,
}

impl ElementTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format a subtree starting from `root`.
    ///
    /// Returns an empty string if `root` does not exist.
    pub fn format_subtree(&self, doc: &Document, root: ElementId) -> String {
        let mut output = String::new();
        self.format_into(doc, root, 0, "", false, &mut output);
        output
    }

    fn format_into(
        &self,
        doc: &Document,
        id: ElementId,
        depth: usize,
        prefix: &str,
        shadow: bool,
        output: &mut String,
    ) {
        let Some(tag) = doc.tag(id) else {
            return;
        };
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }

        output.push_str(prefix);
        let _ = write!(output, "<{tag}");
        if self.options.show_attributes {
            for (name, value) in doc.attributes(id) {
                if value.is_empty() {
                    let _ = write!(output, " {name}");
                } else {
                    let _ = write!(output, " {name}=\"{value}\"");
                }
            }
        }
        output.push('>');
        if shadow {
            output.push_str(" (shadow)");
        }
        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        output.push('\n');

        let mut children: Vec<(ElementId, bool)> = Vec::new();
        if self.options.show_shadow {
            children.extend(doc.shadow_children(id).iter().map(|&c| (c, true)));
        }
        children.extend(doc.children(id).iter().map(|&c| (c, false)));

        let indent = match self.options.style {
            TreeStyle::Ascii => "|  ",
            TreeStyle::Unicode => "\u{2502}  ",
        };
        let child_prefix = format!("{prefix}{indent}");
        for (child, is_shadow) in children {
            self.format_into(doc, child, depth + 1, &child_prefix, is_shadow, output);
        }
    }
}

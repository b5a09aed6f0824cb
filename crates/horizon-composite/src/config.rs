//! Configuration for composite widgets.
//!
//! [`CompositeConfig`] carries the defaults a [`Page`](crate::Page) applies
//! when an element does not specify an option through its attributes. Every
//! field has a default, so a configuration file only needs the values it
//! changes:
//!
//! ```toml
//! [accordion]
//! multiple = true
//!
//! [tree]
//! selection = "multiple"
//! strategy = "leaf"
//!
//! [dialog]
//! animated = true
//! ```
//!
//! Out-of-range values are corrected by [`CompositeConfig::validated`] and
//! logged as warnings rather than rejected.

use std::path::{Path, PathBuf};

use horizon_composite_core::logging::targets;
use serde::{Deserialize, Serialize};

/// Heading level used when a configured or requested level is invalid.
pub const DEFAULT_HEADING_LEVEL: u8 = 3;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration from {path}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for [`CompositeConfig`].
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Tree selection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Items cannot be selected; activation toggles expansion.
    None,
    /// At most one item is selected.
    #[default]
    Single,
    /// Any number of items, with tri-state checkboxes.
    Multiple,
}

impl SelectionMode {
    /// Parse the `selection` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "single" => Some(Self::Single),
            "multiple" => Some(Self::Multiple),
            _ => None,
        }
    }

    /// The attribute value for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

/// Which tree items may be selected directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionStrategy {
    /// Every item is selectable.
    #[default]
    Strict,
    /// Selection is restricted to leaves where the mode requires it.
    Leaf,
}

impl SelectionStrategy {
    /// Parse the `strategy` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "leaf" => Some(Self::Leaf),
            _ => None,
        }
    }

    /// The attribute value for this strategy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Leaf => "leaf",
        }
    }
}

/// How a tab group commits keyboard focus to selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Activation {
    /// Moving focus selects the focused tab.
    #[default]
    Auto,
    /// Focus roves; Enter or Space selects.
    Manual,
}

impl Activation {
    /// Parse the `activation` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Layout axis of a tab list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Tabs in a row; Left/Right navigate.
    #[default]
    Horizontal,
    /// Tabs in a column; Up/Down navigate.
    Vertical,
}

impl Orientation {
    /// Parse the `orientation` attribute value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Some(Self::Horizontal),
            "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }

    /// The `aria-orientation` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
        }
    }
}

/// Accordion defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordionConfig {
    /// Allow several items open at once.
    pub multiple: bool,
    /// Allow the last open item to be closed.
    pub collapsible: bool,
    /// Heading level for item headers without a `heading-level` attribute.
    pub heading_level: u8,
    /// Whether arrow keys wrap at the ends.
    pub wrap: bool,
}

impl Default for AccordionConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            collapsible: false,
            heading_level: DEFAULT_HEADING_LEVEL,
            wrap: true,
        }
    }
}

/// Tab group defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabGroupConfig {
    /// Keyboard activation mode.
    pub activation: Activation,
    /// Tab list orientation.
    pub orientation: Orientation,
    /// Whether arrow keys wrap at the ends.
    pub wrap: bool,
}

impl Default for TabGroupConfig {
    fn default() -> Self {
        Self {
            activation: Activation::Auto,
            orientation: Orientation::Horizontal,
            wrap: true,
        }
    }
}

/// Tree defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Selection mode.
    pub selection: SelectionMode,
    /// Selectability strategy.
    pub strategy: SelectionStrategy,
    /// Under multiple selection with the leaf strategy, only leaves carry a
    /// selectable checkbox.
    pub only_leaf_checkboxes: bool,
}

/// Dialog defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Whether Escape and backdrop clicks may close dialogs.
    pub dismissable: bool,
    /// Whether show and hide run a transition that the host finishes.
    pub animated: bool,
    /// z-index of the bottom dialog in the stack.
    pub base_z_index: u32,
    /// z-index increment per stack level.
    pub z_index_step: u32,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            dismissable: true,
            animated: false,
            base_z_index: 1000,
            z_index_step: 10,
        }
    }
}

/// Configuration for every composite widget on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    /// Accordion defaults.
    pub accordion: AccordionConfig,
    /// Tab group defaults.
    pub tab_group: TabGroupConfig,
    /// Tree defaults.
    pub tree: TreeConfig,
    /// Dialog defaults.
    pub dialog: DialogConfig,
}

impl CompositeConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loaded configuration");
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Correct out-of-range values, logging each correction.
    pub fn validated(mut self) -> Self {
        self.accordion.heading_level =
            checked_heading_level(self.accordion.heading_level, "accordion.heading_level");
        if self.dialog.z_index_step == 0 {
            tracing::warn!(
                target: targets::CONFIG,
                "dialog.z_index_step must be positive; using 10"
            );
            self.dialog.z_index_step = 10;
        }
        self
    }
}

/// Return `level` if it is a valid heading level (1 to 6), otherwise warn
/// and return [`DEFAULT_HEADING_LEVEL`].
pub fn checked_heading_level(level: u8, context: &str) -> u8 {
    if (1..=6).contains(&level) {
        level
    } else {
        tracing::warn!(
            target: targets::CONFIG,
            level,
            context,
            "heading level out of range; using {DEFAULT_HEADING_LEVEL}"
        );
        DEFAULT_HEADING_LEVEL
    }
}

//! ARIA projection.
//!
//! An [`AriaState`] is computed from widget state and projected onto the
//! element's attributes with [`apply`]. The projection covers every
//! state-derived attribute: fields left as `None` remove their attribute,
//! so re-applying after each state change keeps the attributes in step
//! with the state.
//!
//! Relationship attributes (`aria-controls`, `aria-labelledby`) are not
//! state-derived; containers set them directly when they wire items up.

use horizon_composite_core::{Document, ElementId};

/// Value of `aria-checked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaChecked {
    /// Checked.
    True,
    /// Unchecked.
    False,
    /// Some but not all descendants checked.
    Mixed,
}

impl AriaChecked {
    /// Tri-state value from a selected/indeterminate pair.
    pub fn from_state(selected: bool, indeterminate: bool) -> Self {
        if indeterminate {
            Self::Mixed
        } else if selected {
            Self::True
        } else {
            Self::False
        }
    }

    /// The attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::Mixed => "mixed",
        }
    }
}

/// State-derived ARIA attributes of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AriaState {
    /// `role`.
    pub role: Option<&'static str>,
    /// `aria-expanded`.
    pub expanded: Option<bool>,
    /// `aria-selected`.
    pub selected: Option<bool>,
    /// `aria-checked`.
    pub checked: Option<AriaChecked>,
    /// `aria-disabled`.
    pub disabled: Option<bool>,
    /// `aria-level`.
    pub level: Option<usize>,
    /// `aria-posinset`.
    pub posinset: Option<usize>,
    /// `aria-setsize`.
    pub setsize: Option<usize>,
    /// `aria-orientation`.
    pub orientation: Option<&'static str>,
    /// `aria-modal`.
    pub modal: Option<bool>,
    /// `aria-multiselectable`.
    pub multiselectable: Option<bool>,
}

fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

/// Project a state onto attribute values. `None` means "remove".
pub fn project(state: &AriaState) -> [(&'static str, Option<String>); 11] {
    [
        ("role", state.role.map(str::to_string)),
        ("aria-expanded", state.expanded.map(flag)),
        ("aria-selected", state.selected.map(flag)),
        ("aria-checked", state.checked.map(|c| c.as_str().to_string())),
        ("aria-disabled", state.disabled.map(flag)),
        ("aria-level", state.level.map(|v| v.to_string())),
        ("aria-posinset", state.posinset.map(|v| v.to_string())),
        ("aria-setsize", state.setsize.map(|v| v.to_string())),
        ("aria-orientation", state.orientation.map(str::to_string)),
        ("aria-modal", state.modal.map(flag)),
        ("aria-multiselectable", state.multiselectable.map(flag)),
    ]
}

/// Write the projection of `state` onto `target`.
///
/// Returns `true` if any attribute changed.
pub fn apply(doc: &mut Document, target: ElementId, state: &AriaState) -> bool {
    let mut changed = false;
    for (name, value) in project(state) {
        changed |= match value {
            Some(value) => doc.set_attribute(target, name, value),
            None => doc.remove_attribute(target, name),
        };
    }
    changed
}

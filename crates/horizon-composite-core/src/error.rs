//! Error types for Horizon Composite.

use crate::element::ElementId;

/// A specialized Result type for Horizon Composite operations.
pub type Result<T> = std::result::Result<T, CompositeError>;

/// The main error type for structural operations on the element tree and
/// for binding behaviour to elements.
///
/// Lookups never fail with this type; a missing slot, shadow child or
/// matching descendant is reported as an empty result instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    /// The element ID is invalid or the element has been destroyed.
    #[error("Invalid or destroyed element ID")]
    InvalidElement,

    /// Attempted to insert an element below itself.
    #[error("Cannot insert an element into its own subtree")]
    CircularParentage,

    /// The reference node passed to an insertion is not a child of the parent.
    #[error("Reference element {reference:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent the insertion targeted.
        parent: ElementId,
        /// The reference element that was expected among its children.
        reference: ElementId,
    },

    /// Behaviour was bound to an element with the wrong tag.
    #[error("Expected a <{expected}> element, found <{found}>")]
    UnexpectedTag {
        /// The tag the behaviour requires.
        expected: &'static str,
        /// The tag the element actually has.
        found: String,
    },

    /// The element already has behaviour bound to it.
    #[error("Element {0:?} already has a composite bound to it")]
    AlreadyDefined(ElementId),
}

impl CompositeError {
    /// Create an unexpected-tag error.
    pub fn unexpected_tag(expected: &'static str, found: impl Into<String>) -> Self {
        Self::UnexpectedTag {
            expected,
            found: found.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CompositeError::InvalidElement.to_string(),
            "Invalid or destroyed element ID"
        );
        assert_eq!(
            CompositeError::unexpected_tag("horizon-tree", "div").to_string(),
            "Expected a <horizon-tree> element, found <div>"
        );
    }
}

//! Reactive properties for Horizon Composite.
//!
//! `Property<T>` wraps a value and reports whether a `set` actually changed
//! it. Containers use this for their options: each changed option name is
//! collected and handed to the container's post-update hook.
//!
//! # Example
//!
//! ```
//! use horizon_composite_core::Property;
//!
//! let multiple = Property::new(false);
//! assert!(!multiple.set(false));
//! assert!(multiple.set(true));
//! assert!(multiple.get());
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A reactive property that tracks changes.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

/// Collects the names of options changed during one update.
///
/// ```
/// use horizon_composite_core::{ChangeSet, Property};
///
/// let collapsible = Property::new(false);
/// let mut changes = ChangeSet::new();
/// changes.track("collapsible", collapsible.set(true));
/// assert!(changes.contains("collapsible"));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    names: Vec<&'static str>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` if `changed` is true. Returns `changed`.
    pub fn track(&mut self, name: &'static str, changed: bool) -> bool {
        if changed && !self.names.contains(&name) {
            self.names.push(name);
        }
        changed
    }

    /// Whether `name` was recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name)
    }

    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The recorded names in first-change order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }
}

static_assertions::assert_impl_all!(Property<bool>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let prop = Property::new(42);
        assert!(!prop.set(42));
        assert!(prop.set(100));
        assert_eq!(prop.get(), 100);
    }

    #[test]
    fn test_clone_is_independent() {
        let prop = Property::new(String::from("single"));
        let copy = prop.clone();
        assert!(copy.set("multiple".into()));
        assert_eq!(prop.get(), "single");
    }

    #[test]
    fn test_change_set_dedupes() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());
        changes.track("multiple", true);
        changes.track("multiple", true);
        changes.track("collapsible", false);
        assert_eq!(changes.names(), &["multiple"]);
        assert!(!changes.contains("collapsible"));
    }
}

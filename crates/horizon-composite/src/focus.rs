//! Focus navigation shared by every composite.
//!
//! [`next_index`] is the pure navigation rule: given an ordered list, the
//! current position, a direction and a wrap policy, it finds the next item
//! that is not disabled. The remaining helpers apply the result to a
//! [`Document`]: roving tabindex and sequential (Tab) order.

use horizon_composite_core::{Document, ElementId};

/// Direction of a focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusDirection {
    /// The following enabled item.
    Next,
    /// The preceding enabled item.
    Previous,
    /// The first enabled item.
    First,
    /// The last enabled item.
    Last,
}

/// Find the index of the item focus should move to.
///
/// `First`/`Last` return the first/last item for which `is_disabled` is
/// false. `Next`/`Previous` scan from one position beyond `current`; at the
/// boundary they fall back to `First`/`Last` when `wrap` is set and return
/// `None` otherwise. Without a current position they behave like
/// `First`/`Last`.
///
/// A disabled item is never returned.
///
/// ```
/// use horizon_composite::focus::{next_index, FocusDirection};
///
/// let disabled = [true, false, true];
/// let pick = |d: FocusDirection, from, wrap| next_index(&disabled, from, d, wrap, |d| *d);
/// assert_eq!(pick(FocusDirection::Next, Some(1), true), Some(1));
/// assert_eq!(pick(FocusDirection::Next, Some(1), false), None);
/// assert_eq!(pick(FocusDirection::Last, None, false), Some(1));
/// ```
pub fn next_index<T, F>(
    items: &[T],
    current: Option<usize>,
    direction: FocusDirection,
    wrap: bool,
    is_disabled: F,
) -> Option<usize>
where
    F: Fn(&T) -> bool,
{
    let first = || items.iter().position(|item| !is_disabled(item));
    let last = || items.iter().rposition(|item| !is_disabled(item));

    match direction {
        FocusDirection::First => first(),
        FocusDirection::Last => last(),
        FocusDirection::Next => {
            let Some(current) = current else {
                return first();
            };
            items
                .iter()
                .enumerate()
                .skip(current.saturating_add(1))
                .find(|(_, item)| !is_disabled(item))
                .map(|(index, _)| index)
                .or_else(|| if wrap { first() } else { None })
        }
        FocusDirection::Previous => {
            let Some(current) = current else {
                return last();
            };
            items[..current.min(items.len())]
                .iter()
                .rposition(|item| !is_disabled(item))
                .or_else(|| if wrap { last() } else { None })
        }
    }
}

/// [`next_index`] over elements, treating the `disabled` attribute as
/// disabled and locating `current` by identity.
pub fn next_element(
    doc: &Document,
    items: &[ElementId],
    current: Option<ElementId>,
    direction: FocusDirection,
    wrap: bool,
) -> Option<ElementId> {
    let position = current.and_then(|c| items.iter().position(|&i| i == c));
    next_index(items, position, direction, wrap, |&item| {
        doc.has_attribute(item, "disabled")
    })
    .map(|index| items[index])
}

/// Make `active` the only tab stop among `items`.
///
/// `active` gets `tabindex="0"`, every other item `tabindex="-1"`. With
/// `None` every item is removed from the tab order.
pub fn set_roving_tabindex(doc: &mut Document, items: &[ElementId], active: Option<ElementId>) {
    for &item in items {
        let value = if Some(item) == active { "0" } else { "-1" };
        doc.set_attribute(item, "tabindex", value);
    }
}

/// Every tabbable element in `root`'s composed subtree, in document order.
pub fn tabbable_elements(doc: &Document, root: ElementId) -> Vec<ElementId> {
    doc.composed_preorder(root)
        .into_iter()
        .filter(|&e| doc.is_tabbable(e))
        .collect()
}

/// Move focus one step through the tabbable elements of `scope`, wrapping
/// at the ends. Returns the newly focused element.
///
/// If focus is currently outside `scope`, the first (or, moving backwards,
/// the last) tabbable element is focused.
pub fn cycle_focus(doc: &mut Document, scope: ElementId, backwards: bool) -> Option<ElementId> {
    let tabbable = tabbable_elements(doc, scope);
    let direction = if backwards {
        FocusDirection::Previous
    } else {
        FocusDirection::Next
    };
    let target = next_element(doc, &tabbable, doc.active_element(), direction, true)?;
    doc.focus(target).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_index_two_enabled() -> Vec<bool> {
        // disabled flags: every item but index 2
        vec![true, true, false, true, true]
    }

    #[test]
    fn test_single_enabled_item_always_found_with_wrap() {
        let items = only_index_two_enabled();
        for start in 0..items.len() {
            assert_eq!(
                next_index(&items, Some(start), FocusDirection::Next, true, |d| *d),
                Some(2),
                "start {start}"
            );
            assert_eq!(
                next_index(&items, Some(start), FocusDirection::Previous, true, |d| *d),
                Some(2),
                "start {start}"
            );
        }
    }

    #[test]
    fn test_no_wrap_returns_none_past_boundary() {
        let items = only_index_two_enabled();
        assert_eq!(next_index(&items, Some(2), FocusDirection::Next, false, |d| *d), None);
        assert_eq!(next_index(&items, Some(3), FocusDirection::Next, false, |d| *d), None);
        assert_eq!(next_index(&items, Some(0), FocusDirection::Next, false, |d| *d), Some(2));
        assert_eq!(next_index(&items, Some(2), FocusDirection::Previous, false, |d| *d), None);
    }

    #[test]
    fn test_first_and_last() {
        let items = [true, false, false, true];
        assert_eq!(next_index(&items, None, FocusDirection::First, false, |d| *d), Some(1));
        assert_eq!(next_index(&items, None, FocusDirection::Last, false, |d| *d), Some(2));
    }

    #[test]
    fn test_empty_and_fully_disabled() {
        let empty: [bool; 0] = [];
        assert_eq!(next_index(&empty, None, FocusDirection::First, true, |d| *d), None);
        assert_eq!(next_index(&empty, Some(0), FocusDirection::Next, true, |d| *d), None);

        let disabled = [true, true];
        for direction in [
            FocusDirection::Next,
            FocusDirection::Previous,
            FocusDirection::First,
            FocusDirection::Last,
        ] {
            assert_eq!(next_index(&disabled, Some(0), direction, true, |d| *d), None);
        }
    }

    #[test]
    fn test_roving_tabindex() {
        let mut doc = Document::new();
        let items: Vec<_> = (0..3)
            .map(|_| {
                let id = doc.create_element("horizon-tab");
                doc.append_child(doc.body(), id).unwrap();
                id
            })
            .collect();
        set_roving_tabindex(&mut doc, &items, Some(items[1]));
        assert_eq!(doc.attribute(items[0], "tabindex"), Some("-1"));
        assert_eq!(doc.attribute(items[1], "tabindex"), Some("0"));

        let tabbable = tabbable_elements(&doc, doc.body());
        assert_eq!(tabbable, vec![items[1]]);
    }

    #[test]
    fn test_cycle_focus_wraps() {
        let mut doc = Document::new();
        let a = doc.create_element("button");
        let b = doc.create_element("button");
        doc.append_child(doc.body(), a).unwrap();
        doc.append_child(doc.body(), b).unwrap();

        let body = doc.body();
        assert_eq!(cycle_focus(&mut doc, body, false), Some(a));
        assert_eq!(cycle_focus(&mut doc, body, false), Some(b));
        assert_eq!(cycle_focus(&mut doc, body, false), Some(a));
        assert_eq!(cycle_focus(&mut doc, body, true), Some(b));
    }
}

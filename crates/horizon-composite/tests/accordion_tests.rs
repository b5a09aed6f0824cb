//! Integration tests for accordion expansion policy and keyboard handling.

use std::sync::Arc;

use horizon_composite::prelude::*;
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    page: Page,
    host: ElementId,
    items: Vec<ElementId>,
}

fn setup(count: usize, options: &[(&str, &str)]) -> Fixture {
    init_tracing();
    let mut page = Page::new();
    let doc = page.document_mut();
    let host = doc.create_element(ACCORDION_TAG);
    for (name, value) in options {
        doc.set_attribute(host, name, *value);
    }
    doc.append_child(doc.body(), host).unwrap();
    let items = (0..count)
        .map(|_| {
            let item = doc.create_element(ACCORDION_ITEM_TAG);
            doc.append_child(host, item).unwrap();
            item
        })
        .collect();
    Fixture { page, host, items }
}

impl Fixture {
    fn define(mut self) -> Self {
        self.page.define_accordion(self.host).unwrap();
        self
    }

    fn item(&self, index: usize) -> Item {
        Item::new(self.page.document(), self.items[index]).unwrap()
    }

    fn header(&self, index: usize) -> ElementId {
        self.item(index)
            .properties(self.page.document())
            .parts
            .header
            .unwrap()
    }

    fn expanded(&self) -> Vec<usize> {
        (0..self.items.len())
            .filter(|&i| self.item(i).is_expanded(self.page.document()))
            .collect()
    }

    fn collapsible(&self, index: usize) -> bool {
        self.item(index).is_collapsible(self.page.document())
    }
}

#[test]
fn test_initial_render_pins_first_item() {
    let f = setup(3, &[("collapsible", "false"), ("multiple", "false")]).define();

    assert_eq!(f.expanded(), vec![0]);
    assert!(!f.collapsible(0));
    assert!(!f.collapsible(1));
    assert!(!f.collapsible(2));
    assert!(!f.page.has_pending_work());
}

#[test]
fn test_markup_open_items_reduced_to_first() {
    let mut f = setup(3, &[]);
    let doc = f.page.document_mut();
    doc.toggle_attribute(f.items[1], "expanded", true);
    doc.toggle_attribute(f.items[2], "expanded", true);
    let f = f.define();

    assert_eq!(f.expanded(), vec![1]);
    assert!(!f.collapsible(1));
}

#[test]
fn test_exactly_one_open_after_any_user_sequence() {
    let mut f = setup(4, &[]).define();
    let mut seed = 7_u32;

    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let index = (seed >> 16) as usize % f.items.len();
        let header = f.header(index);
        if seed & 1 == 0 {
            f.page.click(header);
        } else {
            f.page.focus(header);
            f.page.key_down(KeyEvent::new(Key::Enter));
        }
        assert_eq!(f.expanded().len(), 1, "after toggling item {index}");
    }
}

#[test]
fn test_opening_moves_the_pin() {
    let mut f = setup(3, &[]).define();
    let header = f.header(2);
    f.page.click(header);

    assert_eq!(f.expanded(), vec![2]);
    assert!(f.collapsible(0));
    assert!(f.collapsible(1));
    assert!(!f.collapsible(2));

    // The pinned item ignores close requests.
    f.page.click(header);
    assert_eq!(f.expanded(), vec![2]);
}

#[test]
fn test_collapsible_allows_closing_last_item() {
    let mut f = setup(2, &[("collapsible", "true")]).define();
    assert!(f.expanded().is_empty());

    let header = f.header(0);
    f.page.click(header);
    assert_eq!(f.expanded(), vec![0]);
    f.page.click(header);
    assert!(f.expanded().is_empty());
}

#[test]
fn test_multiple_mode_keeps_items_independent() {
    let mut f = setup(3, &[("multiple", "")]).define();
    for index in 0..3 {
        let header = f.header(index);
        f.page.click(header);
    }
    assert_eq!(f.expanded(), vec![0, 1, 2]);
}

#[test]
fn test_prevent_default_suppresses_correction() {
    let mut f = setup(2, &[("collapsible", "true")]).define();
    let first = f.header(0);
    f.page.click(first);

    f.page
        .document_mut()
        .listen(f.host, Some("accordion-item:open"), |n| n.prevent_default());
    let second = f.header(1);
    f.page.click(second);

    assert_eq!(f.expanded(), vec![0, 1]);
}

#[test]
fn test_change_notification_carries_expanded_items() {
    let mut f = setup(2, &[]).define();
    let seen: Arc<Mutex<Vec<Vec<ElementId>>>> = Arc::default();
    let sink = seen.clone();
    f.page
        .document_mut()
        .listen(f.host, Some("accordion:change"), move |n| {
            if let NotificationDetail::Items(items) = n.detail() {
                sink.lock().push(items.clone());
            }
        });

    let header = f.header(1);
    f.page.click(header);
    assert_eq!(*seen.lock(), vec![vec![f.items[1]]]);
}

#[test]
fn test_keyboard_navigation_wraps_and_skips_disabled() {
    let mut f = setup(3, &[]).define();
    f.item(1).disable(f.page.document_mut());
    f.page.run_microtasks();

    let first = f.header(0);
    f.page.focus(first);
    assert!(f.page.key_down(KeyEvent::new(Key::ArrowDown)));
    assert_eq!(f.page.document().active_element(), Some(f.header(2)));

    f.page.key_down(KeyEvent::new(Key::ArrowDown));
    assert_eq!(f.page.document().active_element(), Some(first));

    f.page.key_down(KeyEvent::new(Key::End));
    assert_eq!(f.page.document().active_element(), Some(f.header(2)));
    f.page.key_down(KeyEvent::new(Key::Home));
    assert_eq!(f.page.document().active_element(), Some(first));

    assert!(!f.page.key_down(KeyEvent::new(Key::Character('a'))));
}

#[test]
fn test_disable_keeps_item_open() {
    let mut f = setup(2, &[]).define();
    assert!(f.item(0).disable(f.page.document_mut()));
    assert!(!f.item(0).disable(f.page.document_mut()));
    f.page.run_microtasks();

    assert_eq!(f.expanded(), vec![0]);
    let header = f.header(0);
    assert_eq!(f.page.document().attribute(header, "aria-disabled"), Some("true"));
}

#[test]
fn test_idempotent_open_emits_nothing() {
    let mut f = setup(2, &[("collapsible", "true")]).define();
    let count = Arc::new(Mutex::new(0));
    let sink = count.clone();
    f.page
        .document_mut()
        .listen(f.host, Some("accordion-item:open"), move |_| *sink.lock() += 1);

    assert!(f.item(0).open(f.page.document_mut()));
    assert!(!f.item(0).open(f.page.document_mut()));
    f.page.run_microtasks();
    assert_eq!(*count.lock(), 1);
}

#[test]
fn test_nested_accordion_items_stay_separate() {
    let mut f = setup(2, &[("collapsible", "true")]);
    let doc = f.page.document_mut();
    let inner = doc.create_element(ACCORDION_TAG);
    doc.set_attribute(inner, "collapsible", "true");
    doc.append_child(f.items[0], inner).unwrap();
    let inner_item = doc.create_element(ACCORDION_ITEM_TAG);
    doc.append_child(inner, inner_item).unwrap();
    f.page.define_accordion(inner).unwrap();
    let mut f = f.define();

    assert_eq!(f.page.accordion(f.host).unwrap().items(), &f.items[..]);
    assert_eq!(f.page.accordion(inner).unwrap().items(), &[inner_item]);

    // Opening the inner item leaves the outer items alone.
    let item = Item::new(f.page.document(), inner_item).unwrap();
    assert!(item.open(f.page.document_mut()));
    f.page.run_microtasks();
    assert!(f.expanded().is_empty());
    assert_eq!(
        f.page.accordion(inner).unwrap().expanded_items(f.page.document()),
        vec![inner_item]
    );
}

#[test]
fn test_heading_level_attribute() {
    let mut f = setup(2, &[]);
    let doc = f.page.document_mut();
    doc.set_attribute(f.items[0], "heading-level", "2");
    doc.set_attribute(f.items[1], "heading-level", "9");
    let f = f.define();

    let level = |index: usize| {
        let heading = f.item(index).properties(f.page.document()).parts.heading.unwrap();
        f.page.document().attribute(heading, "aria-level").map(str::to_string)
    };
    assert_eq!(level(0).as_deref(), Some("2"));
    assert_eq!(level(1).as_deref(), Some("3"));
}

#[test]
fn test_option_change_rederives() {
    let mut f = setup(3, &[("multiple", "")]).define();
    for index in 0..3 {
        let header = f.header(index);
        f.page.click(header);
    }
    f.page.document_mut().remove_attribute(f.host, "multiple");
    f.page.attribute_changed(f.host, "multiple");

    assert_eq!(f.expanded(), vec![0]);
    assert!(!f.page.accordion(f.host).unwrap().is_multiple());
}

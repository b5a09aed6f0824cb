//! Tab group: a tab list with one visible panel at a time.
//!
//! Tabs are assigned to the `nav` slot and panels to the default slot. A
//! tab's `panel` attribute names the `name` of the panel it controls; the
//! group wires `aria-controls` and `aria-labelledby` between the two,
//! generating ids where they are missing.
//!
//! Exactly one tab is selected. When a tab becomes selected (through a
//! click, the keyboard or [`Item::select`]) the group deselects every
//! other tab, shows the matching panel, hides the rest and announces
//! `tab-group:change`.

use std::any::Any;

use horizon_composite_core::logging::targets;
use horizon_composite_core::{
    ChangeSet, CompositeError, Document, ElementId, Notification, NotificationDetail, Property,
    Result,
};

use crate::aria::{self, AriaState};
use crate::composite::{discover_items, owning_item, Composite, CompositeKind};
use crate::config::{Activation, Orientation, TabGroupConfig};
use crate::focus::{next_element, set_roving_tabindex, FocusDirection};
use crate::item::{ensure_dom_id, Item, ItemKind, TAB_TAG};
use crate::keyboard::{Key, KeyEvent};

/// Tag of tab group containers.
pub const TAB_GROUP_TAG: &str = "horizon-tab-group";
/// Tag of tab panels.
pub const TAB_PANEL_TAG: &str = "horizon-tab-panel";

/// Selection and keyboard handling for a tab group element.
pub struct TabGroup {
    element: ElementId,
    activation: Property<Activation>,
    orientation: Property<Orientation>,
    wrap: bool,
    nav: Option<ElementId>,
    tabs: Vec<ElementId>,
    panels: Vec<ElementId>,
    active: Option<ElementId>,
}

impl TabGroup {
    /// Bind tab group behaviour to `element`.
    ///
    /// Options come from the `activation` and `orientation` attributes,
    /// falling back to `config` when absent or unrecognized.
    pub fn new(doc: &Document, element: ElementId, config: &TabGroupConfig) -> Result<Self> {
        let tag = doc.tag(element).ok_or(CompositeError::InvalidElement)?;
        if tag != TAB_GROUP_TAG {
            return Err(CompositeError::unexpected_tag(TAB_GROUP_TAG, tag));
        }
        let activation = doc
            .attribute(element, "activation")
            .and_then(Activation::parse)
            .unwrap_or(config.activation);
        let orientation = doc
            .attribute(element, "orientation")
            .and_then(Orientation::parse)
            .unwrap_or(config.orientation);
        Ok(Self {
            element,
            activation: Property::new(activation),
            orientation: Property::new(orientation),
            wrap: config.wrap,
            nav: None,
            tabs: Vec::new(),
            panels: Vec::new(),
            active: None,
        })
    }

    /// Tabs in document order.
    pub fn tabs(&self) -> &[ElementId] {
        &self.tabs
    }

    /// Panels in document order.
    pub fn panels(&self) -> &[ElementId] {
        &self.panels
    }

    /// The selected tab.
    pub fn active_tab(&self) -> Option<ElementId> {
        self.active
    }

    /// The tab list part in the group's shadow tree.
    pub fn nav(&self) -> Option<ElementId> {
        self.nav
    }

    /// Keyboard activation mode.
    pub fn activation(&self) -> Activation {
        self.activation.get()
    }

    /// Tab list orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation.get()
    }

    /// The panel controlled by `tab`.
    pub fn panel_for(&self, doc: &Document, tab: ElementId) -> Option<ElementId> {
        let controls = doc.attribute(tab, "aria-controls")?;
        self.panels
            .iter()
            .copied()
            .find(|&p| doc.attribute(p, "id") == Some(controls))
    }

    /// Change the activation mode.
    pub fn set_activation(&mut self, doc: &mut Document, activation: Activation) {
        let mut changes = ChangeSet::new();
        changes.track("activation", self.activation.set(activation));
        self.updated(doc, &changes);
    }

    /// Change the orientation.
    pub fn set_orientation(&mut self, doc: &mut Document, orientation: Orientation) {
        let mut changes = ChangeSet::new();
        changes.track("orientation", self.orientation.set(orientation));
        self.updated(doc, &changes);
    }

    /// Post-update hook for option changes.
    pub fn updated(&mut self, doc: &mut Document, changes: &ChangeSet) {
        if changes.contains("activation") {
            let value = match self.activation() {
                Activation::Auto => "auto",
                Activation::Manual => "manual",
            };
            doc.set_attribute(self.element, "activation", value);
        }
        if changes.contains("orientation") {
            doc.set_attribute(self.element, "orientation", self.orientation().as_str());
            self.sync_nav(doc);
        }
    }

    fn tab(&self, id: ElementId) -> Item {
        Item::of_kind(id, ItemKind::Tab)
    }

    fn ensure_nav(&mut self, doc: &mut Document) {
        if self.nav.is_some_and(|nav| doc.exists(nav)) {
            return;
        }
        let nav = doc.create_element("div");
        doc.set_attribute(nav, "part", "nav");
        let _ = doc.attach_shadow_child(self.element, nav);
        self.nav = Some(nav);
        self.sync_nav(doc);
    }

    fn sync_nav(&self, doc: &mut Document) {
        if let Some(nav) = self.nav {
            let state = AriaState {
                role: Some("tablist"),
                orientation: Some(self.orientation().as_str()),
                ..Default::default()
            };
            aria::apply(doc, nav, &state);
        }
    }

    fn wire(&self, doc: &mut Document) {
        for &panel in &self.panels {
            doc.set_attribute(panel, "role", "tabpanel");
        }
        for &tab in &self.tabs {
            let tab_id = ensure_dom_id(doc, tab, "horizon-tab");
            self.tab(tab).sync_aria(doc);

            let panel = doc.attribute(tab, "panel").and_then(|name| {
                self.panels
                    .iter()
                    .copied()
                    .find(|&p| doc.attribute(p, "name") == Some(name))
            });
            match panel {
                Some(panel) => {
                    let panel_id = ensure_dom_id(doc, panel, "horizon-tab-panel");
                    doc.set_attribute(tab, "aria-controls", panel_id);
                    doc.set_attribute(panel, "aria-labelledby", tab_id);
                }
                None => {
                    doc.remove_attribute(tab, "aria-controls");
                }
            }
        }
    }

    /// Make `tab` the only selected tab and show its panel.
    fn activate(&mut self, doc: &mut Document, tab: ElementId, announce: bool) {
        for &other in self.tabs.iter().filter(|&&t| t != tab) {
            self.tab(other).force_selection(doc, false, false);
        }
        self.tab(tab).force_selection(doc, true, false);

        let shown = self.panel_for(doc, tab);
        for &panel in &self.panels {
            let visible = Some(panel) == shown;
            doc.toggle_attribute(panel, "hidden", !visible);
            doc.toggle_attribute(panel, "active", visible);
        }
        set_roving_tabindex(doc, &self.tabs, Some(tab));

        let previous = self.active.replace(tab);
        if announce && previous != Some(tab) {
            tracing::debug!(target: targets::TAB_GROUP, ?tab, "active tab changed");
            let notification = doc
                .notification(self.element, "tab-group", "change")
                .with_detail(NotificationDetail::Items(vec![tab]));
            doc.queue_notification(notification);
        }
    }

    fn focus_tab(&mut self, doc: &mut Document, tab: ElementId) {
        match self.activation() {
            Activation::Auto => {
                doc.focus(tab);
                self.tab(tab).select(doc);
            }
            Activation::Manual => {
                set_roving_tabindex(doc, &self.tabs, Some(tab));
                doc.focus(tab);
            }
        }
    }
}

impl Composite for TabGroup {
    fn element(&self) -> ElementId {
        self.element
    }

    fn kind(&self) -> CompositeKind {
        CompositeKind::TabGroup
    }

    fn slot_changed(&mut self, doc: &mut Document) {
        self.ensure_nav(doc);
        self.tabs = discover_items(doc, self.element, Some("nav"), TAB_TAG, TAB_GROUP_TAG);
        self.panels = discover_items(doc, self.element, None, TAB_PANEL_TAG, TAB_GROUP_TAG);
        tracing::debug!(
            target: targets::TAB_GROUP,
            tabs = self.tabs.len(),
            panels = self.panels.len(),
            "tabs discovered"
        );
        self.wire(doc);

        let initial = {
            let doc: &Document = doc;
            let enabled = |t: ElementId| !doc.has_attribute(t, "disabled");
            self.tabs
                .iter()
                .copied()
                .find(|&t| doc.has_attribute(t, "selected") && enabled(t))
                .or_else(|| self.tabs.iter().copied().find(|&t| enabled(t)))
        };

        match initial {
            Some(tab) => self.activate(doc, tab, false),
            None => self.active = None,
        }
    }

    fn owns(&self, element: ElementId) -> bool {
        self.tabs.contains(&element)
    }

    fn handle_notification(&mut self, doc: &mut Document, notification: &Notification) {
        if notification.namespace() != ItemKind::Tab.namespace() {
            return;
        }
        let tab = notification.source();
        match notification.name() {
            "select" if self.tab(tab).is_selected(doc) => self.activate(doc, tab, true),
            // A tab group always has a selected tab.
            "deselect" if self.active == Some(tab) && !self.tab(tab).is_selected(doc) => {
                self.tab(tab).force_selection(doc, true, false);
            }
            _ => {}
        }
    }

    fn attribute_changed(&mut self, doc: &mut Document, element: ElementId, name: &str) {
        if !self.tabs.contains(&element) {
            return;
        }
        match name {
            "selected" if self.tab(element).is_selected(doc) => self.activate(doc, element, true),
            "selected" if self.active == Some(element) => {
                self.tab(element).force_selection(doc, true, false);
            }
            "panel" => {
                self.wire(doc);
                if let Some(active) = self.active {
                    self.activate(doc, active, false);
                }
            }
            _ => self.tab(element).sync_aria(doc),
        }
    }

    fn handle_key(&mut self, doc: &mut Document, target: ElementId, event: &mut KeyEvent) {
        if !self.tabs.contains(&target) {
            return;
        }
        let (previous, next) = match self.orientation() {
            Orientation::Horizontal => (Key::ArrowLeft, Key::ArrowRight),
            Orientation::Vertical => (Key::ArrowUp, Key::ArrowDown),
        };
        let direction = match event.key {
            key if key == previous => Some(FocusDirection::Previous),
            key if key == next => Some(FocusDirection::Next),
            Key::Home => Some(FocusDirection::First),
            Key::End => Some(FocusDirection::Last),
            _ => None,
        };

        if let Some(direction) = direction {
            if let Some(tab) = next_element(doc, &self.tabs, Some(target), direction, self.wrap) {
                self.focus_tab(doc, tab);
            }
            event.accept();
        } else if event.key.is_activation() {
            if !self.tab(target).is_disabled(doc) {
                self.tab(target).select(doc);
            }
            event.accept();
        }
    }

    fn handle_click(&mut self, doc: &mut Document, target: ElementId) -> bool {
        let Some(tab) = owning_item(doc, &self.tabs, target) else {
            return false;
        };
        if !self.tab(tab).is_disabled(doc) {
            doc.focus(tab);
            self.tab(tab).select(doc);
        }
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

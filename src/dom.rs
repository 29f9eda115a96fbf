//! A headless element tree driven by the adapters in [`binding`](crate::binding).
//!
//! `Element` mirrors the parts of a browser DOM element the adapters touch:
//! text content, attributes, inline style, form control state, children and event listeners.
use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;
use parse_display::Display;
use slabmap::SlabMap;

use crate::{ActionContext, Subscription};

#[cfg(test)]
mod tests;

/// Attribute holding the key used by list reconciliation.
pub const KEY_ATTRIBUTE: &str = "data-key";

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[display(style = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    Click,
}

/// The `type` attribute of an input element.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[display(style = "lowercase")]
pub enum InputType {
    Text,
    Checkbox,
    Radio,
}

type ListenerFn = Rc<dyn Fn(&Element, &mut ActionContext)>;

struct Listener {
    kind: EventKind,
    f: ListenerFn,
}

#[derive(Default)]
struct ElementState {
    text: String,
    attributes: IndexMap<String, String>,
    style: IndexMap<String, String>,
    value: String,
    checked: bool,
    children: Vec<Element>,
}

struct ElementNode {
    tag: String,
    state: RefCell<ElementState>,
    listeners: RefCell<SlabMap<Listener>>,
    kept: RefCell<Vec<Subscription>>,
}

/// A shared handle to a headless element.
#[derive(Clone)]
pub struct Element(Rc<ElementNode>);

impl Element {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(ElementNode {
            tag: tag.to_string(),
            state: RefCell::new(ElementState::default()),
            listeners: RefCell::new(SlabMap::new()),
            kept: RefCell::new(Vec::new()),
        }))
    }

    /// Creates an `<input>` of the given type carrying `value`.
    pub fn input(input_type: InputType, value: &str) -> Self {
        let e = Self::new("input");
        e.set_attribute("type", &input_type.to_string());
        e.set_value(value);
        e
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn text(&self) -> String {
        self.0.state.borrow().text.clone()
    }
    pub fn set_text(&self, text: &str) {
        self.0.state.borrow_mut().text = text.to_string();
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.0.state.borrow().attributes.get(name).cloned()
    }
    pub fn has_attribute(&self, name: &str) -> bool {
        self.0.state.borrow().attributes.contains_key(name)
    }
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.0
            .state
            .borrow_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
    }
    pub fn remove_attribute(&self, name: &str) {
        self.0.state.borrow_mut().attributes.shift_remove(name);
    }

    pub fn class_name(&self) -> String {
        self.attribute("class").unwrap_or_default()
    }
    pub fn set_class_name(&self, class_name: &str) {
        self.set_attribute("class", class_name);
    }

    pub fn style(&self, property: &str) -> Option<String> {
        self.0.state.borrow().style.get(property).cloned()
    }
    /// Sets an inline style property. An empty value removes it.
    pub fn set_style(&self, property: &str, value: &str) {
        let mut state = self.0.state.borrow_mut();
        if value.is_empty() {
            state.style.shift_remove(property);
        } else {
            state.style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn value(&self) -> String {
        self.0.state.borrow().value.clone()
    }
    pub fn set_value(&self, value: &str) {
        self.0.state.borrow_mut().value = value.to_string();
    }

    pub fn checked(&self) -> bool {
        self.0.state.borrow().checked
    }
    pub fn set_checked(&self, checked: bool) {
        self.0.state.borrow_mut().checked = checked;
    }

    pub fn input_type(&self) -> Option<InputType> {
        match self.attribute("type")?.as_str() {
            "text" => Some(InputType::Text),
            "checkbox" => Some(InputType::Checkbox),
            "radio" => Some(InputType::Radio),
            _ => None,
        }
    }

    /// The key used by list reconciliation (`data-key`).
    pub fn key(&self) -> Option<String> {
        self.attribute(KEY_ATTRIBUTE)
    }
    pub fn set_key(&self, key: &str) {
        self.set_attribute(KEY_ATTRIBUTE, key);
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.state.borrow().children.clone()
    }
    pub fn child_count(&self) -> usize {
        self.0.state.borrow().children.len()
    }
    pub fn append_child(&self, child: Element) {
        self.0.state.borrow_mut().children.push(child);
    }
    /// Removes `child` if it is a child of this element.
    pub fn remove_child(&self, child: &Element) -> bool {
        let mut state = self.0.state.borrow_mut();
        let len = state.children.len();
        state.children.retain(|c| !c.ptr_eq(child));
        state.children.len() != len
    }

    /// Registers a listener called by [`dispatch`](Self::dispatch). Dropping the returned subscription removes it.
    pub fn add_event_listener(
        &self,
        kind: EventKind,
        f: impl Fn(&Element, &mut ActionContext) + 'static,
    ) -> Subscription {
        let key = self.0.listeners.borrow_mut().insert(Listener {
            kind,
            f: Rc::new(f),
        });
        let this = self.downgrade();
        Subscription::from_fn(move || {
            if let Some(this) = this.upgrade() {
                this.0.listeners.borrow_mut().remove(key);
            }
        })
    }
    pub fn listener_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }

    /// Calls the listeners of `kind`.
    pub fn dispatch(&self, kind: EventKind, ac: &mut ActionContext) {
        let listeners: Vec<ListenerFn> = self
            .0
            .listeners
            .borrow()
            .values()
            .filter(|l| l.kind == kind)
            .map(|l| l.f.clone())
            .collect();
        for f in listeners {
            f(self, ac);
        }
    }

    /// Replaces the value as a user typing would, then dispatches `input`.
    pub fn type_text(&self, text: &str, ac: &mut ActionContext) {
        self.set_value(text);
        self.dispatch(EventKind::Input, ac);
    }

    /// Clicks the element as a user would.
    ///
    /// A checkbox toggles and a radio button becomes checked before `click` and `change` are dispatched.
    pub fn click(&self, ac: &mut ActionContext) {
        let input_type = self.input_type();
        match input_type {
            Some(InputType::Checkbox) => self.set_checked(!self.checked()),
            Some(InputType::Radio) => self.set_checked(true),
            _ => {}
        }
        self.dispatch(EventKind::Click, ac);
        if matches!(input_type, Some(InputType::Checkbox | InputType::Radio)) {
            self.dispatch(EventKind::Change, ac);
        }
    }

    /// Keeps `subscription` alive as long as this element.
    pub fn keep(&self, subscription: Subscription) {
        self.0.kept.borrow_mut().push(subscription);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        let mut d = f.debug_struct("Element");
        d.field("tag", &self.0.tag);
        if !state.attributes.is_empty() {
            d.field("attributes", &state.attributes);
        }
        if !state.text.is_empty() {
            d.field("text", &state.text);
        }
        if !state.children.is_empty() {
            d.field("children", &state.children);
        }
        d.finish()
    }
}

/// A weak handle to an [`Element`]. Bindings hold elements weakly so an element can be dropped while bound.
#[derive(Clone)]
pub struct WeakElement(Weak<ElementNode>);

impl WeakElement {
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }
}

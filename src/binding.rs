//! Adapters projecting signals onto [`Element`]s.
//!
//! Every adapter runs an effect that writes the signal's value to the element, and the two-way adapters
//! also listen for events that write back to the signal. The returned [`Subscription`] removes both.
//! Elements are held weakly, so a bound element can still be dropped.
use std::{collections::HashMap, fmt::Display, rc::Rc};

use indexmap::IndexMap;

use crate::{
    dom::{Element, EventKind, InputType},
    effect, ActionContext, Signal, SignalValue, Subscription,
};


/// Sets the text content to the value of `signal`.
pub fn bind_text<T>(element: &Element, signal: &Signal<T>, ac: &mut ActionContext) -> Subscription
where
    T: SignalValue + Display,
{
    let e = element.downgrade();
    let s = signal.clone();
    effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                e.set_text(&s.borrow(sc).to_string());
            }
        },
        ac,
    )
}

/// Binds the value of an input both ways: the signal sets the value, and `input` events set the signal.
pub fn bind_value(element: &Element, signal: &Signal<String>, ac: &mut ActionContext) -> Subscription {
    let e = element.downgrade();
    let s = signal.clone();
    let update = effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                e.set_value(&s.borrow(sc));
            }
        },
        ac,
    );
    let s = signal.clone();
    let listener = element.add_event_listener(EventKind::Input, move |e, ac| s.set(e.value(), ac));
    [update, listener].into_iter().collect()
}

/// A value that can be used as a class name.
pub trait ClassName: SignalValue {
    fn class_name(&self) -> String;
}
impl ClassName for String {
    fn class_name(&self) -> String {
        self.clone()
    }
}
impl ClassName for &'static str {
    fn class_name(&self) -> String {
        self.to_string()
    }
}
impl ClassName for Vec<String> {
    fn class_name(&self) -> String {
        self.join(" ")
    }
}

/// Sets the class name. A list of classes is joined with spaces.
pub fn bind_class<T: ClassName>(element: &Element, signal: &Signal<T>, ac: &mut ActionContext) -> Subscription {
    let e = element.downgrade();
    let s = signal.clone();
    effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                e.set_class_name(&s.borrow(sc).class_name());
            }
        },
        ac,
    )
}

/// Hides the element with `display: none` while `signal` is `false`.
pub fn bind_visible(element: &Element, signal: &Signal<bool>, ac: &mut ActionContext) -> Subscription {
    let e = element.downgrade();
    let s = signal.clone();
    effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                e.set_style("display", if s.get(sc) { "" } else { "none" });
            }
        },
        ac,
    )
}

/// Sets every entry of `signal` as an inline style property.
///
/// Properties that disappear from the map keep their last value.
pub fn bind_style(
    element: &Element,
    signal: &Signal<IndexMap<String, String>>,
    ac: &mut ActionContext,
) -> Subscription {
    let e = element.downgrade();
    let s = signal.clone();
    effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                for (property, value) in s.borrow(sc).iter() {
                    e.set_style(property, value);
                }
            }
        },
        ac,
    )
}

/// A value that can be written to an attribute.
///
/// `None` removes the attribute. `true` sets an empty attribute and `false` removes it.
pub trait AttrValue: SignalValue {
    fn attr_value(&self) -> Option<String>;
}
impl AttrValue for bool {
    fn attr_value(&self) -> Option<String> {
        self.then(String::new)
    }
}
impl AttrValue for String {
    fn attr_value(&self) -> Option<String> {
        Some(self.clone())
    }
}
impl AttrValue for &'static str {
    fn attr_value(&self) -> Option<String> {
        Some(self.to_string())
    }
}
impl<T: AttrValue> AttrValue for Option<T> {
    fn attr_value(&self) -> Option<String> {
        self.as_ref()?.attr_value()
    }
}
macro_rules! impl_attr_value_by_display {
    ($($t:ty),*) => {
        $(
            impl AttrValue for $t {
                fn attr_value(&self) -> Option<String> {
                    Some(self.to_string())
                }
            }
        )*
    };
}
impl_attr_value_by_display!(i32, i64, u32, u64, usize, f64);

/// Writes the value of `signal` to the attribute `name`.
pub fn bind_attr<T: AttrValue>(
    element: &Element,
    name: &str,
    signal: &Signal<T>,
    ac: &mut ActionContext,
) -> Subscription {
    let e = element.downgrade();
    let name = name.to_string();
    let s = signal.clone();
    effect(
        move |sc| {
            if let Some(e) = e.upgrade() {
                match s.borrow(sc).attr_value() {
                    Some(value) => e.set_attribute(&name, &value),
                    None => e.remove_attribute(&name),
                }
            }
        },
        ac,
    )
}

/// An item of a list bound by [`bind_list`].
pub trait Keyed: SignalValue {
    fn key(&self) -> String;
}
macro_rules! impl_keyed_by_display {
    ($($t:ty),*) => {
        $(
            impl Keyed for $t {
                fn key(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}
impl_keyed_by_display!(i32, i64, u32, u64, usize, String, &'static str, Rc<str>);

/// Keeps the children of `element` in step with the items of `signal`, matched by key.
///
/// A child whose key is still present is kept as is, so its state survives the update.
/// Children of removed keys are removed, and `render` creates the children of new keys, which are appended.
/// Kept children are not reordered.
pub fn bind_list<T: Keyed + Clone>(
    element: &Element,
    signal: &Signal<Vec<T>>,
    render: impl Fn(&T, &mut ActionContext) -> Element + 'static,
    ac: &mut ActionContext,
) -> Subscription {
    let e = element.downgrade();
    let s = signal.clone();
    effect(
        move |sc| {
            let Some(e) = e.upgrade() else {
                return;
            };
            let items = s.get(sc);
            let existing = e.children();
            let mut children: HashMap<String, Element> = existing
                .iter()
                .filter_map(|child| Some((child.key()?, child.clone())))
                .collect();
            let mut keys = Vec::with_capacity(items.len());
            for item in items.iter() {
                let key = item.key();
                if !children.contains_key(&key) {
                    let child = render(item, sc.ac());
                    child.set_key(&key);
                    e.append_child(child.clone());
                    children.insert(key.clone(), child);
                }
                keys.push(key);
            }
            for child in &existing {
                if !child.key().is_some_and(|key| keys.contains(&key)) {
                    e.remove_child(child);
                }
            }
        },
        ac,
    )
}

fn group_type(elements: &[Element]) -> Option<InputType> {
    elements.first()?.input_type()
}

/// Binds a group of radio buttons both ways: the button whose value equals `signal` is checked,
/// and checking a button sets `signal` to its value.
///
/// An empty group, or a group whose first element is not a radio button, is not bound.
pub fn bind_radio_group(
    elements: &[Element],
    signal: &Signal<String>,
    ac: &mut ActionContext,
) -> Subscription {
    if group_type(elements) != Some(InputType::Radio) {
        return Subscription::empty();
    }
    let mut subscriptions = Vec::new();
    for element in elements {
        let s = signal.clone();
        subscriptions.push(element.add_event_listener(EventKind::Change, move |e, ac| {
            if e.checked() {
                s.set(e.value(), ac);
            }
        }));
        let e = element.downgrade();
        let s = signal.clone();
        subscriptions.push(effect(
            move |sc| {
                if let Some(e) = e.upgrade() {
                    e.set_checked(*s.borrow(sc) == e.value());
                }
            },
            ac,
        ));
    }
    subscriptions.into_iter().collect()
}

/// Binds a group of checkboxes both ways: the boxes whose values are in `signal` are checked,
/// and toggling a box adds its value to or removes it from `signal`.
///
/// An empty group, or a group whose first element is not a checkbox, is not bound.
pub fn bind_checkbox_group(
    elements: &[Element],
    signal: &Signal<Vec<String>>,
    ac: &mut ActionContext,
) -> Subscription {
    if group_type(elements) != Some(InputType::Checkbox) {
        return Subscription::empty();
    }
    let es: Vec<_> = elements.iter().map(|e| e.downgrade()).collect();
    let s = signal.clone();
    let mut subscriptions = vec![effect(
        move |sc| {
            let values = s.borrow(sc);
            for e in es.iter().filter_map(|e| e.upgrade()) {
                e.set_checked(values.contains(&e.value()));
            }
        },
        ac,
    )];
    for element in elements {
        let s = signal.clone();
        subscriptions.push(element.add_event_listener(EventKind::Change, move |e, ac| {
            let value = e.value();
            let mut values = s.get(&mut ac.sc());
            if e.checked() {
                if !values.contains(&value) {
                    values.push(value);
                }
            } else {
                values.retain(|v| v != &value);
            }
            s.set(values, ac);
        }));
    }
    subscriptions.into_iter().collect()
}

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use super::{log_property_changed, wrap, RawContainer, ReactiveNode, Value};
use crate::{core::Slot, ActionContext, SignalContext, SignalValue};

/// A raw shared object: an insertion-ordered map from keys to values.
///
/// Clones share the same map. Writes through a raw object are not observed by effects;
/// write through the [`ReactiveObject`] returned by [`wrap`] instead.
#[derive(Clone, Default)]
pub struct Object(pub(super) Rc<RefCell<IndexMap<Rc<str>, Value>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the value of `key`, or `Value::Null` if there is none.
    pub fn get(&self, key: &str) -> Value {
        self.0.borrow().get(key).cloned().unwrap_or_default()
    }
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }
    pub fn insert(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into().into_raw())
    }
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }
    pub fn keys(&self) -> Vec<Rc<str>> {
        self.0.borrow().keys().cloned().collect()
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl RawContainer for Object {
    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}
impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let o = Object::new();
        for (key, value) in iter {
            o.insert(key, value);
        }
        o
    }
}
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::Object(self.clone()), f)
    }
}

/// An object whose properties are tracked one by one.
///
/// Reading a key subscribes the running effect to that key only.
/// Writing a key notifies the subscribers of that key immediately; the notified effects run at the next flush.
/// Adding or removing a key also notifies the subscribers of [`keys`](Self::keys) and [`len`](Self::len).
#[derive(Clone)]
pub struct ReactiveObject(Rc<ReactiveNode<Object>>);

impl ReactiveObject {
    /// Returns the wrapper of `raw`, reusing the live wrapper if there is one.
    pub fn from_raw(raw: Object) -> Self {
        Self(ReactiveNode::from_raw(raw))
    }
    pub fn new() -> Self {
        Self::from_raw(Object::new())
    }

    pub fn raw(&self) -> &Object {
        &self.0.raw
    }

    /// Returns the value of `key`, with containers wrapped.
    pub fn get(&self, key: &str, sc: &mut SignalContext) -> Value {
        self.0.bind(Slot::Key(key.into()), sc);
        wrap(self.0.raw.get(key))
    }
    pub fn contains_key(&self, key: &str, sc: &mut SignalContext) -> bool {
        self.0.bind(Slot::Key(key.into()), sc);
        self.0.raw.contains_key(key)
    }

    /// Sets the value of `key`.
    ///
    /// Does nothing if the current value is the same value.
    pub fn set(&self, key: &str, value: impl Into<Value>, _ac: &mut ActionContext) {
        let value = value.into().into_raw();
        let is_new = {
            let mut map = self.0.raw.0.borrow_mut();
            if let Some(old) = map.get(key) {
                if old.same_value(&value) {
                    return;
                }
            }
            map.insert(key.into(), value).is_none()
        };
        let slot = Slot::Key(key.into());
        log_property_changed(&slot);
        self.0.notify(&slot);
        if is_new {
            self.0.notify(&Slot::Len);
        }
    }

    /// Removes `key` and returns its value, or `Value::Null` if it was not present.
    pub fn remove(&self, key: &str, _ac: &mut ActionContext) -> Value {
        let Some(old) = self.0.raw.remove(key) else {
            return Value::Null;
        };
        let slot = Slot::Key(key.into());
        log_property_changed(&slot);
        self.0.notify(&slot);
        self.0.notify(&Slot::Len);
        wrap(old)
    }

    pub fn keys(&self, sc: &mut SignalContext) -> Vec<Rc<str>> {
        self.0.bind(Slot::Len, sc);
        self.0.raw.keys()
    }
    pub fn len(&self, sc: &mut SignalContext) -> usize {
        self.0.bind(Slot::Len, sc);
        self.0.raw.len()
    }
    pub fn is_empty(&self, sc: &mut SignalContext) -> bool {
        self.len(sc) == 0
    }

    /// Returns the number of subscriptions over all keys.
    pub fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Default for ReactiveObject {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Debug for ReactiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::ReactiveObject(self.clone()), f)
    }
}

use std::{cell::RefCell, fmt, rc::Rc};

use super::{log_property_changed, wrap, RawContainer, ReactiveNode, Value};
use crate::{core::Slot, ActionContext, SignalContext, SignalValue};

/// A raw shared list.
///
/// Clones share the same items. Writes through a raw list are not observed by effects.
#[derive(Clone, Default)]
pub struct List(pub(super) Rc<RefCell<Vec<Value>>>);

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the item at `index`, or `Value::Null` if it is out of range.
    pub fn get(&self, index: usize) -> Value {
        self.0.borrow().get(index).cloned().unwrap_or_default()
    }
    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(value.into().into_raw());
    }
    pub fn pop(&self) -> Option<Value> {
        self.0.borrow_mut().pop()
    }
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl RawContainer for List {
    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}
impl<T: Into<Value>> FromIterator<T> for List {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(Rc::new(RefCell::new(
            iter.into_iter().map(|v| v.into().into_raw()).collect(),
        )))
    }
}
impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::List(self.clone()), f)
    }
}

/// A list whose items are tracked by index.
///
/// Reading an item subscribes the running effect to that index, and [`len`](Self::len) subscribes it to the length.
/// Operations that shift items notify every index from the first shifted one.
#[derive(Clone)]
pub struct ReactiveList(Rc<ReactiveNode<List>>);

impl ReactiveList {
    /// Returns the wrapper of `raw`, reusing the live wrapper if there is one.
    pub fn from_raw(raw: List) -> Self {
        Self(ReactiveNode::from_raw(raw))
    }
    pub fn new() -> Self {
        Self::from_raw(List::new())
    }

    pub fn raw(&self) -> &List {
        &self.0.raw
    }

    /// Returns the item at `index` with containers wrapped, or `Value::Null` if it is out of range.
    pub fn get(&self, index: usize, sc: &mut SignalContext) -> Value {
        self.0.bind(Slot::Index(index), sc);
        wrap(self.0.raw.get(index))
    }
    pub fn len(&self, sc: &mut SignalContext) -> usize {
        self.0.bind(Slot::Len, sc);
        self.0.raw.len()
    }
    pub fn is_empty(&self, sc: &mut SignalContext) -> bool {
        self.len(sc) == 0
    }

    /// Returns every item, subscribing to the length and to each index.
    pub fn to_vec(&self, sc: &mut SignalContext) -> Vec<Value> {
        let len = self.len(sc);
        (0..len).map(|index| self.get(index, sc)).collect()
    }

    /// Sets the item at `index`.
    ///
    /// Setting past the end extends the list with `Value::Null`.
    /// Does nothing if the current item is the same value.
    pub fn set(&self, index: usize, value: impl Into<Value>, _ac: &mut ActionContext) {
        let value = value.into().into_raw();
        let old_len = {
            let mut items = self.0.raw.0.borrow_mut();
            let old_len = items.len();
            if let Some(old) = items.get(index) {
                if old.same_value(&value) {
                    return;
                }
            } else {
                items.resize(index + 1, Value::Null);
            }
            items[index] = value;
            old_len
        };
        let slot = Slot::Index(index);
        log_property_changed(&slot);
        if index >= old_len {
            self.0.notify_indexes_from(old_len);
            self.0.notify(&Slot::Len);
        } else {
            self.0.notify(&slot);
        }
    }

    pub fn push(&self, value: impl Into<Value>, _ac: &mut ActionContext) {
        let index = {
            let mut items = self.0.raw.0.borrow_mut();
            items.push(value.into().into_raw());
            items.len() - 1
        };
        let slot = Slot::Index(index);
        log_property_changed(&slot);
        self.0.notify(&slot);
        self.0.notify(&Slot::Len);
    }

    /// Removes the last item and returns it, or `Value::Null` if the list is empty.
    pub fn pop(&self, _ac: &mut ActionContext) -> Value {
        let Some(old) = self.0.raw.pop() else {
            return Value::Null;
        };
        let slot = Slot::Index(self.0.raw.len());
        log_property_changed(&slot);
        self.0.notify(&slot);
        self.0.notify(&Slot::Len);
        wrap(old)
    }

    /// Inserts an item at `index`, shifting later items. An index past the end appends.
    pub fn insert(&self, index: usize, value: impl Into<Value>, _ac: &mut ActionContext) {
        let index = {
            let mut items = self.0.raw.0.borrow_mut();
            let index = index.min(items.len());
            items.insert(index, value.into().into_raw());
            index
        };
        log_property_changed(&Slot::Index(index));
        self.0.notify_indexes_from(index);
        self.0.notify(&Slot::Len);
    }

    /// Removes the item at `index`, shifting later items. Returns `Value::Null` if `index` is out of range.
    pub fn remove(&self, index: usize, _ac: &mut ActionContext) -> Value {
        let old = {
            let mut items = self.0.raw.0.borrow_mut();
            if index >= items.len() {
                return Value::Null;
            }
            items.remove(index)
        };
        log_property_changed(&Slot::Index(index));
        self.0.notify_indexes_from(index);
        self.0.notify(&Slot::Len);
        wrap(old)
    }

    /// Returns the number of subscriptions over all indexes and the length.
    pub fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Default for ReactiveList {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Debug for ReactiveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&Value::ReactiveList(self.clone()), f)
    }
}

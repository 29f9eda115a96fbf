//! Deep reactive wrapping of structured data.
//!
//! [`Value`] is a dynamic value made of primitives and shared containers.
//! The raw containers ([`Object`], [`List`]) are plain data. [`wrap`] turns them into
//! [`ReactiveObject`] and [`ReactiveList`], which record which property each effect reads
//! and notify only the effects that read a property when that property is written.
//!
//! Children are wrapped when they are read, and the same raw container always yields the same wrapper
//! while the wrapper is alive. Self-referencing data therefore wraps without recursion and keeps its identity.
use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    rc::{Rc, Weak},
};

use indexmap::IndexMap;

use crate::{
    core::{BindSource, SinkBindings, SinkId, Slot},
    ActionContext, Devtools, SignalContext, SignalValue,
};

mod list;
mod object;
mod serialize;

#[cfg(test)]
mod tests;

pub use list::*;
pub use object::*;

/// A dynamic structured value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Object(Object),
    List(List),
    ReactiveObject(ReactiveObject),
    ReactiveList(ReactiveList),
}

/// Makes the containers of a value reactive.
///
/// Primitives and values that are already reactive are returned unchanged.
pub fn wrap(value: Value) -> Value {
    match value {
        Value::Object(raw) => Value::ReactiveObject(ReactiveObject::from_raw(raw)),
        Value::List(raw) => Value::ReactiveList(ReactiveList::from_raw(raw)),
        value => value,
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn is_reactive(&self) -> bool {
        matches!(self, Value::ReactiveObject(_) | Value::ReactiveList(_))
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_reactive_object(&self) -> Option<&ReactiveObject> {
        match self {
            Value::ReactiveObject(value) => Some(value),
            _ => None,
        }
    }
    pub fn as_reactive_list(&self) -> Option<&ReactiveList> {
        match self {
            Value::ReactiveList(value) => Some(value),
            _ => None,
        }
    }

    /// Reads a property of an object.
    ///
    /// Reads through a reactive object are tracked. Any other value yields `Value::Null`.
    pub fn get(&self, key: &str, sc: &mut SignalContext) -> Value {
        match self {
            Value::ReactiveObject(o) => o.get(key, sc),
            Value::Object(o) => o.get(key),
            _ => Value::Null,
        }
    }

    /// Reads an element of a list.
    ///
    /// Reads through a reactive list are tracked. Any other value, or an index out of range, yields `Value::Null`.
    pub fn at(&self, index: usize, sc: &mut SignalContext) -> Value {
        match self {
            Value::ReactiveList(l) => l.get(index, sc),
            Value::List(l) => l.get(index),
            _ => Value::Null,
        }
    }

    /// Writes a property of an object. Writing through a value that is not an object does nothing.
    pub fn set(&self, key: &str, value: impl Into<Value>, ac: &mut ActionContext) {
        match self {
            Value::ReactiveObject(o) => o.set(key, value, ac),
            Value::Object(o) => {
                o.insert(key, value);
            }
            _ => {}
        }
    }

    /// Returns the value with reactive containers replaced by their raw containers.
    pub fn into_raw(self) -> Value {
        match self {
            Value::ReactiveObject(o) => Value::Object(o.raw().clone()),
            Value::ReactiveList(l) => Value::List(l.raw().clone()),
            value => value,
        }
    }

    fn container_addr(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(o.addr()),
            Value::List(l) => Some(l.addr()),
            Value::ReactiveObject(o) => Some(o.raw().addr()),
            Value::ReactiveList(l) => Some(l.raw().addr()),
            _ => None,
        }
    }
}

impl SignalValue for Value {
    /// Primitives compare by value, containers by the identity of the raw container.
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a.same_value(b),
            (Value::String(a), Value::String(b)) => a == b,
            _ => match (self.container_addr(), other.container_addr()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
    fn wrap(self) -> Self {
        wrap(self)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}
impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}
impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(value.into())
    }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}
impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value.into())
    }
}
impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::String(value)
    }
}
impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}
impl From<List> for Value {
    fn from(value: List) -> Self {
        Value::List(value)
    }
}
impl From<ReactiveObject> for Value {
    fn from(value: ReactiveObject) -> Self {
        Value::ReactiveObject(value)
    }
}
impl From<ReactiveList> for Value {
    fn from(value: ReactiveList) -> Self {
        Value::ReactiveList(value)
    }
}
impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value.into_iter().collect())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

const MAX_DEBUG_DEPTH: usize = 8;

struct DebugValue<'a> {
    value: &'a Value,
    depth: usize,
}

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => fmt::Debug::fmt(value, f),
            Value::Number(value) => fmt::Debug::fmt(value, f),
            Value::String(value) => fmt::Debug::fmt(value, f),
            _ if self.depth >= MAX_DEBUG_DEPTH => write!(f, ".."),
            Value::Object(o) => self.fmt_object(o, f),
            Value::ReactiveObject(o) => self.fmt_object(o.raw(), f),
            Value::List(l) => self.fmt_list(l, f),
            Value::ReactiveList(l) => self.fmt_list(l.raw(), f),
        }
    }
}
impl DebugValue<'_> {
    fn fmt_object(&self, o: &Object, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.depth + 1;
        let map = o.0.borrow();
        f.debug_map()
            .entries(map.iter().map(|(k, value)| (k, DebugValue { value, depth })))
            .finish()
    }
    fn fmt_list(&self, l: &List, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.depth + 1;
        let items = l.0.borrow();
        f.debug_list()
            .entries(items.iter().map(|value| DebugValue { value, depth }))
            .finish()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DebugValue {
            value: self,
            depth: 0,
        }
        .fmt(f)
    }
}

trait RawContainer: Clone + 'static {
    fn addr(&self) -> usize;
}

/// A raw container together with the subscribers of each of its properties.
struct ReactiveNode<R> {
    raw: R,
    sinks: RefCell<PropertySinks>,
}

impl<R: RawContainer> ReactiveNode<R> {
    fn from_raw(raw: R) -> Rc<Self> {
        WRAP_CACHE.with(|cache| cache.borrow_mut().get_or_insert(raw))
    }
    fn bind(self: &Rc<Self>, slot: Slot, sc: &mut SignalContext) {
        if sc.is_tracking() {
            self.sinks.borrow_mut().bind(self.clone(), slot, sc);
        }
    }
    fn notify(&self, slot: &Slot) {
        self.sinks.borrow().notify(slot);
    }
    fn notify_indexes_from(&self, start: usize) {
        self.sinks
            .borrow()
            .notify_where(|slot| matches!(slot, Slot::Index(index) if *index >= start));
    }
    fn subscriber_count(&self) -> usize {
        self.sinks.borrow().len()
    }
}

impl<R: 'static> BindSource for ReactiveNode<R> {
    fn unbind(&self, slot: &Slot, sink: SinkId) {
        self.sinks.borrow_mut().unbind(slot, sink);
    }
}

fn log_property_changed(slot: &Slot) {
    if Devtools::current().log_updates {
        tracing::debug!(?slot, "reactive property changed");
    }
}

#[derive(Default)]
struct PropertySinks(IndexMap<Slot, SinkBindings>);

impl PropertySinks {
    fn bind(&mut self, this: Rc<dyn BindSource>, slot: Slot, sc: &mut SignalContext) {
        self.0
            .entry(slot.clone())
            .or_default()
            .bind(this, slot, sc);
    }
    fn unbind(&mut self, slot: &Slot, sink: SinkId) {
        if let Some(sinks) = self.0.get_mut(slot) {
            sinks.unbind(sink);
            if sinks.is_empty() {
                self.0.shift_remove(slot);
            }
        }
    }
    fn notify(&self, slot: &Slot) {
        if let Some(sinks) = self.0.get(slot) {
            sinks.notify(slot);
        }
    }
    fn notify_where(&self, f: impl Fn(&Slot) -> bool) {
        for (slot, sinks) in &self.0 {
            if f(slot) {
                sinks.notify(slot);
            }
        }
    }
    fn len(&self) -> usize {
        self.0.values().map(|sinks| sinks.len()).sum()
    }
}

thread_local! {
    static WRAP_CACHE: RefCell<WrapCache> = RefCell::new(WrapCache::new());
}

const MIN_PRUNE_AT: usize = 64;

/// Raw container address to its wrapper. Never keeps a wrapper alive.
struct WrapCache {
    nodes: HashMap<usize, Weak<dyn Any>>,
    prune_at: usize,
}

impl WrapCache {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }
    fn get_or_insert<R: RawContainer>(&mut self, raw: R) -> Rc<ReactiveNode<R>> {
        let addr = raw.addr();
        if let Some(node) = self.nodes.get(&addr).and_then(|node| node.upgrade()) {
            if let Ok(node) = node.downcast::<ReactiveNode<R>>() {
                return node;
            }
        }
        let node = Rc::new(ReactiveNode {
            raw,
            sinks: RefCell::new(PropertySinks::default()),
        });
        let weak: Weak<dyn Any> = Rc::downgrade(&node) as Weak<dyn Any>;
        self.nodes.insert(addr, weak);
        if self.nodes.len() >= self.prune_at {
            self.nodes.retain(|_, node| node.strong_count() > 0);
            self.prune_at = (self.nodes.len() * 2).max(MIN_PRUNE_AT);
        }
        node
    }
}

#[cfg(test)]
fn wrap_cache_len() -> usize {
    WRAP_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        cache.nodes.retain(|_, node| node.strong_count() > 0);
        cache.nodes.len()
    })
}

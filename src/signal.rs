use std::{
    cell::{Cell, OnceCell, Ref, RefCell},
    fmt,
    rc::Rc,
};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    core::{schedule_notify, BindSink, BindSource, SinkBindings, SinkId, Slot},
    ActionContext, Devtools, SignalContext, SignalValue, Subscription,
};

#[cfg(test)]
mod tests;

/// An observable value cell.
///
/// Reading through a tracking [`SignalContext`] subscribes the running effect.
/// Writing schedules one notification per batch; it is delivered by [`Runtime::flush`](crate::core::Runtime::flush).
#[derive_ex(Clone, bound())]
pub struct Signal<T: 'static>(pub(crate) Rc<SignalNode<T>>);

impl<T: SignalValue> Signal<T> {
    /// Create a new `Signal` with the given initial value.
    pub fn new(value: T) -> Self {
        Self(Rc::new(SignalNode {
            value: RefCell::new(value.wrap()),
            sinks: RefCell::new(SinkBindings::new()),
            is_scheduled: Cell::new(false),
            owned: OnceCell::new(),
        }))
    }

    /// Obtains a reference to the current value and adds a dependency on this `Signal` to the specified `SignalContext`.
    pub fn borrow(&self, sc: &mut SignalContext) -> Ref<'_, T> {
        self.0.bind(sc);
        self.0.value.borrow()
    }

    /// Gets the current value and adds a dependency on this `Signal` to the specified `SignalContext`.
    pub fn get(&self, sc: &mut SignalContext) -> T
    where
        T: Clone,
    {
        self.borrow(sc).clone()
    }

    /// Sets the value and schedules a notification, unless `value` is the same value as the current one.
    ///
    /// Several writes before the next flush produce a single notification.
    pub fn set(&self, value: T, _ac: &mut ActionContext) {
        let value = value.wrap();
        {
            let mut current = self.0.value.borrow_mut();
            if current.same_value(&value) {
                return;
            }
            *current = value;
        }
        if Devtools::current().log_updates {
            tracing::debug!(
                value_type = std::any::type_name::<T>(),
                subscribers = self.subscriber_count(),
                "signal updated"
            );
        }
        self.0.schedule_notify();
    }

    /// Sets the value computed from the current value.
    pub fn update(&self, f: impl FnOnce(&T) -> T, ac: &mut ActionContext) {
        let value = f(&self.0.value.borrow());
        self.set(value, ac);
    }

    /// Returns the number of effects currently subscribed to this signal.
    pub fn subscriber_count(&self) -> usize {
        self.0.sinks.borrow().len()
    }

    /// Returns `true` if both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Ties the lifetime of `subscription` to this signal.
    pub(crate) fn own(&self, subscription: Subscription) {
        let _ = self.0.owned.set(subscription);
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T> Serialize for Signal<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&*value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
impl<'de, T> Deserialize<'de> for Signal<T>
where
    T: Deserialize<'de> + SignalValue,
{
    fn deserialize<D>(deserializer: D) -> Result<Signal<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Signal::new)
    }
}

pub(crate) struct SignalNode<T: 'static> {
    value: RefCell<T>,
    sinks: RefCell<SinkBindings>,
    is_scheduled: Cell<bool>,
    owned: OnceCell<Subscription>,
}
impl<T: 'static> SignalNode<T> {
    fn bind(self: &Rc<Self>, sc: &mut SignalContext) {
        if sc.is_tracking() {
            self.sinks
                .borrow_mut()
                .bind(self.clone(), Slot::Value, sc);
        }
    }
    fn schedule_notify(self: &Rc<Self>) {
        if !self.is_scheduled.replace(true) {
            let node = Rc::downgrade(self);
            schedule_notify(node)
        }
    }
}

impl<T: 'static> BindSource for SignalNode<T> {
    fn unbind(&self, _slot: &Slot, sink: SinkId) {
        self.sinks.borrow_mut().unbind(sink);
    }
}
impl<T: 'static> BindSink for SignalNode<T> {
    fn notify(self: Rc<Self>, slot: &Slot) {
        self.is_scheduled.set(false);
        self.sinks.borrow().notify(slot);
    }
    fn cancel_notify(self: Rc<Self>) {
        self.is_scheduled.set(false);
    }
}

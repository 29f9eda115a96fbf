use std::{any::Any, mem::take, rc::Rc};


/// Disposer returned by [`effect`](crate::effect), [`watch`](crate::watch) and the DOM bindings.
///
/// Dropping the `Subscription` releases what it holds: effects stop running and event listeners are removed.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
    pub fn from_rc(rc: Rc<dyn Any>) -> Self {
        Subscription(RawSubscription::Rc(rc))
    }

    /// Returns `true` if dropping this subscription releases nothing.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            RawSubscription::Empty => true,
            RawSubscription::Many(items) => items.iter().all(|s| s.is_empty()),
            _ => false,
        }
    }

    /// Keeps the subscription alive until the thread exits.
    pub fn detach(self) {
        std::mem::forget(self)
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Rc(_) => {}
            RawSubscription::Many(items) => drop(items),
        }
    }
}
impl FromIterator<Subscription> for Subscription {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Subscription(RawSubscription::Many(iter.into_iter().collect()))
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    Rc(#[allow(unused)] Rc<dyn Any>),
    Many(Vec<Subscription>),
}

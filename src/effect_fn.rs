use std::{
    cell::{Cell, RefCell},
    mem::replace,
    rc::{Rc, Weak},
};

use crate::{
    core::{BindSink, Sink, SinkId, Slot, SourceBindings, Task},
    ActionContext, Devtools, SignalContext, Subscription,
};


/// Call a function now and again each time a dependency changes.
///
/// Dependencies are the signals and reactive properties read through the `SignalContext` passed to `f`.
/// They are collected from scratch on every run, so a dependency that is no longer read stops triggering the effect.
///
/// Re-runs happen in [`Runtime::flush`](crate::core::Runtime::flush).
/// An effect whose dependencies change several times before a flush runs once.
///
/// If the [`Subscription`] returned from this function is dropped, the function will not be called again.
pub fn effect(f: impl FnMut(&mut SignalContext) + 'static, ac: &mut ActionContext) -> Subscription {
    let node = EffectNode::new(f);
    node.run(ac);
    Subscription::from_rc(node)
}

struct EffectData<F> {
    f: F,
    sources: SourceBindings,
}

struct EffectNode<F> {
    id: SinkId,
    data: RefCell<EffectData<F>>,
    is_scheduled: Cell<bool>,
}
impl<F> EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn new(f: F) -> Rc<Self> {
        let id = SinkId::new();
        Rc::new(Self {
            id,
            data: RefCell::new(EffectData {
                f,
                sources: SourceBindings::new(id),
            }),
            is_scheduled: Cell::new(false),
        })
    }

    fn schedule(self: &Rc<Self>) {
        if !self.is_scheduled.replace(true) {
            Task::from_weak_fn(Rc::downgrade(self), |this, ac| this.run(ac))
                .on_cancel(|this: Rc<Self>| this.is_scheduled.set(false))
                .schedule()
        }
    }
    fn run(self: &Rc<Self>, ac: &mut ActionContext) {
        self.is_scheduled.set(false);
        let d = &mut *self.data.borrow_mut();
        d.sources.clear();
        if Devtools::current().log_effects {
            tracing::trace!(effect = ?self.id, "effect executed");
        }
        let sources = replace(&mut d.sources, SourceBindings::new(self.id));
        let this = Rc::downgrade(self);
        let this: Weak<dyn BindSink> = this;
        let mut sink = Sink::new(this, sources);
        (d.f)(&mut SignalContext::new(ac, Some(&mut sink)));
        d.sources = sink.into_sources();
    }
}

impl<F> BindSink for EffectNode<F>
where
    F: FnMut(&mut SignalContext) + 'static,
{
    fn notify(self: Rc<Self>, _slot: &Slot) {
        self.schedule();
    }
}

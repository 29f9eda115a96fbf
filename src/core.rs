use std::{
    any::Any,
    cell::RefCell,
    future::{poll_fn, Future},
    marker::PhantomData,
    mem::{replace, take},
    pin::Pin,
    rc::{Rc, Weak},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    task::{Context, Poll, Wake, Waker},
    thread::AccessError,
};

use derive_ex::derive_ex;
use indexmap::IndexMap;
use slabmap::SlabMap;

use crate::Devtools;


thread_local! {
    static GLOBALS: RefCell<Globals> = RefCell::new(Globals::new());
}

struct Globals {
    is_runtime_exists: bool,
    polling: usize,
    devtools: Devtools,
    notifys: Vec<NotifyTask>,
    tasks: Vec<Task>,
    actions: SlabMap<Rc<AsyncAction>>,
    need_wake: bool,
    wakes: WakeRequests,
}
impl Globals {
    fn new() -> Self {
        Self {
            is_runtime_exists: false,
            polling: 0,
            devtools: Devtools::default(),
            notifys: Vec::new(),
            tasks: Vec::new(),
            actions: SlabMap::new(),
            need_wake: false,
            wakes: WakeRequests::default(),
        }
    }
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        GLOBALS.with(|g| f(&mut g.borrow_mut()))
    }
    fn try_with<T>(f: impl FnOnce(&mut Self) -> T) -> Result<T, AccessError> {
        GLOBALS.try_with(|g| f(&mut g.borrow_mut()))
    }
    fn swap_vec<T>(f: impl FnOnce(&mut Self) -> &mut Vec<T>, values: &mut Vec<T>) -> bool {
        Self::with(|g| std::mem::swap(f(g), values));
        !values.is_empty()
    }
    fn assert_exists(&self) {
        if !self.is_runtime_exists {
            panic!("`Runtime` is not created.");
        }
    }

    fn push_notify(&mut self, sink: Weak<dyn BindSink>) {
        self.notifys.push(NotifyTask { sink });
        self.wake();
    }
    fn push_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.wake();
    }
    fn take_woken(&mut self) -> Vec<Rc<AsyncAction>> {
        let mut keys = take(&mut self.wakes.lock().wakes);
        keys.sort_unstable();
        keys.dedup();
        keys.into_iter()
            .filter_map(|key| self.actions.get(key).cloned())
            .collect()
    }
    fn wait_for_ready(&mut self, cx: &Context) -> Poll<()> {
        self.need_wake = false;
        if !self.notifys.is_empty() || !self.tasks.is_empty() {
            return Poll::Ready(());
        }
        let mut requests = self.wakes.lock();
        if !requests.wakes.is_empty() {
            return Poll::Ready(());
        }
        requests.waker = Some(cx.waker().clone());
        self.need_wake = true;
        Poll::Pending
    }
    fn wake(&mut self) {
        if !self.need_wake {
            return;
        }
        self.need_wake = false;
        self.wakes.lock().wake();
    }
}

/// Reactive runtime.
///
/// Owns the notification queue, the effect queue and the executor for asynchronous actions of the current thread.
///
/// Only one `Runtime` can exist in a thread at a time.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    ac: ActionContext,
    notifys_buffer: Vec<NotifyTask>,
    tasks_buffer: Vec<Task>,
}
impl Runtime {
    pub fn new() -> Self {
        if Globals::with(|g| {
            g.devtools = Devtools::default();
            replace(&mut g.is_runtime_exists, true)
        }) {
            panic!("Only one `Runtime` can exist in the same thread at the same time.");
        };
        Self {
            ac: ActionContext::new(),
            notifys_buffer: Vec::new(),
            tasks_buffer: Vec::new(),
        }
    }

    /// Returns the context used to change state.
    pub fn ac(&mut self) -> &mut ActionContext {
        &mut self.ac
    }

    /// Returns a context that reads state without tracking dependencies.
    pub fn sc(&mut self) -> SignalContext<'_> {
        self.ac.sc()
    }

    /// Replaces the logging switches.
    pub fn set_devtools(&mut self, devtools: Devtools) {
        Globals::with(|g| g.devtools = devtools);
    }

    /// Delivers pending signal notifications and re-runs the effects they schedule, until both queues are empty.
    ///
    /// This is the point at which batched writes become visible to effects.
    ///
    /// Returns `true` if any notification was delivered or any effect was run.
    pub fn flush(&mut self) -> bool {
        let mut handled = false;
        let mut notifys = take(&mut self.notifys_buffer);
        let mut tasks = take(&mut self.tasks_buffer);
        loop {
            if Globals::swap_vec(|g| &mut g.notifys, &mut notifys) {
                for notify in notifys.drain(..) {
                    notify.call_notify();
                }
                handled = true;
                continue;
            }
            if Globals::swap_vec(|g| &mut g.tasks, &mut tasks) {
                for task in tasks.drain(..) {
                    task.run(&mut self.ac);
                }
                handled = true;
                continue;
            }
            break;
        }
        self.notifys_buffer = notifys;
        self.tasks_buffer = tasks;
        handled
    }

    /// Polls the asynchronous actions whose wakers have been woken.
    ///
    /// Returns `true` if any action was polled.
    pub fn run_actions(&mut self) -> bool {
        let actions = Globals::with(|g| g.take_woken());
        for action in &actions {
            action.poll();
        }
        !actions.is_empty()
    }

    /// Repeat [`flush`](Self::flush) and [`run_actions`](Self::run_actions) until there is nothing left to do.
    pub fn update(&mut self) {
        loop {
            if self.flush() {
                continue;
            }
            if self.run_actions() {
                continue;
            }
            break;
        }
    }

    /// Wait while there is no process to be executed by [`update`](Self::update).
    pub async fn wait_for_ready(&mut self) {
        poll_fn(|cx| Globals::with(|g| g.wait_for_ready(cx))).await
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let (actions, notifys, tasks) = Globals::with(|g| {
            g.is_runtime_exists = false;
            (take(&mut g.actions), take(&mut g.notifys), take(&mut g.tasks))
        });
        for (_, action) in actions {
            action.cancel();
        }
        for notify in notifys {
            notify.cancel();
        }
        for task in tasks {
            task.cancel();
        }
    }
}

/// Identity of a dependency sink (an effect).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SinkId(u64);

impl SinkId {
    pub fn new() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        SinkId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}
impl Default for SinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// The part of a source that a dependency refers to.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Slot {
    /// The whole value of a signal.
    Value,
    /// A property of a reactive object.
    Key(Rc<str>),
    /// An element of a reactive list.
    Index(usize),
    /// The length of a reactive list or the key set of a reactive object.
    Len,
}

struct SourceBinding {
    source: Rc<dyn BindSource>,
    slot: Slot,
}

/// Dependencies recorded by one run of a sink.
///
/// Dropping `SourceBindings` removes the sink from every source it was bound to.
pub struct SourceBindings {
    sink: SinkId,
    items: Vec<SourceBinding>,
}

impl SourceBindings {
    pub fn new(sink: SinkId) -> Self {
        Self {
            sink,
            items: Vec::new(),
        }
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn clear(&mut self) {
        for b in self.items.drain(..) {
            b.source.unbind(&b.slot, self.sink);
        }
    }
}
impl Drop for SourceBindings {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Subscribers of one source slot, in registration order.
#[derive(Default)]
pub struct SinkBindings(IndexMap<SinkId, Weak<dyn BindSink>>);

impl SinkBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the sink of `sc` (if any) as a subscriber.
    ///
    /// A sink that already subscribed during its current run is not registered twice.
    pub fn bind(&mut self, this: Rc<dyn BindSource>, slot: Slot, sc: &mut SignalContext) {
        let Some(sink) = &mut sc.sink else {
            return;
        };
        if self.0.contains_key(&sink.id) {
            return;
        }
        self.0.insert(sink.id, sink.this.clone());
        sink.sources.items.push(SourceBinding { source: this, slot });
    }

    /// Unbinds the dependency of the given sink.
    pub fn unbind(&mut self, sink: SinkId) {
        self.0.shift_remove(&sink);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Notifies every subscriber in registration order.
    pub fn notify(&self, slot: &Slot) {
        for sink in self.0.values() {
            if let Some(sink) = sink.upgrade() {
                sink.notify(slot);
            }
        }
    }
}

/// A running sink: the subscriber attributed with every tracked read.
pub struct Sink {
    id: SinkId,
    this: Weak<dyn BindSink>,
    sources: SourceBindings,
}
impl Sink {
    pub fn new(this: Weak<dyn BindSink>, sources: SourceBindings) -> Self {
        Self {
            id: sources.sink,
            this,
            sources,
        }
    }
    pub fn id(&self) -> SinkId {
        self.id
    }
    pub fn into_sources(self) -> SourceBindings {
        self.sources
    }
}

/// Context for retrieving state and tracking dependencies.
///
/// While an effect runs it receives a `SignalContext` that carries the effect as the current sink.
/// Every read made through that context subscribes the effect.
pub struct SignalContext<'s> {
    ac: &'s mut ActionContext,
    sink: Option<&'s mut Sink>,
}

impl<'s> SignalContext<'s> {
    pub fn new(ac: &'s mut ActionContext, sink: Option<&'s mut Sink>) -> Self {
        Self { ac, sink }
    }

    /// Returns the context used to change state.
    ///
    /// Reads made through `ac().sc()` are not tracked.
    pub fn ac(&mut self) -> &mut ActionContext {
        &mut *self.ac
    }

    /// Returns `true` if reads through this context register a dependency.
    pub fn is_tracking(&self) -> bool {
        self.sink.is_some()
    }

    /// Call a function with a [`SignalContext`] that does not track dependencies.
    pub fn untrack<T>(&mut self, f: impl FnOnce(&mut SignalContext<'s>) -> T) -> T {
        struct UntrackGuard<'s, 'a> {
            sc: &'a mut SignalContext<'s>,
            sink: Option<&'s mut Sink>,
        }
        impl Drop for UntrackGuard<'_, '_> {
            fn drop(&mut self) {
                self.sc.sink = self.sink.take();
            }
        }
        f(UntrackGuard {
            sink: self.sink.take(),
            sc: self,
        }
        .sc)
    }
}

/// Context for changing state.
///
/// Only the [`Runtime`] hands out an `ActionContext`, so holding one proves that the runtime of this thread exists.
pub struct ActionContext {
    _not_send: PhantomData<*mut ()>,
}

impl ActionContext {
    fn new() -> Self {
        Self {
            _not_send: PhantomData,
        }
    }

    /// Returns a context that reads state without tracking dependencies.
    pub fn sc(&mut self) -> SignalContext<'_> {
        SignalContext::new(self, None)
    }
}

pub trait BindSink: 'static {
    fn notify(self: Rc<Self>, slot: &Slot);

    /// Called instead of [`notify`](Self::notify) when a scheduled notification is discarded
    /// because the runtime was dropped before delivering it.
    fn cancel_notify(self: Rc<Self>) {}
}

pub trait BindSource: 'static {
    fn unbind(&self, slot: &Slot, sink: SinkId);
}

/// Schedules a notification of `sink`, delivered by the next [`Runtime::flush`].
pub fn schedule_notify(sink: Weak<dyn BindSink>) {
    let _ = Globals::try_with(|g| g.push_notify(sink));
}

/// Returns the logging switches of the current thread.
pub(crate) fn devtools() -> Devtools {
    Globals::try_with(|g| g.devtools).unwrap_or_default()
}

struct NotifyTask {
    sink: Weak<dyn BindSink>,
}
impl NotifyTask {
    fn call_notify(&self) {
        if let Some(sink) = self.sink.upgrade() {
            sink.notify(&Slot::Value)
        }
    }
    fn cancel(self) {
        if let Some(sink) = self.sink.upgrade() {
            sink.cancel_notify()
        }
    }
}

/// A unit of work run by [`Runtime::flush`].
pub struct Task {
    this: Weak<dyn Any>,
    #[allow(clippy::type_complexity)]
    f: Box<dyn Fn(Rc<dyn Any>, &mut ActionContext)>,
    on_cancel: Option<Box<dyn Fn(Rc<dyn Any>)>>,
}

impl Task {
    /// Creates a task that calls `f` if `this` is still alive when the task runs.
    pub fn from_weak_fn<T: Any>(
        this: Weak<T>,
        f: impl Fn(Rc<T>, &mut ActionContext) + Copy + 'static,
    ) -> Self {
        Task {
            this,
            f: Box::new(move |this, ac| {
                if let Ok(this) = this.downcast() {
                    f(this, ac)
                }
            }),
            on_cancel: None,
        }
    }

    /// Sets a function called instead of the task if the runtime is dropped before the task runs.
    pub fn on_cancel<T: Any>(mut self, f: impl Fn(Rc<T>) + 'static) -> Self {
        self.on_cancel = Some(Box::new(move |this| {
            if let Ok(this) = this.downcast() {
                f(this)
            }
        }));
        self
    }

    pub fn schedule(self) {
        let _ = Globals::try_with(|g| g.push_task(self));
    }
    fn run(self, ac: &mut ActionContext) {
        if let Some(this) = self.this.upgrade() {
            (self.f)(this, ac)
        }
    }
    fn cancel(self) {
        if let (Some(this), Some(f)) = (self.this.upgrade(), self.on_cancel) {
            f(this)
        }
    }
}

/// Spawns a new asynchronous action.
///
/// The future is polled once immediately and afterwards by [`Runtime::run_actions`] whenever its waker is woken.
pub fn spawn_action_async<Fut>(f: impl FnOnce(AsyncActionContext) -> Fut, ac: &mut ActionContext)
where
    Fut: Future<Output = ()> + 'static,
{
    AsyncAction::start(f(AsyncActionContext(PhantomData)), ac)
}

struct AsyncAction {
    data: RefCell<Option<AsyncActionData>>,
}

struct AsyncActionData {
    future: Pin<Box<dyn Future<Output = ()>>>,
    waker: Waker,
    id: usize,
}

impl AsyncAction {
    fn start(future: impl Future<Output = ()> + 'static, _ac: &mut ActionContext) {
        let action = Rc::new(Self {
            data: RefCell::new(None),
        });
        let (id, waker) = Globals::with(|g| {
            g.assert_exists();
            let id = g.actions.insert(action.clone());
            let waker: Waker = RawWake::new(&g.wakes, id).into();
            (id, waker)
        });
        *action.data.borrow_mut() = Some(AsyncActionData {
            future: Box::pin(future),
            waker,
            id,
        });
        action.poll();
    }

    fn poll(&self) {
        let _guard = PollingGuard::new();
        let mut data = self.data.borrow_mut();
        let Some(d) = data.as_mut() else {
            return;
        };
        let mut cx = Context::from_waker(&d.waker);
        if d.future.as_mut().poll(&mut cx).is_ready() {
            let id = d.id;
            let finished = data.take();
            drop(data);
            Globals::with(|g| g.actions.remove(id));
            drop(finished);
        }
    }

    fn cancel(&self) {
        let finished = self.data.borrow_mut().take();
        drop(finished);
    }
}

struct PollingGuard;

impl PollingGuard {
    fn new() -> Self {
        Globals::with(|g| g.polling += 1);
        PollingGuard
    }
}
impl Drop for PollingGuard {
    fn drop(&mut self) {
        let _ = Globals::try_with(|g| g.polling -= 1);
    }
}

#[cfg(test)]
pub(crate) fn action_count() -> usize {
    Globals::with(|g| g.actions.len())
}

/// Context for asynchronous state change.
pub struct AsyncActionContext(PhantomData<*mut ()>);

impl AsyncActionContext {
    /// Calls `f` with an [`ActionContext`].
    ///
    /// Panics if called while the runtime is not polling an asynchronous action.
    pub fn call<T>(&self, f: impl FnOnce(&mut ActionContext) -> T) -> T {
        assert!(
            Globals::with(|g| g.polling > 0),
            "`AsyncActionContext` can only be used while the runtime polls its action."
        );
        f(&mut ActionContext::new())
    }
}

#[derive(Clone, Default)]
struct WakeRequests(Arc<Mutex<RawWakeRequests>>);

impl WakeRequests {
    fn lock(&self) -> MutexGuard<RawWakeRequests> {
        self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct RawWakeRequests {
    wakes: Vec<usize>,
    waker: Option<Waker>,
}
impl RawWakeRequests {
    fn wake(&mut self) {
        if let Some(waker) = self.waker.take() {
            waker.wake();
        }
    }
}

struct RawWake {
    requests: WakeRequests,
    key: usize,
}
impl RawWake {
    fn new(requests: &WakeRequests, key: usize) -> Arc<Self> {
        Arc::new(RawWake {
            requests: requests.clone(),
            key,
        })
    }
}

impl Wake for RawWake {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref()
    }
    fn wake_by_ref(self: &Arc<Self>) {
        let mut requests = self.requests.lock();
        requests.wakes.push(self.key);
        requests.wake();
    }
}

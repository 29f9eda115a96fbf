use std::{
    cell::{Cell, RefCell},
    error::Error,
    future::Future,
    rc::Rc,
};

use derive_ex::derive_ex;
use parse_display::Display;

use crate::{
    spawn_action_async, ActionContext, CancellationToken, Devtools, Signal, SignalValue,
};


/// The error of a fetch started by [`AsyncSignal::refresh`].
#[derive(Display, Debug, Clone)]
pub enum FetchError {
    /// The fetch was abandoned. It is never stored in [`AsyncSignal::error`].
    #[display("fetch canceled.")]
    Canceled,
    #[display("{0}")]
    Failed(Rc<dyn Error>),
}

impl FetchError {
    pub fn failed(e: impl Error + 'static) -> Self {
        Self::Failed(Rc::new(e))
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Canceled => None,
            Self::Failed(e) => Some(&**e),
        }
    }
}

impl SignalValue for FetchError {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Canceled, Self::Canceled) => true,
            (Self::Failed(a), Self::Failed(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Creates an [`AsyncSignal`] holding `initial` until the first fetch succeeds.
///
/// `fetcher(args, token)` is called by every [`refresh`](AsyncSignal::refresh).
/// `token` is canceled when a newer refresh starts; the fetcher may observe it to stop early,
/// but the result of a superseded fetch is discarded either way.
///
/// A superseded fetch stays on the runtime until its future completes.
/// A fetcher that might never complete should wait through [`CancellationToken::until_canceled`]
/// so that it is released once superseded.
pub fn async_signal<T, A, Fut>(
    initial: T,
    fetcher: impl Fn(A, CancellationToken) -> Fut + 'static,
) -> AsyncSignal<T, A>
where
    T: SignalValue,
    A: 'static,
    Fut: Future<Output = Result<T, FetchError>> + 'static,
{
    let value = Signal::new(initial);
    let loading = Signal::new(false);
    let error = Signal::new(None);
    let node = Rc::new(FetchNode {
        value: value.clone(),
        loading: loading.clone(),
        error: error.clone(),
        fetcher,
        seq: Cell::new(0),
        token: RefCell::new(None),
    });
    AsyncSignal {
        value,
        loading,
        error,
        refresh: Refresh(node),
    }
}

/// A value loaded by an asynchronous fetch, with its loading flag and last error.
///
/// Only the latest fetch can change the signals: starting a new one cancels the previous one,
/// and a fetch that completes after being superseded writes nothing.
pub struct AsyncSignal<T: 'static, A: 'static> {
    value: Signal<T>,
    loading: Signal<bool>,
    error: Signal<Option<FetchError>>,
    refresh: Refresh<A>,
}

impl<T: 'static, A: 'static> AsyncSignal<T, A> {
    pub fn value(&self) -> &Signal<T> {
        &self.value
    }

    /// `true` from the start of a refresh until the latest fetch settles.
    pub fn loading(&self) -> &Signal<bool> {
        &self.loading
    }

    /// The error of the latest failed fetch, cleared by the next successful one.
    pub fn error(&self) -> &Signal<Option<FetchError>> {
        &self.error
    }

    /// Starts a fetch with `args`, canceling the one in flight.
    pub fn refresh(&self, args: A, ac: &mut ActionContext) {
        self.refresh.call(args, ac)
    }

    /// Cancels the fetch in flight and clears the loading flag.
    pub fn cancel(&self, ac: &mut ActionContext) {
        self.refresh.cancel(ac)
    }

    pub fn refresher(&self) -> Refresh<A> {
        self.refresh.clone()
    }

    /// Splits into `(value, refresh, loading, error)`.
    pub fn into_parts(
        self,
    ) -> (
        Signal<T>,
        Refresh<A>,
        Signal<bool>,
        Signal<Option<FetchError>>,
    ) {
        (self.value, self.refresh, self.loading, self.error)
    }
}

/// A handle that starts fetches of an [`AsyncSignal`].
#[derive_ex(Clone, bound())]
pub struct Refresh<A: 'static>(Rc<dyn FetchTarget<A>>);

impl<A: 'static> Refresh<A> {
    pub fn call(&self, args: A, ac: &mut ActionContext) {
        self.0.clone().refresh(args, ac)
    }
    pub fn cancel(&self, ac: &mut ActionContext) {
        self.0.cancel(ac)
    }
}

trait FetchTarget<A> {
    fn refresh(self: Rc<Self>, args: A, ac: &mut ActionContext);
    fn cancel(&self, ac: &mut ActionContext);
}

struct FetchNode<T: 'static, F> {
    value: Signal<T>,
    loading: Signal<bool>,
    error: Signal<Option<FetchError>>,
    fetcher: F,
    seq: Cell<u64>,
    token: RefCell<Option<CancellationToken>>,
}

impl<T, F> FetchNode<T, F>
where
    T: SignalValue,
{
    fn start(&self) -> (u64, CancellationToken) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        let token = CancellationToken::new();
        *self.token.borrow_mut() = Some(token.clone());
        (seq, token)
    }

    fn complete(&self, seq: u64, result: Result<T, FetchError>, ac: &mut ActionContext) {
        let log = Devtools::current().log_async;
        if self.seq.get() != seq {
            if log {
                tracing::debug!(seq, "fetch canceled");
            }
            return;
        }
        self.token.take();
        match result {
            Ok(value) => {
                if log {
                    tracing::debug!(seq, "fetch succeeded");
                }
                self.value.set(value, ac);
                self.error.set(None, ac);
            }
            Err(FetchError::Canceled) => {
                if log {
                    tracing::debug!(seq, "fetch canceled");
                }
            }
            Err(e) => {
                if log {
                    tracing::warn!(seq, error = %e, "fetch failed");
                }
                self.error.set(Some(e), ac);
            }
        }
        self.loading.set(false, ac);
    }
}

impl<T, A, F, Fut> FetchTarget<A> for FetchNode<T, F>
where
    T: SignalValue,
    A: 'static,
    F: Fn(A, CancellationToken) -> Fut + 'static,
    Fut: Future<Output = Result<T, FetchError>> + 'static,
{
    fn refresh(self: Rc<Self>, args: A, ac: &mut ActionContext) {
        let (seq, token) = self.start();
        if Devtools::current().log_async {
            tracing::debug!(seq, "fetch started");
        }
        self.loading.set(true, ac);
        let fut = (self.fetcher)(args, token);
        spawn_action_async(
            move |aac| async move {
                let result = fut.await;
                aac.call(|ac| self.complete(seq, result, ac));
            },
            ac,
        );
    }

    fn cancel(&self, ac: &mut ActionContext) {
        let Some(token) = self.token.take() else {
            return;
        };
        token.cancel();
        self.seq.set(self.seq.get() + 1);
        if Devtools::current().log_async {
            tracing::debug!(seq = self.seq.get(), "fetch canceled");
        }
        self.loading.set(false, ac);
    }
}

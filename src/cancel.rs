use std::{
    fmt,
    future::{poll_fn, Future},
    mem::take,
    pin::pin,
    sync::{Arc, Mutex, MutexGuard},
    task::{Poll, Waker},
};

use futures::future::{select, Either};
use slabmap::SlabMap;

use crate::FetchError;


struct CancelState {
    is_canceled: bool,
    wakers: SlabMap<Waker>,
}

/// A cooperative cancellation flag shared by the clones of a token.
///
/// [`AsyncSignal`](crate::AsyncSignal) hands one token to each fetch and cancels it when a newer fetch starts.
#[derive(Clone)]
pub struct CancellationToken(Arc<Mutex<CancelState>>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(CancelState {
            is_canceled: false,
            wakers: SlabMap::new(),
        })))
    }
    fn lock(&self) -> MutexGuard<CancelState> {
        self.0.lock().unwrap()
    }

    /// Cancels the token and wakes every task waiting in [`canceled`](Self::canceled).
    pub fn cancel(&self) {
        let mut d = self.lock();
        d.is_canceled = true;
        for (_, waker) in take(&mut d.wakers) {
            waker.wake();
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.lock().is_canceled
    }

    /// Returns `Err(FetchError::Canceled)` if the token has been canceled.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_canceled() {
            Err(FetchError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Completes when the token is canceled.
    pub async fn canceled(&self) {
        let mut key = WakerKeyGuard::new(self);
        poll_fn(|cx| {
            let mut d = self.lock();
            if d.is_canceled {
                Poll::Ready(())
            } else {
                if let Some(key) = key.key {
                    d.wakers[key].clone_from(cx.waker());
                } else {
                    key.key = Some(d.wakers.insert(cx.waker().clone()));
                }
                Poll::Pending
            }
        })
        .await
    }

    /// Runs `fut` until it completes or the token is canceled, whichever comes first.
    pub async fn until_canceled<Fut: Future>(&self, fut: Fut) -> Result<Fut::Output, FetchError> {
        self.check()?;
        match select(pin!(fut), pin!(self.canceled())).await {
            Either::Left((value, _)) => Ok(value),
            Either::Right(_) => Err(FetchError::Canceled),
        }
    }
}
impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_canceled", &self.is_canceled())
            .finish()
    }
}

struct WakerKeyGuard<'a> {
    token: &'a CancellationToken,
    key: Option<usize>,
}
impl<'a> WakerKeyGuard<'a> {
    fn new(token: &'a CancellationToken) -> Self {
        Self { token, key: None }
    }
}
impl Drop for WakerKeyGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.token.lock().wakers.remove(key);
        }
    }
}

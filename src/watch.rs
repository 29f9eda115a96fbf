use crate::{effect, ActionContext, Devtools, Signal, SignalValue, Subscription};


/// Calls `f(new, old, ac)` each time the value of `signal` changes.
///
/// The value present when `watch` is called is only recorded, `f` is not called for it.
/// `old` is the value observed by the previous call, so several writes before one flush are reported as a single transition.
/// A batch that ends on the observed value does not call `f`.
///
/// `f` receives an `ActionContext` only, so the signals it reads do not become dependencies of the watch.
pub fn watch<T: SignalValue + Clone>(
    signal: &Signal<T>,
    mut f: impl FnMut(&T, &T, &mut ActionContext) + 'static,
    ac: &mut ActionContext,
) -> Subscription {
    let signal = signal.clone();
    let mut last: Option<T> = None;
    effect(
        move |sc| {
            let new = signal.get(sc);
            if let Some(old) = &last {
                if !old.same_value(&new) {
                    if Devtools::current().log_effects {
                        tracing::trace!("watch triggered");
                    }
                    f(&new, old, sc.ac());
                }
            }
            last = Some(new);
        },
        ac,
    )
}

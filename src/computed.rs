use std::{
    cell::{Cell, OnceCell},
    rc::{Rc, Weak},
};

use crate::{effect, signal::SignalNode, ActionContext, Signal, SignalContext, SignalValue};


/// Creates a [`Signal`] holding the latest result of `f`.
///
/// `f` runs inside an effect. The first run produces the initial value,
/// and every re-run writes its result to the returned signal, so an unchanged result does not notify dependents.
///
/// The returned signal keeps the effect alive. It is read-only by convention: a value set from outside is
/// overwritten the next time a dependency of `f` changes.
pub fn computed<T: SignalValue>(
    mut f: impl FnMut(&mut SignalContext) -> T + 'static,
    ac: &mut ActionContext,
) -> Signal<T> {
    let target: Rc<OnceCell<Weak<SignalNode<T>>>> = Rc::new(OnceCell::new());
    let initial = Rc::new(Cell::new(None));
    let subscription = effect(
        {
            let target = target.clone();
            let initial = initial.clone();
            move |sc| {
                let value = f(sc);
                match target.get() {
                    Some(node) => {
                        if let Some(node) = node.upgrade() {
                            Signal(node).set(value, sc.ac());
                        }
                    }
                    None => initial.set(Some(value)),
                }
            }
        },
        ac,
    );
    let Some(value) = initial.take() else {
        unreachable!("an effect runs when it is created");
    };
    let signal = Signal::new(value);
    let _ = target.set(Rc::downgrade(&signal.0));
    signal.own(subscription);
    signal
}

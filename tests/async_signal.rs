use std::{cell::RefCell, rc::Rc};

use futures::channel::oneshot;
use nth_signals::{async_signal, effect, CancellationToken, FetchError, Runtime};

#[test]
fn latest_refresh_wins() {
    let mut rt = Runtime::new();
    let senders = Rc::new(RefCell::new(Vec::new()));
    let s = senders.clone();
    let (value, refresh, loading, error) = async_signal(
        String::new(),
        move |query: &'static str, _token: CancellationToken| {
            let (sender, receiver) = oneshot::channel::<String>();
            s.borrow_mut().push(sender);
            async move {
                let text = receiver.await.map_err(|_| FetchError::Canceled)?;
                Ok::<_, FetchError>(format!("{query}:{text}"))
            }
        },
    )
    .into_parts();

    let log = Rc::new(RefCell::new(Vec::new()));
    let _e = effect(
        {
            let value = value.clone();
            let loading = loading.clone();
            let log = log.clone();
            move |sc| {
                let entry = format!("{} {}", value.get(sc), loading.get(sc));
                log.borrow_mut().push(entry);
            }
        },
        rt.ac(),
    );

    refresh.call("x", rt.ac());
    refresh.call("y", rt.ac());
    rt.update();

    let y = senders.borrow_mut().remove(1);
    let x = senders.borrow_mut().remove(0);
    let _ = y.send("2".to_string());
    rt.update();
    let _ = x.send("1".to_string());
    rt.update();

    assert_eq!(value.get(&mut rt.sc()), "y:2");
    assert!(!loading.get(&mut rt.sc()));
    assert!(error.borrow(&mut rt.sc()).is_none());
    assert_eq!(*log.borrow(), [" false", " true", "y:2 false"]);
}

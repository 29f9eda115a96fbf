use std::rc::Rc;

use assert_call::{call, CallRecorder};

use crate::{core::Runtime, effect, Signal};

#[test]
fn new() {
    let mut rt = Runtime::new();
    let s = Signal::new(10);
    assert_eq!(s.get(&mut rt.sc()), 10);
}

#[test]
fn read_after_write() {
    let mut rt = Runtime::new();
    let s = Signal::new(10);

    s.set(20, rt.ac());
    assert_eq!(s.get(&mut rt.sc()), 20);

    s.set(30, rt.ac());
    assert_eq!(s.get(&mut rt.sc()), 30);
}

#[test]
fn update() {
    let mut rt = Runtime::new();
    let s = Signal::new(vec![1, 2]);
    s.update(|v| v.iter().map(|x| x * 10).collect(), rt.ac());
    assert_eq!(*s.borrow(&mut rt.sc()), vec![10, 20]);
}

#[test]
fn set_effect() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = Signal::new(10);
    let s0 = s.clone();
    let _e = effect(
        move |sc| {
            call!("{}", s0.get(sc));
        },
        rt.ac(),
    );
    cr.verify("10");

    s.set(20, rt.ac());
    cr.verify(());
    rt.flush();
    cr.verify("20");
}

#[test]
fn zero_sign_is_a_change() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = Signal::new(0.0);
    let s0 = s.clone();
    let _e = effect(move |sc| call!("{:?}", s0.get(sc)), rt.ac());
    cr.verify("0.0");

    s.set(-0.0, rt.ac());
    rt.flush();
    cr.verify("-0.0");
}

#[test]
fn rc_values_compare_by_identity() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let s = Signal::new(Rc::new(1));
    let s0 = s.clone();
    let _e = effect(move |sc| call!("{}", s0.get(sc)), rt.ac());
    cr.verify("1");

    s.set(Rc::new(1), rt.ac());
    rt.flush();
    cr.verify("1");

    let same = s.get(&mut rt.sc());
    s.set(same, rt.ac());
    rt.flush();
    cr.verify(());
}

#[test]
fn writes_to_two_signals_run_effect_once() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let a = Signal::new(1);
    let b = Signal::new(2);
    let _e = effect(
        {
            let a = a.clone();
            let b = b.clone();
            move |sc| call!("{}", a.get(sc) + b.get(sc))
        },
        rt.ac(),
    );
    cr.verify("3");

    a.set(10, rt.ac());
    b.set(20, rt.ac());
    rt.flush();
    cr.verify("30");
}

#[test]
fn subscriber_count() {
    let mut rt = Runtime::new();
    let s = Signal::new(1);
    assert_eq!(s.subscriber_count(), 0);

    let s0 = s.clone();
    let e0 = effect(
        move |sc| {
            s0.get(sc);
        },
        rt.ac(),
    );
    let s1 = s.clone();
    let e1 = effect(
        move |sc| {
            s1.get(sc);
        },
        rt.ac(),
    );
    assert_eq!(s.subscriber_count(), 2);
    drop(e0);
    assert_eq!(s.subscriber_count(), 1);
    drop(e1);
    assert_eq!(s.subscriber_count(), 0);
}

#[test]
fn untracked_reads_do_not_subscribe() {
    let mut rt = Runtime::new();
    let s = Signal::new(1);
    s.get(&mut rt.sc());
    assert_eq!(s.subscriber_count(), 0);
}

#[test]
fn clone_shares_cell() {
    let mut rt = Runtime::new();
    let s = Signal::new(1);
    let s0 = s.clone();
    assert!(s.ptr_eq(&s0));
    assert!(!s.ptr_eq(&Signal::new(1)));

    s0.set(2, rt.ac());
    assert_eq!(s.get(&mut rt.sc()), 2);
}

#[test]
fn serialize() {
    let s = Signal::new(vec![1, 2, 3]);
    assert_eq!(serde_json::to_string(&s).unwrap(), "[1,2,3]");
}

#[test]
fn deserialize() {
    let mut rt = Runtime::new();
    let s: Signal<Vec<i32>> = serde_json::from_str("[1,2,3]").unwrap();
    assert_eq!(s.get(&mut rt.sc()), vec![1, 2, 3]);
}

#[test]
fn debug() {
    let s = Signal::new("abc".to_string());
    assert_eq!(format!("{s:?}"), "\"abc\"");
}

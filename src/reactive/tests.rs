use assert_call::{call, CallRecorder};

use super::*;
use crate::{core::Runtime, effect, Signal};

fn json(s: &str) -> Value {
    serde_json::from_str(s).unwrap()
}

#[test]
fn wrap_keeps_primitives() {
    assert_eq!(wrap(Value::Null), Value::Null);
    assert_eq!(wrap(Value::from(1)), Value::from(1));
    assert_eq!(wrap(Value::from("a")), Value::from("a"));
    assert!(!wrap(Value::from(true)).is_reactive());
}

#[test]
fn wrap_is_idempotent() {
    let raw = Object::new();
    let w0 = wrap(Value::Object(raw.clone()));
    let w1 = wrap(Value::Object(raw));
    let w2 = wrap(w0.clone());
    let (Some(o0), Some(o1), Some(o2)) = (
        w0.as_reactive_object(),
        w1.as_reactive_object(),
        w2.as_reactive_object(),
    ) else {
        panic!("not reactive: {w0:?}");
    };
    assert!(o0.ptr_eq(o1));
    assert!(o0.ptr_eq(o2));
}

#[test]
fn cyclic_object_keeps_identity() {
    let mut rt = Runtime::new();
    let raw = Object::new();
    raw.insert("name", "root");
    raw.insert("self", raw.clone());

    let wrapped = wrap(Value::Object(raw.clone()));
    let child = wrapped.get("self", &mut rt.sc());
    let (Some(w), Some(c)) = (wrapped.as_reactive_object(), child.as_reactive_object()) else {
        panic!("not reactive");
    };
    assert!(w.ptr_eq(c));
    assert_eq!(child.get("self", &mut rt.sc()), wrapped);

    raw.remove("self");
}

#[test]
fn property_level_tracking() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let state = Signal::new(json(r#"{"a": 1, "b": 2}"#));

    let s = state.clone();
    let _e = effect(
        move |sc| {
            let a = s.get(sc).get("a", sc);
            call!("a={a:?}");
        },
        rt.ac(),
    );
    cr.verify("a=1.0");

    let obj = state.get(&mut rt.sc());
    obj.set("b", 20, rt.ac());
    rt.flush();
    cr.verify(());

    obj.set("a", 10, rt.ac());
    cr.verify(());
    rt.flush();
    cr.verify("a=10.0");
}

#[test]
fn same_value_property_write_is_ignored() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let obj = ReactiveObject::new();
    obj.set("x", f64::NAN, rt.ac());

    let o = obj.clone();
    let _e = effect(move |sc| call!("{:?}", o.get("x", sc)), rt.ac());
    cr.verify("NaN");

    obj.set("x", f64::NAN, rt.ac());
    rt.flush();
    cr.verify(());
}

#[test]
fn several_property_writes_run_effect_once() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let obj = ReactiveObject::new();

    let o = obj.clone();
    let _e = effect(
        move |sc| call!("{:?} {:?}", o.get("x", sc), o.get("y", sc)),
        rt.ac(),
    );
    cr.verify("null null");

    obj.set("x", 1, rt.ac());
    obj.set("y", 2, rt.ac());
    obj.set("x", 3, rt.ac());
    rt.flush();
    cr.verify("3.0 2.0");
}

#[test]
fn nested_property_tracking() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let state = Signal::new(json(r#"{"user": {"name": "a", "age": 1}}"#));

    let s = state.clone();
    let _e = effect(
        move |sc| {
            let name = s.get(sc).get("user", sc).get("name", sc);
            call!("{name:?}");
        },
        rt.ac(),
    );
    cr.verify("\"a\"");

    let root = state.get(&mut rt.sc());
    let user = root.get("user", &mut rt.sc());
    user.set("age", 2, rt.ac());
    rt.flush();
    cr.verify(());

    user.set("name", "b", rt.ac());
    rt.flush();
    cr.verify("\"b\"");
}

#[test]
fn keys_are_notified_on_insert_and_remove() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let obj = ReactiveObject::new();

    let o = obj.clone();
    let _e = effect(move |sc| call!("{:?}", o.keys(sc)), rt.ac());
    cr.verify("[]");

    obj.set("a", 1, rt.ac());
    rt.flush();
    cr.verify("[\"a\"]");

    obj.set("a", 2, rt.ac());
    rt.flush();
    cr.verify(());

    obj.remove("a", rt.ac());
    rt.flush();
    cr.verify("[]");
}

#[test]
fn list_index_and_len_tracking() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let list = ReactiveList::new();
    list.push(1, rt.ac());

    let l = list.clone();
    let _first = effect(move |sc| call!("first {:?}", l.get(0, sc)), rt.ac());
    let l = list.clone();
    let _len = effect(move |sc| call!("len {}", l.len(sc)), rt.ac());
    cr.verify(["first 1.0", "len 1"]);

    list.push(2, rt.ac());
    rt.flush();
    cr.verify("len 2");

    list.set(1, 3, rt.ac());
    rt.flush();
    cr.verify(());

    list.remove(0, rt.ac());
    rt.flush();
    cr.verify(["first 3.0", "len 1"]);

    list.insert(0, 0, rt.ac());
    rt.flush();
    cr.verify(["first 0.0", "len 2"]);

    assert_eq!(list.pop(rt.ac()), Value::from(3));
    rt.flush();
    cr.verify("len 1");
}

#[test]
fn list_set_past_end_extends() {
    let mut rt = Runtime::new();
    let list = ReactiveList::new();
    list.set(2, "x", rt.ac());
    assert_eq!(
        list.to_vec(&mut rt.sc()),
        vec![Value::Null, Value::Null, Value::from("x")]
    );
}

#[test]
fn out_of_range_and_non_container_reads_are_null() {
    let mut rt = Runtime::new();
    let list = ReactiveList::new();
    assert_eq!(list.get(5, &mut rt.sc()), Value::Null);
    assert_eq!(list.remove(5, rt.ac()), Value::Null);
    assert_eq!(Value::from(1).get("a", &mut rt.sc()), Value::Null);
    assert_eq!(Value::from("s").at(0, &mut rt.sc()), Value::Null);

    Value::from(1).set("a", 2, rt.ac());
}

#[test]
fn signal_wraps_containers() {
    let mut rt = Runtime::new();
    let s = Signal::new(json(r#"{"items": [1, 2]}"#));
    let v = s.get(&mut rt.sc());
    assert!(v.is_reactive());
    assert!(v.get("items", &mut rt.sc()).is_reactive());

    s.set(json("[1]"), rt.ac());
    assert!(s.get(&mut rt.sc()).is_reactive());
}

#[test]
fn containers_compare_by_identity() {
    let a = json(r#"{"x": 1}"#);
    let b = json(r#"{"x": 1}"#);
    assert_ne!(a, b);
    assert_eq!(wrap(a.clone()), a);
}

#[test]
fn dropping_effect_unsubscribes_properties() {
    let mut rt = Runtime::new();
    let obj = ReactiveObject::new();

    let o = obj.clone();
    let e = effect(
        move |sc| {
            o.get("a", sc);
            o.get("b", sc);
            o.len(sc);
        },
        rt.ac(),
    );
    assert_eq!(obj.subscriber_count(), 3);
    drop(e);
    assert_eq!(obj.subscriber_count(), 0);
}

#[test]
fn wrap_cache_does_not_keep_wrappers() {
    let raw = Object::new();
    let w = ReactiveObject::from_raw(raw.clone());
    assert_eq!(wrap_cache_len(), 1);
    drop(w);
    assert_eq!(wrap_cache_len(), 0);
}

#[test]
fn serialize_round_trip() {
    let text = r#"{"a":1,"b":[true,null,"x"],"c":1.5}"#;
    let value = wrap(json(text));
    assert_eq!(serde_json::to_string(&value).unwrap(), text);
}

#[test]
fn serialize_cyclic_value_fails() {
    let raw = Object::new();
    raw.insert("self", raw.clone());
    assert!(serde_json::to_string(&Value::Object(raw.clone())).is_err());
    raw.remove("self");
}

#[test]
fn debug_cyclic_value_is_bounded() {
    let raw = List::new();
    raw.push(raw.clone());
    let text = format!("{:?}", Value::List(raw.clone()));
    assert!(text.contains(".."));
    raw.pop();
}

use std::{cell::Cell, rc::Rc};

use assert_call::{call, CallRecorder};

use super::*;
use crate::core::Runtime;

#[test]
fn attributes() {
    let e = Element::new("div");
    assert_eq!(e.tag(), "div");
    assert_eq!(e.attribute("title"), None);

    e.set_attribute("title", "t");
    assert_eq!(e.attribute("title").as_deref(), Some("t"));
    assert!(e.has_attribute("title"));

    e.remove_attribute("title");
    assert!(!e.has_attribute("title"));
}

#[test]
fn empty_style_value_removes_property() {
    let e = Element::new("div");
    e.set_style("color", "red");
    assert_eq!(e.style("color").as_deref(), Some("red"));
    e.set_style("color", "");
    assert_eq!(e.style("color"), None);
}

#[test]
fn input_type() {
    assert_eq!(
        Element::input(InputType::Checkbox, "a").input_type(),
        Some(InputType::Checkbox)
    );
    assert_eq!(Element::input(InputType::Radio, "a").attribute("type").as_deref(), Some("radio"));
    assert_eq!(Element::new("div").input_type(), None);
}

#[test]
fn children() {
    let parent = Element::new("ul");
    let a = Element::new("li");
    let b = Element::new("li");
    parent.append_child(a.clone());
    parent.append_child(b.clone());
    assert_eq!(parent.child_count(), 2);

    assert!(parent.remove_child(&a));
    assert!(!parent.remove_child(&a));
    assert!(parent.children()[0].ptr_eq(&b));
}

#[test]
fn listener_is_removed_with_subscription() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let e = Element::new("button");
    let s = e.add_event_listener(EventKind::Click, |_, _| call!("click"));
    let _other = e.add_event_listener(EventKind::Input, |_, _| call!("input"));

    e.click(rt.ac());
    cr.verify("click");

    drop(s);
    assert_eq!(e.listener_count(), 1);
    e.click(rt.ac());
    cr.verify(());
}

#[test]
fn type_text_dispatches_input() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let e = Element::input(InputType::Text, "");
    let _s = e.add_event_listener(EventKind::Input, |e, _| call!("{}", e.value()));

    e.type_text("abc", rt.ac());
    cr.verify("abc");
}

#[test]
fn click_toggles_checkbox() {
    let mut rt = Runtime::new();
    let mut cr = CallRecorder::new();
    let e = Element::input(InputType::Checkbox, "a");
    let _s = e.add_event_listener(EventKind::Change, |e, _| call!("{}", e.checked()));

    e.click(rt.ac());
    e.click(rt.ac());
    cr.verify(["true", "false"]);
}

#[test]
fn kept_subscription_lives_with_element() {
    let mut cr = CallRecorder::new();
    let e = Element::new("div");
    e.keep(Subscription::from_fn(|| call!("released")));
    cr.verify(());
    drop(e);
    cr.verify("released");
}

#[test]
fn listener_can_outlive_element() {
    let e = Element::new("div");
    let removed = Rc::new(Cell::new(false));
    let r = removed.clone();
    let s = e.add_event_listener(EventKind::Click, move |_, _| r.set(true));
    drop(e);
    drop(s);
    assert!(!removed.get());
}

#[test]
fn event_kind_display() {
    assert_eq!(EventKind::Input.to_string(), "input");
    assert_eq!(InputType::Checkbox.to_string(), "checkbox");
}

use nth_signals::{
    binding::{bind_checkbox_group, bind_list, bind_text, bind_value, Keyed},
    computed,
    dom::{Element, InputType},
    Runtime, Signal, SignalValue,
};

#[derive(SignalValue, Clone, Debug)]
struct Item {
    id: u32,
    title: String,
}

impl Keyed for Item {
    fn key(&self) -> String {
        self.id.to_string()
    }
}

#[test]
fn todo_list() {
    let mut rt = Runtime::new();
    let items = Signal::new(vec![
        Item {
            id: 1,
            title: "write".to_string(),
        },
        Item {
            id: 2,
            title: "test".to_string(),
        },
    ]);
    let draft = Signal::new(String::new());

    let input = Element::input(InputType::Text, "");
    let _value = bind_value(&input, &draft, rt.ac());

    let ul = Element::new("ul");
    let _list = bind_list(
        &ul,
        &items,
        |item, _ac| {
            let li = Element::new("li");
            li.set_text(&item.title);
            li
        },
        rt.ac(),
    );

    let count = computed(
        {
            let items = items.clone();
            move |sc| items.borrow(sc).len()
        },
        rt.ac(),
    );
    let counter = Element::new("span");
    let _count = bind_text(&counter, &count, rt.ac());
    assert_eq!(counter.text(), "2");

    input.type_text("ship", rt.ac());
    let title = draft.get(&mut rt.sc());
    items.update(
        |items| {
            let mut items = items.clone();
            items.retain(|item| item.id != 1);
            items.push(Item { id: 3, title });
            items
        },
        rt.ac(),
    );
    draft.set(String::new(), rt.ac());
    rt.update();

    let texts: Vec<_> = ul.children().iter().map(|li| li.text()).collect();
    assert_eq!(texts, ["test", "ship"]);
    assert_eq!(counter.text(), "2");
    assert_eq!(input.value(), "");
}

#[test]
fn checkbox_group_toggle() {
    let mut rt = Runtime::new();
    let boxes: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|v| Element::input(InputType::Checkbox, v))
        .collect();
    let selected = Signal::new(vec!["a".to_string()]);
    let _b = bind_checkbox_group(&boxes, &selected, rt.ac());
    assert!(boxes[0].checked());
    assert!(!boxes[1].checked());

    boxes[1].click(rt.ac());
    rt.update();
    assert_eq!(selected.get(&mut rt.sc()), ["a", "b"]);
    assert!(boxes[1].checked());
}

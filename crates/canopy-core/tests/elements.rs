use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canopy_core::{h, Namespace, NodeId, PropValue, Props, VNode};
use canopy_testing::TestTree;

fn mounted(tree: &VNode) -> TestTree {
    let mut test = TestTree::new();
    test.mount(tree).expect("mount");
    test
}

#[test]
fn attributes_follow_truthiness() {
    let tree = mounted(&h(
        "input",
        Props::new()
            .with("disabled", true)
            .with("hidden", false)
            .with("title", "")
            .with("tabindex", 2)
            .with("className", "field"),
        [],
    ));
    assert_eq!(
        tree.html(),
        "<input class=\"field\" disabled tabindex=\"2\"></input>"
    );
}

#[test]
fn attribute_updates_set_and_remove() {
    let mut tree = mounted(&h(
        "div",
        Props::new().with("data-a", "1").with("title", "x"),
        [],
    ));
    let div = tree.root().find("div").expect("div");

    tree.update(&h(
        "div",
        Props::new().with("data-a", 1.5).with("data-b", "new"),
        [],
    ))
    .expect("update");

    let document = tree.root().document();
    assert_eq!(document.attribute(div, "data-a"), Some("1.5"));
    assert_eq!(document.attribute(div, "data-b"), Some("new"));
    assert_eq!(document.attribute(div, "title"), None);
}

#[test]
fn style_moves_between_text_and_map() {
    let mut tree = mounted(&h(
        "p",
        Props::new().with("style", "color: red; margin: 0"),
        [],
    ));
    let p = tree.root().find("p").expect("p");

    tree.update(&h(
        "p",
        Props::new().with("style", PropValue::style([("padding", "1px")])),
        [],
    ))
    .expect("to map");
    {
        let document = tree.root().document();
        assert_eq!(document.style_property(p, "padding"), Some("1px"));
        assert_eq!(document.style_property(p, "color"), None);
    }

    tree.update(&h(
        "p",
        Props::new().with(
            "style",
            PropValue::style([("padding", "2px"), ("color", "blue")]),
        ),
        [],
    ))
    .expect("map to map");
    assert_eq!(
        tree.html(),
        "<p style=\"color: blue; padding: 2px\"></p>"
    );

    tree.update(&h(
        "p",
        Props::new().with("style", PropValue::style([("color", "blue")])),
        [],
    ))
    .expect("drop a property");
    assert_eq!(tree.root().document().style_property(p, "padding"), None);

    tree.update(&h("p", Props::new(), [])).expect("no style");
    assert_eq!(tree.html(), "<p></p>");
}

#[test]
fn listeners_register_by_phase_and_swap_on_update() {
    let calls = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let record = |label: &'static str| {
        let calls = Rc::clone(&calls);
        PropValue::listener(move |_| calls.borrow_mut().push(label))
    };
    let build = |inner: PropValue| {
        h(
            "div",
            Props::new()
                .with("onClick", record("outer"))
                .with("onClickCapture", record("capture")),
            [h("button", Props::new().with("onClick", inner), ["go".into()])],
        )
    };

    let mut tree = mounted(&build(record("first")));
    let button = tree.root().find("button").expect("button");
    assert_eq!(
        tree.root().document().listeners(button),
        vec![("click".to_string(), false)]
    );
    assert_eq!(tree.root().dispatch(button, "click"), 3);
    assert_eq!(*calls.borrow(), ["capture", "first", "outer"]);

    calls.borrow_mut().clear();
    tree.update(&build(record("second"))).expect("update");
    tree.root().dispatch(button, "click");
    assert_eq!(*calls.borrow(), ["capture", "second", "outer"]);
}

#[test]
fn unknown_event_names_keep_their_case() {
    let tree = mounted(&h(
        "div",
        Props::new().with("onCustomThing", PropValue::listener(|_| {})),
        [],
    ));
    let div = tree.root().find("div").expect("div");
    assert_eq!(
        tree.root().document().listeners(div),
        vec![("CustomThing".to_string(), false)]
    );
}

#[test]
fn dotted_props_set_properties_not_attributes() {
    let mut tree = mounted(&h("input", Props::new().with(".value", "typed"), []));
    let input = tree.root().find("input").expect("input");
    {
        let document = tree.root().document();
        assert_eq!(
            document.property(input, "value").as_ref().and_then(PropValue::as_str),
            Some("typed")
        );
        assert_eq!(document.attribute(input, ".value"), None);
        assert_eq!(document.attribute(input, "value"), None);
    }

    tree.update(&h("input", Props::new(), [])).expect("drop property");
    assert!(tree.root().document().property(input, "value").is_some());
}

#[test]
fn ref_callback_receives_the_node() {
    let seen = Rc::new(Cell::new(None::<NodeId>));
    let callback = {
        let seen = Rc::clone(&seen);
        PropValue::reference(move |node| seen.set(Some(node)))
    };
    let tree = mounted(&h(
        "div",
        Props::new().with("ref", callback).with("key", "k"),
        [],
    ));

    assert_eq!(seen.get(), tree.root().find("div"));
    assert_eq!(tree.html(), "<div></div>");
}

#[test]
fn svg_subtree_uses_the_svg_namespace() {
    let tree = mounted(&h(
        "div",
        Props::new(),
        [
            h("svg", Props::new(), [h("circle", Props::new().with("r", 4), [])]),
            h("span", Props::new(), []),
        ],
    ));
    let document = tree.root().document();
    let namespace = |tag: &str| {
        let node = document.find_by_tag(tree.root().container(), tag)[0];
        document.namespace(node)
    };

    assert_eq!(namespace("div"), Some(Namespace::Html));
    assert_eq!(namespace("svg"), Some(Namespace::Svg));
    assert_eq!(namespace("circle"), Some(Namespace::Svg));
    assert_eq!(namespace("span"), Some(Namespace::Html));
}

#[test]
fn children_are_added_replaced_and_cleared() {
    let mut tree = mounted(&h("div", Props::new(), []));
    assert_eq!(tree.html(), "<div></div>");

    tree.update(&h("div", Props::new(), ["a".into(), VNode::Number(2.0), VNode::Null]))
        .expect("add");
    assert_eq!(tree.html(), "<div>a2<!--hidden--></div>");

    tree.update(&h("div", Props::new(), ["b".into(), VNode::Bool(false), "c".into()]))
        .expect("same length");
    assert_eq!(tree.html(), "<div>b<!--hidden-->c</div>");

    tree.update(&h("div", Props::new(), [h("em", Props::new(), [])]))
        .expect("different length");
    assert_eq!(tree.html(), "<div><em></em></div>");

    tree.update(&h("div", Props::new(), [])).expect("clear");
    assert_eq!(tree.html(), "<div></div>");
}

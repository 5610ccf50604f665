use std::cell::Cell;
use std::rc::Rc;

use canopy_core::{
    diff, h, BoxError, Children, Component, ComponentType, Instance, Patch, PropValue, Props,
    UserContext, VNode,
};
use canopy_testing::{LifecycleLog, Probe, TestRoot, TestTree};

fn item(key: &str) -> VNode {
    h("li", Props::new().with("key", key), [VNode::text(key)])
}

fn list(keys: &[&str]) -> VNode {
    h("ul", Props::new(), keys.iter().map(|key| item(key)))
}

fn list_keys(tree: &TestTree) -> Vec<String> {
    let Some(Instance::Element(ul)) = tree.vdom().and_then(|vdom| vdom.instances().first()) else {
        panic!("expected a mounted <ul>");
    };
    ul.children()
        .map(|children| {
            children
                .instances()
                .iter()
                .filter_map(|instance| instance.key().map(|key| key.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn keyed_reorder_moves_existing_items() {
    let mut tree = TestTree::new();
    tree.mount(&list(&["a", "b", "c"])).expect("mount");
    let before = tree.root().find_all("li");
    let created = tree.root().document().created_count();

    let old_keys = list_keys(&tree);
    let new_keys = ["c", "b", "a"];
    let script = diff(&old_keys, &new_keys, |old, new| old == new);
    assert!(!script.is_empty());
    assert!(script.iter().all(|patch| matches!(patch, Patch::Move { .. })));

    tree.update(&list(&new_keys)).expect("update");

    assert_eq!(tree.html(), "<ul><li>c</li><li>b</li><li>a</li></ul>");
    let after = tree.root().find_all("li");
    assert_eq!(after, vec![before[2], before[1], before[0]]);
    assert_eq!(tree.root().document().created_count(), created);
    assert_eq!(list_keys(&tree), vec!["c", "b", "a"]);
}

#[test]
fn keyed_update_inserts_removes_and_keeps_identity() {
    let mut tree = TestTree::new();
    tree.mount(&list(&["a", "b", "c", "d"])).expect("mount");
    let before = tree.root().find_all("li");

    tree.update(&list(&["e", "d", "b", "f"])).expect("update");

    assert_eq!(
        tree.html(),
        "<ul><li>e</li><li>d</li><li>b</li><li>f</li></ul>"
    );
    let after = tree.root().find_all("li");
    assert_eq!(after[1], before[3]);
    assert_eq!(after[2], before[1]);
    assert!(!tree.root().document().is_connected(before[0]));
    assert!(!tree.root().document().is_connected(before[2]));
}

#[test]
fn keyed_items_keep_their_place_among_trailing_siblings() {
    let mut tree = TestTree::new();
    let build = |keys: &[&str]| {
        h(
            "div",
            Props::new(),
            [
                VNode::list(keys.iter().map(|key| item(key))),
                h("footer", Props::new(), ["end".into()]),
            ],
        )
    };
    tree.mount(&build(&["a", "b"])).expect("mount");
    // The footer shares the flattened child list and matches itself by kind.
    tree.update(&build(&["b", "a", "c"])).expect("update");

    assert_eq!(
        tree.html(),
        "<div><li>b</li><li>a</li><li>c</li><footer>end</footer></div>"
    );
}

struct Callback(Rc<dyn Fn()>);

struct Swapped {
    on_mount: Option<Rc<Callback>>,
}

impl Component for Swapped {
    fn create(props: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        Ok(Swapped {
            on_mount: props.downcast::<Callback>("on_mount"),
        })
    }

    fn render(&mut self, _: &Props, _: &Children, _: &UserContext) -> Result<VNode, BoxError> {
        Ok(h("h2", Props::new(), ["component".into()]))
    }

    fn did_mount(&mut self) -> Result<(), BoxError> {
        if let Some(callback) = &self.on_mount {
            (callback.0)();
        }
        Ok(())
    }
}

#[test]
fn type_swap_replaces_in_place_and_mounts_after_insertion() {
    let mut tree = TestTree::new();
    let framed = |middle: VNode| {
        h(
            "div",
            Props::new(),
            [
                h("span", Props::new(), ["before".into()]),
                middle,
                h("span", Props::new(), ["after".into()]),
            ],
        )
    };
    tree.mount(&framed(h("h1", Props::new(), ["title".into()])))
        .expect("mount");
    let heading = tree.root().find("h1").expect("h1 rendered");

    let inserted_before_mount = Rc::new(Cell::new(false));
    let callback = {
        let document = tree.root().document_handle();
        let container = tree.root().container();
        let inserted = Rc::clone(&inserted_before_mount);
        Callback(Rc::new(move || {
            let html = document.borrow().inner_html(container);
            // The old heading is still attached until the new instance has mounted.
            inserted.set(html.contains("<span>before</span><h2>component</h2><h1>title</h1>"));
        }))
    };
    let swapped = h(
        ComponentType::of::<Swapped>(),
        Props::new().with("on_mount", PropValue::any(callback)),
        [],
    );
    tree.update(&framed(swapped)).expect("update");

    assert!(inserted_before_mount.get());
    assert!(!tree.root().document().is_connected(heading));
    assert_eq!(
        tree.html(),
        "<div><span>before</span><h2>component</h2><span>after</span></div>"
    );
}

struct ThemeLabel;

impl Component for ThemeLabel {
    fn create(_: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        Ok(ThemeLabel)
    }

    fn render(&mut self, _: &Props, _: &Children, context: &UserContext) -> Result<VNode, BoxError> {
        let theme = context.str("theme").unwrap_or("none").to_string();
        Ok(h("span", Props::new(), [VNode::text(theme)]))
    }
}

fn label() -> VNode {
    h(ComponentType::of::<ThemeLabel>(), Props::new(), [])
}

fn themed(theme: &str, children: impl IntoIterator<Item = VNode>) -> VNode {
    h("Context", Props::new().with("theme", theme), children)
}

#[test]
fn sibling_contexts_are_isolated() {
    let mut root = TestRoot::new();
    let tree = h(
        "div",
        Props::new(),
        [
            themed("dark", [label()]),
            themed("light", [label(), themed("blue", [label()])]),
            label(),
        ],
    );
    root.set_content_with_context(tree, UserContext::new().with("theme", "root"))
        .expect("render");
    assert_eq!(
        root.html(),
        "<div><span>dark</span><span>light</span><span>blue</span><span>root</span></div>"
    );

    let reversed = h(
        "div",
        Props::new(),
        [
            label(),
            themed("light", [themed("blue", [label()]), label()]),
            themed("dark", [label()]),
        ],
    );
    root.set_content(reversed).expect("render reversed");
    assert_eq!(
        root.html(),
        "<div><span>none</span><span>blue</span><span>light</span><span>dark</span></div>"
    );
}

#[test]
fn context_values_are_fixed_at_creation() {
    let mut tree = TestTree::new();
    tree.mount(&themed("dark", [label()])).expect("mount");
    tree.update(&themed("light", [label()])).expect("update");
    assert_eq!(tree.html(), "<span>dark</span>");
}

fn portal(target: usize, children: impl IntoIterator<Item = VNode>) -> VNode {
    h(
        "div",
        Props::new(),
        [h(
            "Portal",
            Props::new().with("target", PropValue::Node(target)),
            children,
        )],
    )
}

#[test]
fn portal_target_change_moves_handles() {
    let mut tree = TestTree::new();
    let first = tree.root().create_container("aside");
    let second = tree.root().create_container("footer");
    let log = LifecycleLog::new();
    let content = |target| {
        portal(
            target,
            [
                h("b", Props::new(), ["x".into()]),
                Probe::node_with("inner", &log, Props::new().with("label", "in"), []),
            ],
        )
    };

    tree.mount(&content(first)).expect("mount");
    assert_eq!(tree.html(), "<div><!--hidden--></div>");
    assert_eq!(tree.root().document().inner_html(first), "<b>x</b>in");
    let bold = tree.root().document().find_by_tag(first, "b")[0];
    log.clear();

    tree.update(&content(second)).expect("update");

    let document = tree.root().document();
    assert_eq!(document.inner_html(first), "");
    assert_eq!(document.inner_html(second), "<b>x</b>in");
    assert_eq!(document.find_by_tag(second, "b"), vec![bold]);
    assert!(log.entries().is_empty(), "unexpected lifecycle: {:?}", log.entries());
}

#[test]
fn portal_defaults_to_body_and_cleans_up() {
    let mut root = TestRoot::new();
    root.set_content(h(
        "section",
        Props::new(),
        [h("Portal", Props::new(), [h("em", Props::new(), ["floating".into()])])],
    ))
    .expect("render");

    assert_eq!(root.html(), "<section><!--hidden--></section>");
    assert!(root.body_html().ends_with("<em>floating</em>"));

    root.unmount().expect("unmount");
    assert!(!root.body_html().contains("<em>"));
}

#[test]
fn rendering_again_unmounts_the_previous_tree() {
    let mut root = TestRoot::new();
    let log = LifecycleLog::new();
    root.set_content(Probe::node_with("first", &log, Props::new().with("label", "one"), []))
        .expect("first render");
    assert_eq!(root.html(), "one");

    root.set_content(h("p", Props::new(), ["two".into()]))
        .expect("second render");
    assert_eq!(root.html(), "<p>two</p>");
    assert!(log.contains("first:will_unmount"));
}

//! `proptest` strategies producing random description trees.

use canopy_core::{h, BoxError, Children, Component, ComponentType, PropValue, Props, UserContext, VNode};
use proptest::prelude::*;

const TAGS: &[&str] = &["div", "span", "p", "h1", "section"];
const KEYS: &[&str] = &["a", "b", "c", "d", "e", "f", "g"];
const STYLE_NAMES: &[&str] = &["color", "margin", "padding"];

/// Transparent component wrapping its children in `<div class="wrapper">`.
pub struct Wrapper;

impl Component for Wrapper {
    fn create(_: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        Ok(Wrapper)
    }

    fn render(&mut self, _: &Props, children: &Children, _: &UserContext) -> Result<VNode, BoxError> {
        Ok(h(
            "div",
            Props::new().with("class", "wrapper"),
            [children.to_node()],
        ))
    }
}

#[derive(Clone, Debug)]
pub enum PropSpec {
    Data(String, String),
    ClassName(String),
    StyleText(String),
    StyleMap(Vec<(&'static str, String)>),
    Disabled(bool),
    Property(String),
    Listener,
}

impl PropSpec {
    fn apply(&self, props: Props) -> Props {
        match self {
            PropSpec::Data(name, value) => props.with(format!("data-{name}"), value.as_str()),
            PropSpec::ClassName(value) => props.with("className", value.as_str()),
            PropSpec::StyleText(text) => props.with("style", text.as_str()),
            PropSpec::StyleMap(entries) => props.with(
                "style",
                PropValue::style(entries.iter().map(|(name, value)| (*name, value.as_str()))),
            ),
            PropSpec::Disabled(value) => props.with("disabled", *value),
            PropSpec::Property(value) => props.with(".value", value.as_str()),
            PropSpec::Listener => props.with("onClick", PropValue::listener(|_| {})),
        }
    }
}

/// Plain-data description of a tree, printable when a property fails.
#[derive(Clone, Debug)]
pub enum TreeSpec {
    Null,
    Text(String),
    Number(i32),
    Element {
        tag: &'static str,
        key: Option<&'static str>,
        props: Vec<PropSpec>,
        children: Option<Vec<TreeSpec>>,
    },
    Wrapper {
        key: Option<&'static str>,
        children: Vec<TreeSpec>,
    },
}

impl TreeSpec {
    pub fn to_vnode(&self) -> VNode {
        match self {
            TreeSpec::Null => VNode::Null,
            TreeSpec::Text(text) => VNode::text(text.as_str()),
            TreeSpec::Number(value) => VNode::Number(f64::from(*value)),
            TreeSpec::Element {
                tag,
                key,
                props,
                children,
            } => {
                let mut built = props.iter().fold(Props::new(), |acc, prop| prop.apply(acc));
                if let Some(key) = key {
                    built = built.with("key", *key);
                }
                match children {
                    Some(children) => h(*tag, built, children.iter().map(TreeSpec::to_vnode)),
                    None => h(*tag, built, []),
                }
            }
            TreeSpec::Wrapper { key, children } => {
                let props = match key {
                    Some(key) => Props::new().with("key", *key),
                    None => Props::new(),
                };
                h(
                    ComponentType::of::<Wrapper>(),
                    props,
                    children.iter().map(TreeSpec::to_vnode),
                )
            }
        }
    }

    fn keyed(self, key: &'static str) -> TreeSpec {
        match self {
            TreeSpec::Element {
                tag,
                props,
                children,
                ..
            } => TreeSpec::Element {
                tag,
                key: Some(key),
                props,
                children,
            },
            TreeSpec::Wrapper { children, .. } => TreeSpec::Wrapper {
                key: Some(key),
                children,
            },
            leaf => TreeSpec::Element {
                tag: "li",
                key: Some(key),
                props: Vec::new(),
                children: Some(vec![leaf]),
            },
        }
    }
}

fn prop_spec() -> impl Strategy<Value = PropSpec> {
    let style_name = prop::sample::select(STYLE_NAMES);
    prop_oneof![
        ("[a-c]", "[a-z]{0,3}").prop_map(|(name, value)| PropSpec::Data(name, value)),
        "[a-z]{0,4}".prop_map(PropSpec::ClassName),
        (style_name.clone(), "[a-z]{1,3}")
            .prop_map(|(name, value)| PropSpec::StyleText(format!("{name}: {value}"))),
        prop::collection::vec((style_name, "[a-z]{1,3}"), 0..3).prop_map(PropSpec::StyleMap),
        any::<bool>().prop_map(PropSpec::Disabled),
        "[a-z]{0,3}".prop_map(PropSpec::Property),
        Just(PropSpec::Listener),
    ]
}

fn children(inner: BoxedStrategy<TreeSpec>) -> impl Strategy<Value = Option<Vec<TreeSpec>>> {
    let keyed = (
        prop::sample::subsequence(KEYS, 1..=5).prop_shuffle(),
        prop::collection::vec(inner.clone(), 5),
    )
        .prop_map(|(keys, items)| {
            keys.into_iter()
                .zip(items)
                .map(|(key, item)| item.keyed(key))
                .collect()
        });
    prop_oneof![
        1 => Just(None),
        3 => prop::collection::vec(inner, 0..5).prop_map(Some),
        2 => keyed.prop_map(Some),
    ]
}

/// Random description trees: text, number and null leaves under primitive
/// elements and [`Wrapper`] components, with keyed or unkeyed children.
pub fn tree() -> impl Strategy<Value = TreeSpec> {
    let leaf = prop_oneof![
        Just(TreeSpec::Null),
        "[a-z]{0,5}".prop_map(TreeSpec::Text),
        (-3i32..40).prop_map(TreeSpec::Number),
    ];
    leaf.prop_recursive(4, 40, 5, |inner| {
        prop_oneof![
            3 => (
                prop::sample::select(TAGS),
                prop::collection::vec(prop_spec(), 0..3),
                children(inner.clone()),
            )
                .prop_map(|(tag, props, children)| TreeSpec::Element {
                    tag,
                    key: None,
                    props,
                    children,
                }),
            1 => children(inner).prop_map(|children| TreeSpec::Wrapper {
                key: None,
                children: children.unwrap_or_default(),
            }),
        ]
    })
}

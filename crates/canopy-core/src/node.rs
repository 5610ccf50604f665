use std::fmt;
use std::rc::Rc;

use crate::component::ComponentType;
use crate::props::{format_number, Props};

/// Declarative description of what should exist at one position of the tree.
#[derive(Clone, Default)]
pub enum VNode {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    Element(Rc<VElement>),
    List(Rc<[VNode]>),
}

pub struct VElement {
    pub kind: Kind,
    pub props: Props,
    pub children: Children,
}

#[derive(Clone)]
pub enum Kind {
    Tag(Rc<str>),
    Component(ComponentType),
    Context,
    Portal,
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Kind::Tag(a), Kind::Tag(b)) => a == b,
            (Kind::Component(a), Kind::Component(b)) => a == b,
            (Kind::Context, Kind::Context) | (Kind::Portal, Kind::Portal) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Tag(tag) => write!(f, "{tag}"),
            Kind::Component(component) => write!(f, "{}", component.name()),
            Kind::Context => f.write_str("Context"),
            Kind::Portal => f.write_str("Portal"),
        }
    }
}

impl From<&str> for Kind {
    fn from(tag: &str) -> Self {
        match tag {
            "Context" => Kind::Context,
            "Portal" => Kind::Portal,
            tag => Kind::Tag(tag.into()),
        }
    }
}

impl From<ComponentType> for Kind {
    fn from(component: ComponentType) -> Self {
        Kind::Component(component)
    }
}

/// Children passed to an element; `None` is distinct from an empty list.
#[derive(Clone, Default)]
pub struct Children(Option<Rc<[VNode]>>);

impl Children {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn new(nodes: impl IntoIterator<Item = VNode>) -> Self {
        Self(Some(nodes.into_iter().collect()))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_slice(&self) -> &[VNode] {
        self.0.as_deref().unwrap_or(&[])
    }

    pub fn to_node(&self) -> VNode {
        match &self.0 {
            Some(nodes) => VNode::List(Rc::clone(nodes)),
            None => VNode::Null,
        }
    }

    pub fn ptr_eq(a: &Children, b: &Children) -> bool {
        match (&a.0, &b.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(nodes) => f.debug_list().entries(nodes.iter()).finish(),
            None => f.write_str("None"),
        }
    }
}

impl VNode {
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        VNode::Text(text.into())
    }

    pub fn list(nodes: impl IntoIterator<Item = VNode>) -> Self {
        VNode::List(nodes.into_iter().collect())
    }

    pub fn as_element(&self) -> Option<&Rc<VElement>> {
        match self {
            VNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<Rc<str>> {
        self.as_element().and_then(|element| element.props.key())
    }

    /// Whether this position renders only a placeholder.
    pub fn is_hidden(&self) -> bool {
        match self {
            VNode::Null | VNode::Bool(false) => true,
            VNode::List(nodes) => nodes.iter().all(VNode::is_hidden_list_member),
            _ => false,
        }
    }

    fn is_hidden_list_member(&self) -> bool {
        matches!(self, VNode::List(nodes) if nodes.iter().all(VNode::is_hidden_list_member))
    }

    /// Text content for text-like leaves.
    pub fn as_text(&self) -> Option<String> {
        match self {
            VNode::Text(text) => Some(text.to_string()),
            VNode::Number(value) => Some(format_number(*value)),
            VNode::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }
}

/// Appends `nodes` to `out` with nested lists expanded in place.
pub fn flatten_into(nodes: &[VNode], out: &mut Vec<VNode>) {
    for node in nodes {
        match node {
            VNode::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Null => f.write_str("Null"),
            VNode::Bool(value) => write!(f, "{value}"),
            VNode::Number(value) => write!(f, "{}", format_number(*value)),
            VNode::Text(text) => write!(f, "{text:?}"),
            VNode::Element(element) => element.fmt(f),
            VNode::List(nodes) => f.debug_list().entries(nodes.iter()).finish(),
        }
    }
}

impl fmt::Debug for VElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VElement")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}

impl From<&str> for VNode {
    fn from(text: &str) -> Self {
        VNode::Text(text.into())
    }
}

impl From<String> for VNode {
    fn from(text: String) -> Self {
        VNode::Text(text.into())
    }
}

impl From<f64> for VNode {
    fn from(value: f64) -> Self {
        VNode::Number(value)
    }
}

impl From<i32> for VNode {
    fn from(value: i32) -> Self {
        VNode::Number(value.into())
    }
}

impl From<bool> for VNode {
    fn from(value: bool) -> Self {
        VNode::Bool(value)
    }
}

impl From<Vec<VNode>> for VNode {
    fn from(nodes: Vec<VNode>) -> Self {
        VNode::List(nodes.into())
    }
}

impl<T: Into<VNode>> From<Option<T>> for VNode {
    fn from(node: Option<T>) -> Self {
        node.map_or(VNode::Null, Into::into)
    }
}

/// Builds an element description; nested child lists are flattened one level.
pub fn h(kind: impl Into<Kind>, props: Props, children: impl IntoIterator<Item = VNode>) -> VNode {
    let mut flat = Vec::new();
    for child in children {
        match child {
            VNode::List(nodes) => flat.extend(nodes.iter().cloned()),
            other => flat.push(other),
        }
    }
    let children = if flat.is_empty() {
        Children::none()
    } else {
        Children::new(flat)
    };
    VNode::Element(Rc::new(VElement {
        kind: kind.into(),
        props,
        children,
    }))
}

/// Copy of `element` with `overrides` merged over its props and, when given,
/// `children` in place of the original ones.
pub fn clone_element(element: &VElement, overrides: &Props, children: Option<Children>) -> VNode {
    VNode::Element(Rc::new(VElement {
        kind: element.kind.clone(),
        props: element.props.merged(overrides),
        children: children.unwrap_or_else(|| element.children.clone()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_flattens_one_level_and_drops_empty_children() {
        let nested = VNode::list([VNode::from("b"), VNode::list([VNode::from("c")])]);
        let node = h("div", Props::new(), [VNode::from("a"), nested]);
        let element = node.as_element().expect("element");

        assert_eq!(element.children.as_slice().len(), 3);
        assert!(matches!(element.children.as_slice()[2], VNode::List(_)));
        assert!(h("br", Props::new(), []).as_element().unwrap().children.is_none());
    }

    #[test]
    fn reserved_kinds_parse_from_strings() {
        assert_eq!(Kind::from("Portal"), Kind::Portal);
        assert_eq!(Kind::from("Context"), Kind::Context);
        assert_eq!(Kind::from("portal"), Kind::Tag("portal".into()));
    }

    #[test]
    fn clone_merges_props_and_keeps_original() {
        let original = h("a", Props::new().with("href", "/").with("id", "x"), ["home".into()]);
        let element = original.as_element().unwrap();

        let cloned = clone_element(element, &Props::new().with("id", "y"), None);
        let cloned = cloned.as_element().unwrap();

        assert_eq!(cloned.props.str("href"), Some("/"));
        assert_eq!(cloned.props.str("id"), Some("y"));
        assert!(Children::ptr_eq(&cloned.children, &element.children));
        assert_eq!(element.props.str("id"), Some("x"));

        let replaced = clone_element(element, &Props::new(), Some(Children::new(["away".into()])));
        assert!(!Children::ptr_eq(&replaced.as_element().unwrap().children, &element.children));
    }

    #[test]
    fn hidden_and_text_shapes() {
        assert!(VNode::Null.is_hidden());
        assert!(VNode::Bool(false).is_hidden());
        assert!(VNode::list([]).is_hidden());
        assert!(VNode::list([VNode::list([])]).is_hidden());
        assert!(!VNode::list([VNode::Null]).is_hidden());
        assert_eq!(VNode::Bool(true).as_text().as_deref(), Some("true"));
        assert_eq!(VNode::from(4).as_text().as_deref(), Some("4"));
    }

    #[test]
    fn flatten_expands_all_levels() {
        let mut out = Vec::new();
        flatten_into(
            &[
                VNode::from("a"),
                VNode::list([VNode::list([VNode::from("b")]), VNode::Null]),
            ],
            &mut out,
        );
        assert_eq!(out.len(), 3);
        assert!(matches!(out[2], VNode::Null));
    }
}

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::collections::map::IndexMap;
use crate::platform::NodeId;

pub type StyleMap = IndexMap<String, String>;

/// Event delivered to listeners registered through `on*` props.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

#[derive(Clone)]
pub struct EventListener(Rc<dyn Fn(&Event)>);

impl EventListener {
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventListener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Callback receiving the platform handle of a mounted element.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(NodeId)>);

impl RefCallback {
    pub fn new(f: impl Fn(NodeId) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, node: NodeId) {
        (self.0)(node)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RefCallback({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// A single prop value.
///
/// Scalars compare by value; styles, callbacks and opaque values compare by identity.
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Style(Rc<StyleMap>),
    Listener(EventListener),
    Ref(RefCallback),
    Node(NodeId),
    Any(Rc<dyn Any>),
}

impl PropValue {
    pub fn style<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = StyleMap::default();
        for (name, value) in entries {
            map.insert(name.into(), value.into());
        }
        PropValue::Style(Rc::new(map))
    }

    pub fn any<T: 'static>(value: T) -> Self {
        PropValue::Any(Rc::new(value))
    }

    pub fn listener(f: impl Fn(&Event) + 'static) -> Self {
        PropValue::Listener(EventListener::new(f))
    }

    pub fn reference(f: impl Fn(NodeId) + 'static) -> Self {
        PropValue::Ref(RefCallback::new(f))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(value) => *value,
            PropValue::Number(value) => *value != 0.0 && !value.is_nan(),
            PropValue::Str(value) => !value.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        match self {
            PropValue::Any(value) => Rc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Attribute text for this value, or `None` when the attribute should be absent.
    pub fn to_attribute(&self) -> Option<String> {
        if !self.is_truthy() {
            return None;
        }
        Some(match self {
            PropValue::Bool(_) => String::new(),
            PropValue::Number(value) => format_number(*value),
            PropValue::Str(value) => value.to_string(),
            PropValue::Style(map) => style_text(map),
            PropValue::Node(node) => node.to_string(),
            PropValue::Listener(_) | PropValue::Ref(_) => "[function]".to_string(),
            PropValue::Any(_) | PropValue::Null => "[object]".to_string(),
        })
    }

    /// Text used as a list identity key.
    pub fn to_key(&self) -> Option<Rc<str>> {
        match self {
            PropValue::Null => None,
            PropValue::Str(value) => Some(Rc::clone(value)),
            PropValue::Number(value) => Some(format_number(*value).into()),
            PropValue::Bool(value) => Some(value.to_string().into()),
            other => other.to_attribute().map(Rc::from),
        }
    }
}

/// Formats a number the way the platform stringifies it: `2`, `1.5`, `NaN`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else {
        format!("{value}")
    }
}

pub(crate) fn style_text(map: &StyleMap) -> String {
    map.iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Null, PropValue::Null) => true,
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Style(a), PropValue::Style(b)) => Rc::ptr_eq(a, b),
            (PropValue::Listener(a), PropValue::Listener(b)) => a.ptr_eq(b),
            (PropValue::Ref(a), PropValue::Ref(b)) => a.ptr_eq(b),
            (PropValue::Node(a), PropValue::Node(b)) => a == b,
            (PropValue::Any(a), PropValue::Any(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => f.write_str("Null"),
            PropValue::Bool(value) => write!(f, "{value}"),
            PropValue::Number(value) => write!(f, "{}", format_number(*value)),
            PropValue::Str(value) => write!(f, "{value:?}"),
            PropValue::Style(map) => f.debug_map().entries(map.iter()).finish(),
            PropValue::Listener(listener) => listener.fmt(f),
            PropValue::Ref(callback) => callback.fmt(f),
            PropValue::Node(node) => write!(f, "Node({node})"),
            PropValue::Any(_) => f.write_str("Any"),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value.into())
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        PropValue::Number(value.into())
    }
}

impl From<usize> for PropValue {
    fn from(value: usize) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<EventListener> for PropValue {
    fn from(value: EventListener) -> Self {
        PropValue::Listener(value)
    }
}

impl From<RefCallback> for PropValue {
    fn from(value: RefCallback) -> Self {
        PropValue::Ref(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(PropValue::Null, Into::into)
    }
}

/// Ordered prop mapping shared cheaply between descriptions and instances.
#[derive(Clone, Default)]
pub struct Props {
    entries: Rc<IndexMap<String, PropValue>>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.entries).insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn key(&self) -> Option<Rc<str>> {
        self.get("key").and_then(PropValue::to_key)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn downcast<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(PropValue::downcast)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` overlaid with `overrides`; neither input is modified.
    pub fn merged(&self, overrides: &Props) -> Props {
        if overrides.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return overrides.clone();
        }
        let mut entries = (*self.entries).clone();
        for (name, value) in overrides.entries.iter() {
            entries.insert(name.clone(), value.clone());
        }
        Props {
            entries: Rc::new(entries),
        }
    }

    pub fn shallow_eq(&self, other: &Props) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
            || (self.len() == other.len()
                && self
                    .entries
                    .iter()
                    .all(|(name, value)| other.get(name) == Some(value)))
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.shallow_eq(other)
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Props::new(), |props, (name, value)| props.with(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_stringify_like_the_platform() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn falsy_values_have_no_attribute() {
        for value in [
            PropValue::Null,
            PropValue::Bool(false),
            PropValue::Number(0.0),
            PropValue::Number(f64::NAN),
            PropValue::from(""),
        ] {
            assert_eq!(value.to_attribute(), None, "{value:?}");
        }
        assert_eq!(PropValue::Bool(true).to_attribute().as_deref(), Some(""));
        assert_eq!(PropValue::from(3).to_attribute().as_deref(), Some("3"));
        assert_eq!(PropValue::from("x").to_attribute().as_deref(), Some("x"));
    }

    #[test]
    fn callbacks_compare_by_identity() {
        let listener = EventListener::new(|_| {});
        let same = PropValue::Listener(listener.clone());
        assert_eq!(PropValue::Listener(listener), same);
        assert_ne!(PropValue::listener(|_| {}), PropValue::listener(|_| {}));
    }

    #[test]
    fn shallow_eq_compares_entries_not_allocation() {
        let handler = PropValue::listener(|_| {});
        let a = Props::new().with("id", "a").with("onClick", handler.clone());
        let b = Props::new().with("id", "a").with("onClick", handler);
        let c = Props::new().with("id", "b");

        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
        assert!(!a.shallow_eq(&Props::new().with("id", "a")));
    }

    #[test]
    fn merged_overrides_without_touching_inputs() {
        let base = Props::new().with("a", 1).with("b", 2);
        let overrides = Props::new().with("b", 3).with("c", 4);

        let merged = base.merged(&overrides);

        assert_eq!(merged.get("a"), Some(&PropValue::from(1)));
        assert_eq!(merged.get("b"), Some(&PropValue::from(3)));
        assert_eq!(merged.get("c"), Some(&PropValue::from(4)));
        assert_eq!(base.get("b"), Some(&PropValue::from(2)));
        assert!(!base.contains("c"));
    }

    #[test]
    fn keys_normalize_to_text() {
        assert_eq!(Props::new().with("key", 7).key().as_deref(), Some("7"));
        assert_eq!(Props::new().with("key", "a").key().as_deref(), Some("a"));
        assert_eq!(Props::new().with("key", PropValue::Null).key(), None);
        assert_eq!(Props::new().key(), None);
    }

    #[test]
    fn opaque_values_downcast() {
        let props = Props::new().with("count", PropValue::any(5_u8));
        assert_eq!(props.downcast::<u8>("count").as_deref(), Some(&5));
        assert!(props.downcast::<String>("count").is_none());
    }
}

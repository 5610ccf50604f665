use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

use crate::collections::map::IndexMap;
use crate::error::{BoxError, ViewError};
use crate::node::{Children, VNode};
use crate::props::{PropValue, Props};

/// User-defined component.
///
/// An instance is constructed once per mount and dropped on unmount. Hooks
/// run in this order: `will_mount`, `render`, `did_mount`, `did_render` when
/// mounting; `render`, `did_update`, `did_render` on every reactive re-render;
/// `will_unmount` before teardown. Reactive cells read inside `render` are
/// tracked, and a change to any of them re-renders the component.
pub trait Component: 'static {
    fn create(props: &Props, children: &Children, context: &UserContext) -> Result<Self, BoxError>
    where
        Self: Sized;

    fn default_props() -> Props
    where
        Self: Sized,
    {
        Props::new()
    }

    fn render(
        &mut self,
        props: &Props,
        children: &Children,
        context: &UserContext,
    ) -> Result<VNode, BoxError>;

    fn will_mount(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn did_mount(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn did_update(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn did_render(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn will_unmount(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    /// Components returning `true` receive errors raised by themselves and
    /// their descendants through [`did_catch`](Component::did_catch).
    fn catches_errors(&self) -> bool {
        false
    }

    /// Handles a caught error; returning it passes it on to the next boundary.
    fn did_catch(&mut self, error: ViewError) -> Result<(), ViewError> {
        Err(error)
    }
}

type Construct = fn(&Props, &Children, &UserContext) -> Result<Box<dyn Component>, BoxError>;

fn construct<C: Component>(
    props: &Props,
    children: &Children,
    context: &UserContext,
) -> Result<Box<dyn Component>, BoxError> {
    Ok(Box::new(C::create(props, children, context)?))
}

/// Component "constructor" used as an element kind; identity is the Rust type.
#[derive(Clone, Copy)]
pub struct ComponentType {
    type_id: TypeId,
    name: &'static str,
    construct: Construct,
    default_props: fn() -> Props,
}

impl ComponentType {
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: short_name(std::any::type_name::<C>()),
            construct: construct::<C>,
            default_props: C::default_props,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(
        &self,
        props: &Props,
        children: &Children,
        context: &UserContext,
    ) -> Result<Box<dyn Component>, BoxError> {
        (self.construct)(props, children, context)
    }

    pub(crate) fn default_props(&self) -> Props {
        (self.default_props)()
    }
}

fn short_name(path: &'static str) -> &'static str {
    path.rsplit("::").next().unwrap_or(path)
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentType {}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}

/// Immutable key/value mapping visible to every component of a subtree.
#[derive(Clone, Default)]
pub struct UserContext(Rc<IndexMap<String, PropValue>>);

impl UserContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        Rc::make_mut(&mut self.0).insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    pub fn downcast<T: 'static>(&self, name: &str) -> Option<Rc<T>> {
        self.get(name).and_then(PropValue::downcast)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New context with every prop except `key` layered over this one.
    pub fn merged(&self, props: &Props) -> UserContext {
        let mut entries = (*self.0).clone();
        for (name, value) in props.iter().filter(|(name, _)| *name != "key") {
            entries.insert(name.to_string(), value.clone());
        }
        UserContext(Rc::new(entries))
    }
}

impl fmt::Debug for UserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Label;

    impl Component for Label {
        fn create(_: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
            Ok(Label)
        }

        fn default_props() -> Props {
            Props::new().with("text", "label")
        }

        fn render(&mut self, props: &Props, _: &Children, _: &UserContext) -> Result<VNode, BoxError> {
            Ok(props.str("text").unwrap_or_default().into())
        }
    }

    struct Other;

    impl Component for Other {
        fn create(_: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
            Ok(Other)
        }

        fn render(&mut self, _: &Props, _: &Children, _: &UserContext) -> Result<VNode, BoxError> {
            Ok(VNode::Null)
        }
    }

    #[test]
    fn component_type_identity_is_the_rust_type() {
        assert_eq!(ComponentType::of::<Label>(), ComponentType::of::<Label>());
        assert_ne!(ComponentType::of::<Label>(), ComponentType::of::<Other>());
        assert_eq!(ComponentType::of::<Label>().name(), "Label");
        assert_eq!(
            ComponentType::of::<Label>().default_props().str("text"),
            Some("label")
        );
    }

    #[test]
    fn merged_context_leaves_parent_untouched() {
        let root = UserContext::new().with("theme", "light").with("lang", "en");
        let nested = root.merged(&Props::new().with("theme", "dark").with("key", "k"));

        assert_eq!(nested.str("theme"), Some("dark"));
        assert_eq!(nested.str("lang"), Some("en"));
        assert!(nested.get("key").is_none());
        assert_eq!(root.str("theme"), Some("light"));
    }
}

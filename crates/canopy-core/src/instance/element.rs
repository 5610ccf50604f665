use std::rc::Rc;

use crate::context::RenderContext;
use crate::error::{DomError, ViewError};
use crate::instance::Vdom;
use crate::node::{Children, VElement};
use crate::platform::{Host, Namespace, NodeId};
use crate::props::{PropValue, Props};
use crate::reconcile;

/// Platform element created from a tag name.
pub struct ElementInstance {
    ctx: RenderContext,
    tag: Rc<str>,
    element: Rc<VElement>,
    node: Option<NodeId>,
    children: Option<Vdom>,
}

impl ElementInstance {
    pub(crate) fn new(element: &Rc<VElement>, tag: &Rc<str>, ctx: &RenderContext) -> Self {
        let ctx = if &**tag == "svg" {
            ctx.with_namespace(Namespace::Svg)
        } else {
            ctx.clone()
        };
        Self {
            ctx,
            tag: Rc::clone(tag),
            element: Rc::clone(element),
            node: None,
            children: None,
        }
    }

    pub(crate) fn host(&self) -> &Host {
        self.ctx.host()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn children(&self) -> Option<&Vdom> {
        self.children.as_ref()
    }

    pub(crate) fn key(&self) -> Option<Rc<str>> {
        self.element.props.key()
    }

    pub(crate) fn mount(&mut self) -> Result<(), ViewError> {
        let host = self.ctx.host().clone();
        let node = host.create_element(&self.tag, self.ctx.namespace());
        self.node = Some(node);
        apply_props(&host, node, None, &self.element.props)?;
        reconcile_children(&mut self.children, &self.element.children, node, &self.ctx, false)?;
        if let Some(PropValue::Ref(callback)) = self.element.props.get("ref") {
            callback.call(node);
        }
        Ok(())
    }

    pub(crate) fn update(&mut self, element: &Rc<VElement>) -> Result<(), ViewError> {
        if Rc::ptr_eq(&self.element, element) {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.element, Rc::clone(element));
        let Some(node) = self.node else {
            return Ok(());
        };
        let host = self.ctx.host().clone();
        apply_props(&host, node, Some(&previous.props), &element.props)?;
        reconcile_children(&mut self.children, &element.children, node, &self.ctx, true)?;
        match (previous.props.get("ref"), element.props.get("ref")) {
            (Some(PropValue::Ref(old)), Some(PropValue::Ref(new))) if old.ptr_eq(new) => {}
            (_, Some(PropValue::Ref(new))) => new.call(node),
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<(), ViewError> {
        match self.children.as_mut() {
            Some(children) => children.flush(),
            None => Ok(()),
        }
    }

    pub(crate) fn unmount(&mut self) -> Result<(), ViewError> {
        let children = match self.children.take() {
            Some(mut children) => children.unmount(),
            None => Ok(()),
        };
        let detached = match self.node {
            Some(node) => self.ctx.host().remove(node).map_err(ViewError::from),
            None => Ok(()),
        };
        children.and(detached)
    }
}

/// Brings the child instances of `parent` in line with `children`.
///
/// Children created here are flushed right away when `flush_new` is set;
/// otherwise the caller's flush pass reaches them.
pub(crate) fn reconcile_children(
    slot: &mut Option<Vdom>,
    children: &Children,
    parent: NodeId,
    ctx: &RenderContext,
    flush_new: bool,
) -> Result<(), ViewError> {
    if children.is_none() {
        return match slot.take() {
            Some(mut vdom) => vdom.unmount(),
            None => Ok(()),
        };
    }
    let tree = children.to_node();
    if let Some(vdom) = slot.as_mut() {
        return reconcile::update(&tree, vdom, ctx);
    }
    let mut vdom = reconcile::create(&tree, ctx)?;
    vdom.mount()?;
    vdom.insert_before(parent, None)?;
    let vdom = slot.insert(vdom);
    if flush_new {
        vdom.flush()?;
    }
    Ok(())
}

fn is_reserved(name: &str) -> bool {
    matches!(name, "key" | "ref")
}

fn apply_props(
    host: &Host,
    node: NodeId,
    previous: Option<&Props>,
    next: &Props,
) -> Result<(), DomError> {
    for (name, value) in next.iter() {
        if is_reserved(name) {
            continue;
        }
        let old = previous.and_then(|props| props.get(name));
        if old == Some(value) {
            continue;
        }
        set_prop(host, node, name, old, Some(value))?;
    }
    if let Some(previous) = previous {
        for (name, value) in previous.iter() {
            if is_reserved(name) || next.contains(name) {
                continue;
            }
            set_prop(host, node, name, Some(value), None)?;
        }
    }
    Ok(())
}

fn set_prop(
    host: &Host,
    node: NodeId,
    name: &str,
    old: Option<&PropValue>,
    new: Option<&PropValue>,
) -> Result<(), DomError> {
    if let Some(property) = name.strip_prefix('.') {
        // Dropping a property prop leaves the platform value as it is.
        return match new {
            Some(value) => host.with(|doc| doc.set_property(node, property, value.clone())),
            None => Ok(()),
        };
    }

    if let Some(event) = name.strip_prefix("on").filter(|event| !event.is_empty()) {
        let (event, capture) = match event.strip_suffix("Capture") {
            Some(event) => (event, true),
            None => (event, false),
        };
        let lower = event.to_lowercase();
        let event = if host.supports_event(&lower) {
            lower
        } else {
            event.to_string()
        };
        return host.with(|doc| {
            if let Some(PropValue::Listener(old)) = old {
                doc.remove_event_listener(node, &event, old, capture)?;
            }
            if let Some(PropValue::Listener(new)) = new {
                doc.add_event_listener(node, &event, new.clone(), capture)?;
            }
            Ok(())
        });
    }

    if name == "style" {
        return set_style(host, node, old, new);
    }

    let attribute = if name == "className" { "class" } else { name };
    match new.and_then(PropValue::to_attribute) {
        Some(text) => host.with(|doc| doc.set_attribute(node, attribute, &text)),
        None => host.with(|doc| doc.remove_attribute(node, attribute)),
    }
}

fn set_style(
    host: &Host,
    node: NodeId,
    old: Option<&PropValue>,
    new: Option<&PropValue>,
) -> Result<(), DomError> {
    host.with(|doc| match new {
        Some(PropValue::Str(text)) => doc.set_style_text(node, text),
        Some(PropValue::Style(map)) => {
            let previous = match old {
                Some(PropValue::Style(previous)) => Some(previous),
                _ => {
                    doc.set_style_text(node, "")?;
                    None
                }
            };
            if let Some(previous) = previous {
                for name in previous.keys().filter(|name| !map.contains_key(*name)) {
                    doc.remove_style_property(node, name)?;
                }
            }
            for (name, value) in map.iter() {
                if previous.and_then(|previous| previous.get(name)) != Some(value) {
                    doc.set_style_property(node, name, value)?;
                }
            }
            Ok(())
        }
        _ => doc.set_style_text(node, ""),
    })
}

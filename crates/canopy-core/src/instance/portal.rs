use std::rc::Rc;

use crate::context::RenderContext;
use crate::error::ViewError;
use crate::instance::{reconcile_children, Vdom};
use crate::node::VElement;
use crate::platform::{Host, NodeId};
use crate::props::PropValue;

/// Renders its children into `target` (the document body by default) while
/// holding a placeholder at its own position.
pub struct PortalInstance {
    ctx: RenderContext,
    element: Rc<VElement>,
    placeholder: Option<NodeId>,
    target: NodeId,
    children: Option<Vdom>,
}

fn target_of(element: &VElement, host: &Host) -> NodeId {
    match element.props.get("target") {
        Some(PropValue::Node(node)) => *node,
        _ => host.body(),
    }
}

impl PortalInstance {
    pub(crate) fn new(element: &Rc<VElement>, ctx: &RenderContext) -> Self {
        Self {
            target: target_of(element, ctx.host()),
            ctx: ctx.clone(),
            element: Rc::clone(element),
            placeholder: None,
            children: None,
        }
    }

    pub(crate) fn host(&self) -> &Host {
        self.ctx.host()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.placeholder
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub(crate) fn key(&self) -> Option<Rc<str>> {
        self.element.props.key()
    }

    pub(crate) fn mount(&mut self) -> Result<(), ViewError> {
        self.placeholder = Some(self.ctx.host().create_comment("hidden"));
        let element = Rc::clone(&self.element);
        reconcile_children(&mut self.children, &element.children, self.target, &self.ctx, false)
    }

    pub(crate) fn update(&mut self, element: &Rc<VElement>) -> Result<(), ViewError> {
        if Rc::ptr_eq(&self.element, element) {
            return Ok(());
        }
        self.element = Rc::clone(element);

        let target = target_of(element, self.ctx.host());
        if target != self.target {
            if let Some(children) = &self.children {
                let nodes = children.dom_nodes();
                log::debug!("moving {} portal node(s) from {} to {}", nodes.len(), self.target, target);
                children.insert_before(target, None)?;
            }
            self.target = target;
        }

        reconcile_children(&mut self.children, &element.children, self.target, &self.ctx, true)
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
        let detached = match self.placeholder {
            Some(node) => self.ctx.host().remove(node).map_err(ViewError::from),
            None => Ok(()),
        };
        children.and(detached)
    }
}

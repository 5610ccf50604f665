mod element;
mod portal;
mod text;
mod user;

use std::rc::Rc;

use crate::error::ViewError;
use crate::node::{Kind, VElement};
use crate::platform::NodeId;

pub(crate) use element::reconcile_children;
pub use element::ElementInstance;
pub use portal::PortalInstance;
pub use text::{HiddenInstance, TextInstance};
pub use user::UserComponent;

/// Live counterpart of one description.
pub enum Instance {
    Element(ElementInstance),
    Component(Rc<UserComponent>),
    Text(TextInstance),
    Hidden(HiddenInstance),
    Context(Rc<UserComponent>),
    Portal(PortalInstance),
}

impl Instance {
    pub fn mount(&mut self) -> Result<(), ViewError> {
        match self {
            Instance::Element(element) => element.mount(),
            Instance::Component(component) | Instance::Context(component) => component.mount(),
            Instance::Text(text) => text.mount(),
            Instance::Hidden(hidden) => hidden.mount(),
            Instance::Portal(portal) => portal.mount(),
        }
    }

    /// In-place update; the caller guarantees `element` has this instance's kind.
    pub fn update(&mut self, element: &Rc<VElement>) -> Result<(), ViewError> {
        match self {
            Instance::Element(instance) => instance.update(element),
            Instance::Component(component) | Instance::Context(component) => {
                component.update(element)
            }
            Instance::Portal(portal) => portal.update(element),
            Instance::Text(_) | Instance::Hidden(_) => Ok(()),
        }
    }

    pub fn flush(&mut self) -> Result<(), ViewError> {
        match self {
            Instance::Element(element) => element.flush(),
            Instance::Component(component) | Instance::Context(component) => component.flush(),
            Instance::Portal(portal) => portal.flush(),
            Instance::Text(_) | Instance::Hidden(_) => Ok(()),
        }
    }

    pub fn unmount(&mut self) -> Result<(), ViewError> {
        match self {
            Instance::Element(element) => element.unmount(),
            Instance::Component(component) | Instance::Context(component) => component.unmount(),
            Instance::Text(text) => text.unmount(),
            Instance::Hidden(hidden) => hidden.unmount(),
            Instance::Portal(portal) => portal.unmount(),
        }
    }

    pub fn insert_before(&self, parent: NodeId, reference: Option<NodeId>) -> Result<(), ViewError> {
        let host = match self {
            Instance::Element(element) => element.host(),
            Instance::Text(text) => text.host(),
            Instance::Hidden(hidden) => hidden.host(),
            Instance::Portal(portal) => portal.host(),
            Instance::Component(component) | Instance::Context(component) => {
                return component.insert_before(parent, reference);
            }
        };
        for node in self.dom_nodes() {
            host.insert_before(parent, node, reference)?;
        }
        Ok(())
    }

    /// Platform handles this instance occupies in its parent, in order.
    pub fn dom_nodes(&self) -> Vec<NodeId> {
        match self {
            Instance::Element(element) => element.node().into_iter().collect(),
            Instance::Text(text) => text.node().into_iter().collect(),
            Instance::Hidden(hidden) => hidden.node().into_iter().collect(),
            Instance::Portal(portal) => portal.node().into_iter().collect(),
            Instance::Component(component) | Instance::Context(component) => {
                component.dom_nodes()
            }
        }
    }

    /// First platform handle; new siblings are inserted before it.
    pub fn anchor(&self) -> Option<NodeId> {
        match self {
            Instance::Component(component) | Instance::Context(component) => component.anchor(),
            _ => self.dom_nodes().first().copied(),
        }
    }

    pub fn kind(&self) -> Option<Kind> {
        match self {
            Instance::Element(element) => Some(Kind::Tag(element.tag().into())),
            Instance::Component(component) => Some(Kind::Component(component.kind())),
            Instance::Context(_) => Some(Kind::Context),
            Instance::Portal(_) => Some(Kind::Portal),
            Instance::Text(_) | Instance::Hidden(_) => None,
        }
    }

    pub fn key(&self) -> Option<Rc<str>> {
        match self {
            Instance::Element(element) => element.key(),
            Instance::Component(component) | Instance::Context(component) => component.key(),
            Instance::Portal(portal) => portal.key(),
            Instance::Text(_) | Instance::Hidden(_) => None,
        }
    }

    /// Whether `element` describes this instance so it can be updated in place.
    pub fn is_same_kind(&self, element: &VElement) -> bool {
        match (self, &element.kind) {
            (Instance::Element(instance), Kind::Tag(tag)) => instance.tag() == &**tag,
            (Instance::Component(component), Kind::Component(kind)) => component.kind() == *kind,
            (Instance::Context(_), Kind::Context) | (Instance::Portal(_), Kind::Portal) => true,
            _ => false,
        }
    }
}

/// Instances for one description position: a single node or a non-empty list.
pub enum Vdom {
    Single(Box<Instance>),
    List(Vec<Instance>),
}

impl Vdom {
    pub fn instances(&self) -> &[Instance] {
        match self {
            Vdom::Single(instance) => std::slice::from_ref(&**instance),
            Vdom::List(instances) => instances,
        }
    }

    fn instances_mut(&mut self) -> &mut [Instance] {
        match self {
            Vdom::Single(instance) => std::slice::from_mut(&mut **instance),
            Vdom::List(instances) => instances,
        }
    }

    pub fn mount(&mut self) -> Result<(), ViewError> {
        self.instances_mut().iter_mut().try_for_each(Instance::mount)
    }

    pub fn flush(&mut self) -> Result<(), ViewError> {
        self.instances_mut().iter_mut().try_for_each(Instance::flush)
    }

    /// Tears down every instance even if some fail; the first error is returned.
    pub fn unmount(&mut self) -> Result<(), ViewError> {
        let mut first = Ok(());
        for instance in self.instances_mut() {
            let result = instance.unmount();
            if first.is_ok() {
                first = result;
            } else if let Err(err) = result {
                log::warn!("additional error during unmount: {err}");
            }
        }
        first
    }

    pub fn insert_before(&self, parent: NodeId, reference: Option<NodeId>) -> Result<(), ViewError> {
        self.instances()
            .iter()
            .try_for_each(|instance| instance.insert_before(parent, reference))
    }

    pub fn dom_nodes(&self) -> Vec<NodeId> {
        self.instances().iter().flat_map(Instance::dom_nodes).collect()
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.instances().first().and_then(Instance::anchor)
    }
}

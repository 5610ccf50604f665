use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::DomError;
use crate::props::{EventListener, PropValue};

pub type NodeId = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Event names the platform dispatches under their lower-case spelling.
pub const KNOWN_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "contextmenu",
    "input",
    "change",
    "submit",
    "reset",
    "focus",
    "blur",
    "keydown",
    "keyup",
    "keypress",
    "mousedown",
    "mouseup",
    "mousemove",
    "mouseover",
    "mouseout",
    "mouseenter",
    "mouseleave",
    "pointerdown",
    "pointerup",
    "pointermove",
    "touchstart",
    "touchend",
    "touchmove",
    "wheel",
    "scroll",
    "drag",
    "dragstart",
    "dragend",
    "dragover",
    "drop",
    "load",
    "error",
    "resize",
];

/// Platform tree the reconciler writes into.
///
/// Handles are plain ids owned by the implementation. Moving an attached node
/// with `append_child` or `insert_before` detaches it from its previous parent.
pub trait Document {
    fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    fn create_comment(&mut self, text: &str) -> NodeId;

    fn body(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn first_child(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError>;
    /// Detaches `node` from its parent; a detached node is left as is.
    fn remove(&mut self, node: NodeId) -> Result<(), DomError>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;
    fn set_property(&mut self, node: NodeId, name: &str, value: PropValue) -> Result<(), DomError>;
    fn set_style_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;
    fn set_style_property(&mut self, node: NodeId, name: &str, value: &str)
        -> Result<(), DomError>;
    fn remove_style_property(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;
    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: EventListener,
        capture: bool,
    ) -> Result<(), DomError>;
    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &EventListener,
        capture: bool,
    ) -> Result<(), DomError>;

    fn supports_event(&self, name: &str) -> bool {
        KNOWN_EVENTS.contains(&name)
    }
}

/// Shared handle to the document a tree is rendered into.
///
/// Every call borrows the document only for its own duration, so callbacks
/// invoked by the reconciler are free to reach the document again.
#[derive(Clone)]
pub struct Host {
    document: Rc<RefCell<dyn Document>>,
}

impl Host {
    pub fn new<D: Document + 'static>(document: Rc<RefCell<D>>) -> Self {
        Self { document }
    }

    /// Identity of the underlying document.
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.document) as *const () as usize
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Document) -> R) -> R {
        f(&mut *self.document.borrow_mut())
    }

    pub fn create_element(&self, tag: &str, namespace: Namespace) -> NodeId {
        self.with(|doc| doc.create_element(tag, namespace))
    }

    pub fn create_text(&self, text: &str) -> NodeId {
        self.with(|doc| doc.create_text(text))
    }

    pub fn create_comment(&self, text: &str) -> NodeId {
        self.with(|doc| doc.create_comment(text))
    }

    pub fn body(&self) -> NodeId {
        self.document.borrow().body()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().parent(node)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().first_child(node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.document.borrow().next_sibling(node)
    }

    pub fn supports_event(&self, name: &str) -> bool {
        self.document.borrow().supports_event(name)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.with(|doc| doc.append_child(parent, child))
    }

    pub fn insert_before(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.with(|doc| doc.insert_before(parent, child, reference))
    }

    pub fn remove(&self, node: NodeId) -> Result<(), DomError> {
        self.with(|doc| doc.remove(node))
    }

    pub fn set_text(&self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.with(|doc| doc.set_text(node, text))
    }

    pub fn clear(&self, node: NodeId) -> Result<(), DomError> {
        while let Some(child) = self.first_child(node) {
            self.remove(child)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Host").field(&self.id()).finish()
    }
}

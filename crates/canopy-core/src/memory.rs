use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::DomError;
use crate::platform::{Document, Namespace, NodeId};
use crate::props::{Event, EventListener, PropValue};

enum NodeData {
    Element {
        tag: String,
        namespace: Namespace,
        attributes: BTreeMap<String, String>,
        properties: BTreeMap<String, PropValue>,
        style: BTreeMap<String, String>,
        listeners: Vec<(String, bool, EventListener)>,
    },
    Text(String),
    Comment(String),
}

struct MemoryNode {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>, // FUTURE(no_std): store child ids in smallvec.
}

/// In-memory [`Document`] with HTML-like serialization.
///
/// Nodes are never freed; detached nodes stay addressable so tests can check
/// handle identity across updates.
pub struct MemoryDocument {
    nodes: Vec<MemoryNode>, // FUTURE(no_std): migrate to arena-backed node storage.
    body: NodeId,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            body: 0,
        };
        document.body = document.create_element("body", Namespace::Html);
        document
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, DomError> {
        self.nodes.get(id).ok_or(DomError::Missing { node: id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, DomError> {
        self.nodes.get_mut(id).ok_or(DomError::Missing { node: id })
    }

    fn element_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut NodeData, DomError> {
        let node = self.node_mut(id)?;
        match node.data {
            NodeData::Element { .. } => Ok(&mut node.data),
            _ => Err(DomError::Missing { node: id }),
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|&id| id != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Total number of nodes ever created, `body` included.
    pub fn created_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes in the subtree rooted at `root`, `root` excluded.
    pub fn descendant_count(&self, root: NodeId) -> usize {
        self.children(root)
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        false
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn namespace(&self, node: NodeId) -> Option<Namespace> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { namespace, .. } => Some(*namespace),
            _ => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { properties, .. } => properties.get(name).cloned(),
            _ => None,
        }
    }

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node)?.data {
            NodeData::Element { style, .. } => style.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// `(event, capture)` pairs registered on `node`, in registration order.
    pub fn listeners(&self, node: NodeId) -> Vec<(String, bool)> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element { listeners, .. }) => listeners
                .iter()
                .map(|(event, capture, _)| (event.clone(), *capture))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Listeners that fire for `event` on `target`: capturing ones from the
    /// root down, then bubbling ones from the target up.
    pub fn listeners_for(&self, target: NodeId, event: &str) -> Vec<EventListener> {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            path.push(id);
            current = self.nodes.get(id).and_then(|node| node.parent);
        }

        let matching = |id: NodeId, phase: bool| -> Vec<EventListener> {
            match self.nodes.get(id).map(|node| &node.data) {
                Some(NodeData::Element { listeners, .. }) => listeners
                    .iter()
                    .filter(|(name, capture, _)| name == event && *capture == phase)
                    .map(|(_, _, listener)| listener.clone())
                    .collect(),
                _ => Vec::new(),
            }
        };

        let mut result = Vec::new();
        for &id in path.iter().rev() {
            result.extend(matching(id, true));
        }
        for &id in path.iter() {
            result.extend(matching(id, false));
        }
        result
    }

    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_by_tag(root, tag, &mut found);
        found
    }

    fn collect_by_tag(&self, node: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        for child in self.children(node) {
            if self.tag(child) == Some(tag) {
                found.push(child);
            }
            self.collect_by_tag(child, tag, found);
        }
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut output = String::new();
        for child in self.children(node) {
            self.write_node(&mut output, child);
        }
        output
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut output = String::new();
        self.write_node(&mut output, node);
        output
    }

    fn write_node(&self, output: &mut String, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => output.push_str(&escape(text, false)),
            NodeData::Comment(text) => {
                let _ = write!(output, "<!--{text}-->");
            }
            NodeData::Element {
                tag,
                attributes,
                style,
                ..
            } => {
                let mut attributes: Vec<(&str, String)> = attributes
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.clone()))
                    .collect();
                if !style.is_empty() {
                    let text = style
                        .iter()
                        .map(|(name, value)| format!("{name}: {value}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    attributes.push(("style", text));
                    attributes.sort_by(|a, b| a.0.cmp(b.0));
                }
                output.push('<');
                output.push_str(tag);
                for (name, value) in attributes {
                    if value.is_empty() {
                        let _ = write!(output, " {name}");
                    } else {
                        let _ = write!(output, " {name}=\"{}\"", escape(&value, true));
                    }
                }
                output.push('>');
                for &child in &node.children {
                    self.write_node(output, child);
                }
                let _ = write!(output, "</{tag}>");
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn parse_style(text: &str) -> BTreeMap<String, String> {
    text.split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, value)| !name.is_empty() && !value.is_empty())
        .collect()
}

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            namespace,
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            style: BTreeMap::new(),
            listeners: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.children.first().copied()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node)?.parent?;
        let siblings = &self.nodes.get(parent)?.children;
        let index = siblings.iter().position(|&id| id == node)?;
        siblings.get(index + 1).copied()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.node(parent)?;
        self.detach(child)?;
        let index = match reference {
            Some(reference) => self
                .node(parent)?
                .children
                .iter()
                .position(|&id| id == reference)
                .ok_or(DomError::Detached { node: reference })?,
            None => self.node(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.detach(node)
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(current) | NodeData::Comment(current) => {
                *current = text.to_string();
                Ok(())
            }
            NodeData::Element { .. } => Err(DomError::Missing { node }),
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if let NodeData::Element { attributes, .. } = self.element_mut(node)? {
            attributes.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        if let NodeData::Element { attributes, .. } = self.element_mut(node)? {
            attributes.remove(name);
        }
        Ok(())
    }

    fn set_property(&mut self, node: NodeId, name: &str, value: PropValue) -> Result<(), DomError> {
        if let NodeData::Element { properties, .. } = self.element_mut(node)? {
            properties.insert(name.to_string(), value);
        }
        Ok(())
    }

    fn set_style_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        if let NodeData::Element { style, .. } = self.element_mut(node)? {
            *style = parse_style(text);
        }
        Ok(())
    }

    fn set_style_property(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        if let NodeData::Element { style, .. } = self.element_mut(node)? {
            if value.is_empty() {
                style.remove(name);
            } else {
                style.insert(name.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn remove_style_property(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        if let NodeData::Element { style, .. } = self.element_mut(node)? {
            style.remove(name);
        }
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: EventListener,
        capture: bool,
    ) -> Result<(), DomError> {
        if let NodeData::Element { listeners, .. } = self.element_mut(node)? {
            let exists = listeners
                .iter()
                .any(|(name, phase, existing)| name == event && *phase == capture && existing.ptr_eq(&listener));
            if !exists {
                listeners.push((event.to_string(), capture, listener));
            }
        }
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        event: &str,
        listener: &EventListener,
        capture: bool,
    ) -> Result<(), DomError> {
        if let NodeData::Element { listeners, .. } = self.element_mut(node)? {
            listeners.retain(|(name, phase, existing)| {
                !(name == event && *phase == capture && existing.ptr_eq(listener))
            });
        }
        Ok(())
    }
}

/// Fires `event` at `target`, releasing the document borrow before any listener runs.
pub fn dispatch(document: &RefCell<MemoryDocument>, target: NodeId, event: &str) -> usize {
    let listeners = document.borrow().listeners_for(target, event);
    let fired = Event {
        name: event.to_string(),
        target,
    };
    for listener in &listeners {
        listener.call(&fired);
    }
    listeners.len()
}

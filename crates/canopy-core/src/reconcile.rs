//! Turns descriptions into instances and brings existing instances in line
//! with new descriptions.
//!
//! Every position holds a [`Vdom`]: a single instance, or a non-empty list for
//! sequence descriptions. Sequences are flattened completely and an empty one
//! renders a single placeholder.

use std::rc::Rc;

use crate::collections::map::{HashMap, HashSet};
use crate::context::RenderContext;
use crate::diff::{diff_paired, Patch};
use crate::error::{DomError, ViewError};
use crate::instance::{
    ElementInstance, HiddenInstance, Instance, PortalInstance, TextInstance, UserComponent, Vdom,
};
use crate::node::{flatten_into, Kind, VNode};
use crate::platform::NodeId;

enum Shape {
    One(VNode),
    Many(Vec<VNode>),
}

fn shape(tree: &VNode) -> Shape {
    match tree {
        VNode::List(nodes) => {
            let mut flat = Vec::new();
            flatten_into(nodes, &mut flat);
            if flat.is_empty() {
                Shape::One(VNode::Null)
            } else {
                Shape::Many(flat)
            }
        }
        other => Shape::One(other.clone()),
    }
}

/// Builds the instances for `tree` without touching the document.
pub fn create(tree: &VNode, ctx: &RenderContext) -> Result<Vdom, ViewError> {
    build(shape(tree), ctx)
}

fn build(shape: Shape, ctx: &RenderContext) -> Result<Vdom, ViewError> {
    match shape {
        Shape::One(node) => create_instance(&node, ctx).map(|instance| Vdom::Single(Box::new(instance))),
        Shape::Many(nodes) => nodes
            .iter()
            .map(|node| create_instance(node, ctx))
            .collect::<Result<Vec<_>, _>>()
            .map(Vdom::List),
    }
}

fn create_instance(node: &VNode, ctx: &RenderContext) -> Result<Instance, ViewError> {
    let host = ctx.host();
    let element = match node {
        VNode::Element(element) => element,
        leaf => {
            return Ok(match leaf.as_text() {
                Some(text) => Instance::Text(TextInstance::new(host, text)),
                None => Instance::Hidden(HiddenInstance::new(host)),
            });
        }
    };
    log::trace!("creating {:?}", element.kind);
    let component = match &element.kind {
        Kind::Tag(tag) => return Ok(Instance::Element(ElementInstance::new(element, tag, ctx))),
        Kind::Portal => return Ok(Instance::Portal(PortalInstance::new(element, ctx))),
        Kind::Component(kind) => UserComponent::create(*kind, element, ctx)
            .map(Instance::Component)
            .map_err(|source| (kind.name(), source)),
        Kind::Context => UserComponent::context(element, ctx)
            .map(Instance::Context)
            .map_err(|source| ("Context", source)),
    };
    match component {
        Ok(instance) => Ok(instance),
        Err((component, source)) => {
            ctx.handle_error(ViewError::Construction { component, source })?;
            Ok(Instance::Hidden(HiddenInstance::new(host)))
        }
    }
}

/// Updates `vdom` so that it renders `tree`, reusing instances where the
/// kinds allow it. Instances created on the way are mounted, inserted and
/// flushed before this returns.
pub fn update(tree: &VNode, vdom: &mut Vdom, ctx: &RenderContext) -> Result<(), ViewError> {
    let shape = shape(tree);
    let handled = match (&shape, &mut *vdom) {
        (Shape::One(node), Vdom::Single(instance)) => {
            update_instance(&mut **instance, node, ctx)?;
            true
        }
        (Shape::Many(nodes), Vdom::List(instances)) => update_list(instances, nodes, ctx)?,
        _ => false,
    };
    if handled {
        return Ok(());
    }
    let mut fresh = build(shape, ctx)?;
    fresh.mount()?;
    if let Some((parent, anchor)) = position(vdom.anchor(), ctx) {
        fresh.insert_before(parent, Some(anchor))?;
    }
    fresh.flush()?;
    let mut previous = std::mem::replace(vdom, fresh);
    previous.unmount()
}

fn position(anchor: Option<NodeId>, ctx: &RenderContext) -> Option<(NodeId, NodeId)> {
    let anchor = anchor?;
    let parent = ctx.host().parent(anchor)?;
    Some((parent, anchor))
}

/// In-place update when `node` can be expressed by `instance`.
fn update_in_place(instance: &mut Instance, node: &VNode) -> Result<bool, ViewError> {
    match (instance, node) {
        (Instance::Hidden(_), VNode::Null | VNode::Bool(false)) => Ok(true),
        (Instance::Text(text), node) => match node.as_text() {
            Some(value) => text.set_text(value).map(|()| true),
            None => Ok(false),
        },
        (instance, VNode::Element(element)) if instance.is_same_kind(element) => {
            instance.update(element).map(|()| true)
        }
        _ => Ok(false),
    }
}

fn update_instance(instance: &mut Instance, node: &VNode, ctx: &RenderContext) -> Result<(), ViewError> {
    if update_in_place(instance, node)? {
        return Ok(());
    }
    log::trace!("replacing instance with {node:?}");
    let mut fresh = create_instance(node, ctx)?;
    fresh.mount()?;
    if let Some((parent, anchor)) = position(instance.anchor(), ctx) {
        fresh.insert_before(parent, Some(anchor))?;
    }
    fresh.flush()?;
    let mut previous = std::mem::replace(instance, fresh);
    previous.unmount()
}

/// Returns `false` when the list has to be replaced as a whole.
fn update_list(
    instances: &mut Vec<Instance>,
    nodes: &[VNode],
    ctx: &RenderContext,
) -> Result<bool, ViewError> {
    let keyed = nodes[0].key().is_some() && instances[0].key().is_some();
    if keyed {
        return update_keyed(instances, nodes, ctx);
    }
    if instances.len() != nodes.len() {
        return Ok(false);
    }
    for (instance, node) in instances.iter_mut().zip(nodes) {
        update_instance(instance, node, ctx)?;
    }
    Ok(true)
}

fn similar(instance: &Instance, node: &VNode) -> bool {
    match node {
        VNode::Element(element) => {
            instance.is_same_kind(element) && instance.key() == element.props.key()
        }
        _ => false,
    }
}

/// Pairs every node with the first unclaimed instance it can update in place,
/// so occurrences of a duplicated key pair up in order.
fn pair_keyed(instances: &[Instance], nodes: &[VNode]) -> Vec<Option<usize>> {
    let mut by_key: HashMap<Option<Rc<str>>, Vec<usize>> = HashMap::default();
    for (index, instance) in instances.iter().enumerate() {
        by_key.entry(instance.key()).or_default().push(index);
    }
    nodes
        .iter()
        .map(|node| {
            let candidates = by_key.get_mut(&node.key())?;
            let found = candidates
                .iter()
                .position(|&index| similar(&instances[index], node))?;
            Some(candidates.remove(found))
        })
        .collect()
}

fn warn_duplicate_keys(nodes: &[VNode]) {
    let mut seen = HashSet::default();
    for key in nodes.iter().filter_map(VNode::key) {
        if !seen.insert(key.clone()) {
            log::warn!("duplicate key {key:?} among siblings; occurrences pair up in order");
        }
    }
}

fn update_keyed(
    instances: &mut Vec<Instance>,
    nodes: &[VNode],
    ctx: &RenderContext,
) -> Result<bool, ViewError> {
    let host = ctx.host();
    let dom = instances.iter().flat_map(Instance::dom_nodes).collect::<Vec<_>>();
    let (Some(&first), Some(&last)) = (dom.first(), dom.last()) else {
        return Ok(false);
    };
    let parent = host.parent(first).ok_or(DomError::Detached { node: first })?;
    // Anything after the list stays put, so its first node bounds appends.
    let end = host.next_sibling(last);

    warn_duplicate_keys(nodes);
    let partners = pair_keyed(instances, nodes);
    for (node, partner) in nodes.iter().zip(&partners) {
        if let (VNode::Element(element), Some(index)) = (node, partner) {
            instances[*index].update(element)?;
        }
    }

    let script = diff_paired(instances.len(), &partners);
    log::debug!(
        "keyed update of {} -> {} item(s) with {} patch(es)",
        instances.len(),
        nodes.len(),
        script.len()
    );

    for patch in script {
        match patch {
            Patch::Insert { index, values } => {
                let mut created = Vec::with_capacity(values.len());
                for value in values {
                    let mut instance = create_instance(&nodes[value], ctx)?;
                    instance.mount()?;
                    created.push(instance);
                }
                let reference = instances.get(index).and_then(Instance::anchor).or(end);
                for instance in &created {
                    instance.insert_before(parent, reference)?;
                }
                for instance in &mut created {
                    instance.flush()?;
                }
                instances.splice(index..index, created);
            }
            Patch::Remove { index, count } => {
                let removed = instances.drain(index..index + count).collect::<Vec<_>>();
                for mut instance in removed {
                    instance.unmount()?;
                }
            }
            Patch::Move { from, to, count } => {
                let moved = instances.drain(from..from + count).collect::<Vec<_>>();
                let reference = instances.get(to).and_then(Instance::anchor).or(end);
                for instance in &moved {
                    instance.insert_before(parent, reference)?;
                }
                instances.splice(to..to, moved);
            }
        }
    }
    Ok(true)
}

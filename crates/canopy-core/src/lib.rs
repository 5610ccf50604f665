#![doc = r"Virtual tree reconciler for Canopy: node descriptions, keyed list diffing, live instances and reactive re-rendering."]

mod collections;
mod component;
mod context;
pub mod diff;
mod error;
mod instance;
mod memory;
mod node;
mod platform;
mod props;
pub mod reconcile;
mod render;

pub use component::{Component, ComponentType, UserContext};
pub use context::{ErrorHandler, RenderContext};
pub use diff::{apply, diff, diff_paired, Patch};
pub use error::{BoxError, DomError, Hook, ViewError};
pub use instance::{
    ElementInstance, HiddenInstance, Instance, PortalInstance, TextInstance, UserComponent, Vdom,
};
pub use memory::{dispatch, MemoryDocument};
pub use node::{clone_element, flatten_into, h, Children, Kind, VElement, VNode};
pub use platform::{Document, Host, Namespace, NodeId, KNOWN_EVENTS};
pub use props::{format_number, Event, EventListener, PropValue, Props, RefCallback, StyleMap};
pub use render::{render, unmount_root, with_root};

use std::cell::RefCell;
use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::component::UserContext;
use crate::context::RenderContext;
use crate::error::ViewError;
use crate::instance::Vdom;
use crate::node::VNode;
use crate::platform::{Host, NodeId};
use crate::reconcile;

thread_local! {
    // Trees rendered through `render`, keyed by document identity and container.
    static ROOTS: RefCell<HashMap<(usize, NodeId), Rc<RefCell<Vdom>>>> =
        RefCell::new(HashMap::default());
}

/// Renders `tree` into `container`, replacing whatever was there.
///
/// A tree previously rendered into the same container is unmounted first, and
/// the container is emptied. Errors no boundary handled are returned; the tree
/// stays registered for [`unmount_root`] once its instances exist.
pub fn render(
    tree: &VNode,
    container: NodeId,
    host: &Host,
    user_context: UserContext,
) -> Result<(), ViewError> {
    unmount_root(host, container)?;
    host.clear(container)?;

    let ctx = RenderContext::root(host.clone(), user_context);
    let mut vdom = reconcile::create(tree, &ctx)?;
    if let Err(err) = vdom.mount() {
        if let Err(teardown) = vdom.unmount() {
            log::warn!("error while discarding a partially mounted tree: {teardown}");
        }
        return Err(err);
    }
    vdom.insert_before(container, None)?;
    let flushed = vdom.flush();
    let root = Rc::new(RefCell::new(vdom));
    ROOTS.with(|roots| roots.borrow_mut().insert((host.id(), container), root));
    flushed
}

/// Tears down the tree rendered into `container`, if any, and reports whether
/// there was one.
///
/// Fails with [`ViewError::RootBusy`] when called for the container a running
/// [`with_root`] callback is inspecting.
pub fn unmount_root(host: &Host, container: NodeId) -> Result<bool, ViewError> {
    let key = (host.id(), container);
    let Some(root) = ROOTS.with(|roots| roots.borrow().get(&key).cloned()) else {
        return Ok(false);
    };
    let Ok(mut vdom) = root.try_borrow_mut() else {
        return Err(ViewError::RootBusy { container });
    };
    ROOTS.with(|roots| roots.borrow_mut().remove(&key));
    vdom.unmount().map(|()| true)
}

/// Runs `f` against the instances rendered into `container`.
///
/// `f` may render into or unmount other containers; the tree it is looking at
/// stays registered until it returns.
pub fn with_root<R>(host: &Host, container: NodeId, f: impl FnOnce(&Vdom) -> R) -> Option<R> {
    let root = ROOTS.with(|roots| roots.borrow().get(&(host.id(), container)).cloned())?;
    let vdom = root.borrow();
    Some(f(&vdom))
}

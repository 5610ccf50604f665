use std::cell::{Ref, RefCell};
use std::rc::Rc;

use canopy_core::{
    dispatch, reconcile, render, unmount_root, Host, MemoryDocument, Namespace, NodeId,
    RenderContext, UserContext, Vdom, ViewError, VNode,
};

/// Headless harness for rendering trees in tests.
///
/// Owns an in-memory document with a `<main>` container attached to its body.
/// Whatever is rendered into the container is unmounted when the harness is
/// dropped, so reactive subscriptions never outlive a test.
pub struct TestRoot {
    document: Rc<RefCell<MemoryDocument>>,
    host: Host,
    container: NodeId,
}

impl TestRoot {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let document = Rc::new(RefCell::new(MemoryDocument::new()));
        let host = Host::new(Rc::clone(&document));
        let container = host.create_element("main", Namespace::Html);
        host.append_child(host.body(), container)
            .expect("attach container to body");
        Self {
            document,
            host,
            container,
        }
    }

    /// Render `tree` into the container with an empty user context.
    pub fn set_content(&mut self, tree: VNode) -> Result<(), ViewError> {
        self.set_content_with_context(tree, UserContext::new())
    }

    pub fn set_content_with_context(
        &mut self,
        tree: VNode,
        context: UserContext,
    ) -> Result<(), ViewError> {
        render(&tree, self.container, &self.host, context)
    }

    /// Run every pending reactive notification.
    pub fn pump_until_idle(&self) -> Result<(), ViewError> {
        canopy_state::flush().map_err(ViewError::from_listener)
    }

    /// Tear down the rendered tree; `Ok(false)` when nothing was rendered.
    pub fn unmount(&mut self) -> Result<bool, ViewError> {
        unmount_root(&self.host, self.container)
    }

    /// Serialized content of the container.
    pub fn html(&self) -> String {
        self.document.borrow().inner_html(self.container)
    }

    pub fn body_html(&self) -> String {
        let body = self.host.body();
        self.document.borrow().inner_html(body)
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn document(&self) -> Ref<'_, MemoryDocument> {
        self.document.borrow()
    }

    /// Shared handle for callbacks that inspect the document while a tree
    /// is being reconciled.
    pub fn document_handle(&self) -> Rc<RefCell<MemoryDocument>> {
        Rc::clone(&self.document)
    }

    /// Another element attached to the body, usable as a portal target.
    pub fn create_container(&self, tag: &str) -> NodeId {
        let node = self.host.create_element(tag, Namespace::Html);
        self.host
            .append_child(self.host.body(), node)
            .expect("attach container to body");
        node
    }

    /// Elements named `tag` below the container, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        self.document.borrow().find_by_tag(self.container, tag)
    }

    pub fn find(&self, tag: &str) -> Option<NodeId> {
        self.find_all(tag).into_iter().next()
    }

    /// Fire `event` at `target`; returns how many listeners ran.
    pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
        dispatch(&self.document, target, event)
    }
}

impl Default for TestRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestRoot {
    fn drop(&mut self) {
        if let Err(err) = unmount_root(&self.host, self.container) {
            log::warn!("error while unmounting test root: {err}");
        }
    }
}

/// Tree driven through [`reconcile::create`] and [`reconcile::update`] instead
/// of `render`, so updates reuse the mounted instances.
pub struct TestTree {
    root: TestRoot,
    ctx: RenderContext,
    vdom: Option<Vdom>,
}

impl TestTree {
    pub fn new() -> Self {
        Self::with_context(UserContext::new())
    }

    pub fn with_context(context: UserContext) -> Self {
        let root = TestRoot::new();
        let ctx = RenderContext::root(root.host().clone(), context);
        Self {
            root,
            ctx,
            vdom: None,
        }
    }

    /// Create, mount, attach and flush `tree` in the container.
    pub fn mount(&mut self, tree: &VNode) -> Result<(), ViewError> {
        if let Some(mut previous) = self.vdom.take() {
            previous.unmount()?;
        }
        let mut vdom = reconcile::create(tree, &self.ctx)?;
        vdom.mount()?;
        vdom.insert_before(self.root.container(), None)?;
        let vdom = self.vdom.insert(vdom);
        vdom.flush()
    }

    /// Reconcile the mounted instances against `tree`.
    pub fn update(&mut self, tree: &VNode) -> Result<(), ViewError> {
        match self.vdom.as_mut() {
            Some(vdom) => reconcile::update(tree, vdom, &self.ctx),
            None => self.mount(tree),
        }
    }

    pub fn unmount(&mut self) -> Result<(), ViewError> {
        match self.vdom.take() {
            Some(mut vdom) => vdom.unmount(),
            None => Ok(()),
        }
    }

    pub fn vdom(&self) -> Option<&Vdom> {
        self.vdom.as_ref()
    }

    pub fn root(&self) -> &TestRoot {
        &self.root
    }

    pub fn html(&self) -> String {
        self.root.html()
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestTree {
    fn drop(&mut self) {
        if let Err(err) = self.unmount() {
            log::warn!("error while unmounting test tree: {err}");
        }
    }
}

/// Convenience helper for tests that only need temporary access to a `TestRoot`.
pub fn run_test_root<R>(f: impl FnOnce(&mut TestRoot) -> R) -> R {
    let mut root = TestRoot::new();
    f(&mut root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::{h, Props};

    #[test]
    fn test_root_renders_and_unmounts() {
        run_test_root(|root| {
            assert_eq!(root.html(), "");
            root.set_content(h("p", Props::new(), ["hi".into()]))
                .expect("render");
            assert_eq!(root.html(), "<p>hi</p>");
            assert!(root.find("p").is_some());

            assert!(root.unmount().expect("unmount"));
            assert_eq!(root.html(), "");
            assert!(!root.unmount().expect("second unmount"));
        });
    }
}

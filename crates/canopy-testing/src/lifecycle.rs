use std::cell::RefCell;
use std::rc::Rc;

use canopy_core::{
    h, BoxError, Children, Component, ComponentType, PropValue, Props, UserContext, VNode,
    ViewError,
};
use canopy_state::{observable, Observable};

/// Shared, ordered record of lifecycle steps.
///
/// Passed to components as a prop; every copy of the prop value points at the
/// same log, so descriptions rebuilt on each render keep equal props.
#[derive(Clone, Default)]
pub struct LifecycleLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl LifecycleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Returns the recorded entries and starts over.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.borrow().iter().any(|recorded| recorded == entry)
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries.borrow().iter().position(|recorded| recorded == entry)
    }

    pub fn to_prop(&self) -> PropValue {
        PropValue::Any(self.entries.clone())
    }

    pub fn from_props(props: &Props) -> Self {
        let entries = props
            .downcast::<RefCell<Vec<String>>>("log")
            .unwrap_or_default();
        Self { entries }
    }
}

/// Component that records every hook as `"<name>:<hook>"` and renders its
/// children, or its `label` prop when it has none.
///
/// The `fail` prop names one step (`create`, `will_mount`, `render`,
/// `did_mount`, `did_update`, `did_render`, `will_unmount`) that returns an
/// error instead of succeeding.
pub struct Probe {
    name: String,
    log: LifecycleLog,
    fail: Option<String>,
}

impl Probe {
    pub fn node(name: &str, log: &LifecycleLog, children: impl IntoIterator<Item = VNode>) -> VNode {
        Self::node_with(name, log, Props::new(), children)
    }

    pub fn node_with(
        name: &str,
        log: &LifecycleLog,
        props: Props,
        children: impl IntoIterator<Item = VNode>,
    ) -> VNode {
        let props = Props::new()
            .with("name", name)
            .with("log", log.to_prop())
            .merged(&props);
        h(ComponentType::of::<Probe>(), props, children)
    }

    fn step(&self, hook: &str) -> Result<(), BoxError> {
        self.log.record(format!("{}:{hook}", self.name));
        if self.fail.as_deref() == Some(hook) {
            return Err(format!("{} failed in {hook}", self.name).into());
        }
        Ok(())
    }
}

impl Component for Probe {
    fn create(props: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        let probe = Probe {
            name: props.str("name").unwrap_or("probe").to_string(),
            log: LifecycleLog::from_props(props),
            fail: props.str("fail").map(str::to_string),
        };
        probe.step("create")?;
        Ok(probe)
    }

    fn render(&mut self, props: &Props, children: &Children, _: &UserContext) -> Result<VNode, BoxError> {
        self.fail = props.str("fail").map(str::to_string);
        self.step("render")?;
        if children.is_some() {
            return Ok(children.to_node());
        }
        Ok(props.str("label").map(VNode::text).unwrap_or_default())
    }

    fn will_mount(&mut self) -> Result<(), BoxError> {
        self.step("will_mount")
    }

    fn did_mount(&mut self) -> Result<(), BoxError> {
        self.step("did_mount")
    }

    fn did_update(&mut self) -> Result<(), BoxError> {
        self.step("did_update")
    }

    fn did_render(&mut self) -> Result<(), BoxError> {
        self.step("did_render")
    }

    fn will_unmount(&mut self) -> Result<(), BoxError> {
        self.step("will_unmount")
    }
}

/// Error boundary: records `"<name>:caught:<error>"` and renders a
/// `<p class="fallback">` with the message instead of its children.
///
/// With the `rethrow` prop set it records the error and passes it on.
pub struct Boundary {
    name: String,
    log: LifecycleLog,
    rethrow: bool,
    failed: Observable<Option<String>>,
}

impl Boundary {
    pub fn node(name: &str, log: &LifecycleLog, children: impl IntoIterator<Item = VNode>) -> VNode {
        Self::node_with(name, log, Props::new(), children)
    }

    pub fn node_with(
        name: &str,
        log: &LifecycleLog,
        props: Props,
        children: impl IntoIterator<Item = VNode>,
    ) -> VNode {
        let props = Props::new()
            .with("name", name)
            .with("log", log.to_prop())
            .merged(&props);
        h(ComponentType::of::<Boundary>(), props, children)
    }
}

impl Component for Boundary {
    fn create(props: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        Ok(Boundary {
            name: props.str("name").unwrap_or("boundary").to_string(),
            log: LifecycleLog::from_props(props),
            rethrow: props.get("rethrow").is_some_and(PropValue::is_truthy),
            failed: observable(None),
        })
    }

    fn render(&mut self, _: &Props, children: &Children, _: &UserContext) -> Result<VNode, BoxError> {
        Ok(match self.failed.get() {
            Some(message) => h(
                "p",
                Props::new().with("class", "fallback"),
                [VNode::text(message)],
            ),
            None => children.to_node(),
        })
    }

    fn catches_errors(&self) -> bool {
        true
    }

    fn did_catch(&mut self, error: ViewError) -> Result<(), ViewError> {
        self.log.record(format!("{}:caught:{error}", self.name));
        if self.rethrow {
            return Err(error);
        }
        self.failed.set(Some(error.to_string()));
        Ok(())
    }
}

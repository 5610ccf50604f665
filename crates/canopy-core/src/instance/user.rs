use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use canopy_state::{
    computed, observable, observable_with, track, Computed, Dependencies, Listener, ListenerError,
    Observable, ObservableOptions, Priority,
};

use crate::component::{Component, ComponentType, UserContext};
use crate::context::{ErrorHandler, RenderContext};
use crate::error::{BoxError, Hook, ViewError};
use crate::instance::Vdom;
use crate::node::{Children, VElement, VNode};
use crate::platform::NodeId;
use crate::props::Props;
use crate::reconcile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Created,
    /// Notified before its first flush; re-renders once flushed.
    Stale,
    Mounted,
    Unmounted,
}

struct Inputs {
    props: Props,
    children: Children,
}

/// Built-in component behind `Context` nodes: renders its children unchanged.
struct Provider;

impl Component for Provider {
    fn create(_: &Props, _: &Children, _: &UserContext) -> Result<Self, BoxError> {
        Ok(Provider)
    }

    fn render(&mut self, _: &Props, children: &Children, _: &UserContext) -> Result<VNode, BoxError> {
        Ok(children.to_node())
    }
}

/// Live user component: owns the component object and re-renders it whenever
/// a reactive cell read by its last successful render changes.
pub struct UserComponent {
    kind: ComponentType,
    element: RefCell<Rc<VElement>>,
    props: Observable<Props>,
    children: Observable<Children>,
    inputs: Computed<Inputs>,
    object: RefCell<Box<dyn Component>>,
    user_context: UserContext,
    priority: Priority,
    content_ctx: RenderContext,
    vdom: RefCell<Option<Vdom>>,
    dependencies: RefCell<Dependencies>,
    listener: Listener,
    phase: Cell<Phase>,
}

fn boundary(component: Weak<UserComponent>, parent: ErrorHandler) -> ErrorHandler {
    ErrorHandler::new(move |error| {
        let Some(component) = component.upgrade() else {
            return parent.handle(error);
        };
        let outcome = match component.object.try_borrow_mut() {
            Ok(mut object) => object.did_catch(error),
            Err(_) => Err(error),
        };
        outcome.or_else(|error| parent.handle(error))
    })
}

impl UserComponent {
    pub(crate) fn create(
        kind: ComponentType,
        element: &Rc<VElement>,
        ctx: &RenderContext,
    ) -> Result<Rc<Self>, BoxError> {
        Self::build(kind, element, ctx, ctx.user_context().clone())
    }

    /// Context node: its merged user context is fixed for its whole lifetime.
    pub(crate) fn context(element: &Rc<VElement>, ctx: &RenderContext) -> Result<Rc<Self>, BoxError> {
        let user_context = ctx.user_context().merged(&element.props);
        Self::build(ComponentType::of::<Provider>(), element, ctx, user_context)
    }

    fn build(
        kind: ComponentType,
        element: &Rc<VElement>,
        ctx: &RenderContext,
        user_context: UserContext,
    ) -> Result<Rc<Self>, BoxError> {
        let defaults = kind.default_props();
        let object = kind.construct(&defaults.merged(&element.props), &element.children, &user_context)?;
        let catches_errors = object.catches_errors();

        let props = observable(element.props.clone());
        let children = observable_with(
            element.children.clone(),
            ObservableOptions::with_equality(Children::ptr_eq),
        );
        let inputs = {
            let (props, children) = (props.clone(), children.clone());
            computed(move || Inputs {
                props: defaults.merged(&props.get()),
                children: children.get(),
            })
        };

        Ok(Rc::new_cyclic(|this: &Weak<Self>| {
            let mut content_ctx = ctx.nested().with_user_context(user_context.clone());
            if catches_errors {
                content_ctx = content_ctx
                    .with_error_handler(boundary(this.clone(), ctx.error_handler().clone()));
            }
            let weak = this.clone();
            let listener = Listener::new(move || match weak.upgrade() {
                Some(component) => component
                    .rerender()
                    .map_err(|err| Box::new(err) as ListenerError),
                None => Ok(()),
            });
            Self {
                kind,
                element: RefCell::new(Rc::clone(element)),
                props,
                children,
                inputs,
                object: RefCell::new(object),
                user_context,
                priority: ctx.priority(),
                content_ctx,
                vdom: RefCell::new(None),
                dependencies: RefCell::new(Dependencies::new()),
                listener,
                phase: Cell::new(Phase::Created),
            }
        }))
    }

    pub fn kind(&self) -> ComponentType {
        self.kind
    }

    pub fn user_context(&self) -> &UserContext {
        &self.user_context
    }

    pub fn is_mounted(&self) -> bool {
        self.phase.get() == Phase::Mounted
    }

    /// Number of reactive cells this component is currently subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.borrow().len()
    }

    pub(crate) fn key(&self) -> Option<Rc<str>> {
        self.element.borrow().props.key()
    }

    pub fn dom_nodes(&self) -> Vec<NodeId> {
        self.vdom
            .borrow()
            .as_ref()
            .map(Vdom::dom_nodes)
            .unwrap_or_default()
    }

    pub(crate) fn anchor(&self) -> Option<NodeId> {
        self.vdom.borrow().as_ref().and_then(Vdom::anchor)
    }

    pub(crate) fn insert_before(&self, parent: NodeId, reference: Option<NodeId>) -> Result<(), ViewError> {
        match self.vdom.borrow().as_ref() {
            Some(vdom) => vdom.insert_before(parent, reference),
            None => Ok(()),
        }
    }

    fn with_object<R>(
        &self,
        f: impl FnOnce(&mut dyn Component) -> Result<R, BoxError>,
    ) -> Result<R, BoxError> {
        match self.object.try_borrow_mut() {
            Ok(mut object) => f(&mut **object),
            Err(_) => Err(format!("{} re-entered while busy", self.kind.name()).into()),
        }
    }

    fn lifecycle_error(&self, hook: Hook, source: BoxError) -> ViewError {
        ViewError::Lifecycle {
            component: self.kind.name(),
            hook,
            source,
        }
    }

    /// Runs a hook; a failure goes to the nearest boundary and, once handled,
    /// does not interrupt the surrounding operation.
    fn call_hook(
        &self,
        hook: Hook,
        f: impl FnOnce(&mut dyn Component) -> Result<(), BoxError>,
    ) -> Result<(), ViewError> {
        match self.with_object(f) {
            Ok(()) => Ok(()),
            Err(source) => self.content_ctx.handle_error(self.lifecycle_error(hook, source)),
        }
    }

    /// Renders under dependency tracking. A failed render is reported and
    /// yields nothing; subscriptions only follow successful renders.
    fn render(&self) -> Result<VNode, ViewError> {
        let (result, dependencies) = track(|| {
            self.inputs.with(|inputs| {
                self.with_object(|object| {
                    object.render(&inputs.props, &inputs.children, &self.user_context)
                })
            })
        });
        match result {
            Ok(tree) => {
                self.resubscribe(dependencies);
                Ok(tree)
            }
            Err(source) => {
                self.content_ctx.handle_error(ViewError::Render {
                    component: self.kind.name(),
                    source,
                })?;
                Ok(VNode::Null)
            }
        }
    }

    fn resubscribe(&self, next: Dependencies) {
        let previous = self.dependencies.replace(Dependencies::new());
        for cell in previous.difference(&next) {
            cell.unsubscribe(&self.listener);
        }
        for cell in next.difference(&previous) {
            cell.subscribe(&self.listener, self.priority);
        }
        *self.dependencies.borrow_mut() = next;
    }

    pub(crate) fn mount(&self) -> Result<(), ViewError> {
        // Props and children stay observed even while renders keep failing.
        self.inputs.subscribe(&self.listener, self.priority);
        self.dependencies.borrow_mut().insert(self.inputs.cell());

        let tree = match self.with_object(|object| object.will_mount()) {
            Ok(()) => {
                canopy_state::flush().map_err(ViewError::from_listener)?;
                self.render()?
            }
            Err(source) => {
                self.content_ctx
                    .handle_error(self.lifecycle_error(Hook::WillMount, source))?;
                VNode::Null
            }
        };
        let mut vdom = reconcile::create(&tree, &self.content_ctx)?;
        vdom.mount()?;
        *self.vdom.borrow_mut() = Some(vdom);
        Ok(())
    }

    pub(crate) fn flush(&self) -> Result<(), ViewError> {
        if let Some(vdom) = self.vdom.borrow_mut().as_mut() {
            vdom.flush()?;
        }
        let stale = self.phase.replace(Phase::Mounted) == Phase::Stale;
        self.call_hook(Hook::DidMount, |object| object.did_mount())?;
        self.call_hook(Hook::DidRender, |object| object.did_render())?;
        if stale {
            self.rerender()?;
        }
        Ok(())
    }

    pub(crate) fn update(&self, element: &Rc<VElement>) -> Result<(), ViewError> {
        *self.element.borrow_mut() = Rc::clone(element);
        self.props.set(element.props.clone());
        self.children.set(element.children.clone());
        canopy_state::flush().map_err(ViewError::from_listener)
    }

    fn rerender(&self) -> Result<(), ViewError> {
        match self.phase.get() {
            Phase::Mounted => {}
            Phase::Created | Phase::Stale => {
                self.phase.set(Phase::Stale);
                return Ok(());
            }
            Phase::Unmounted => {
                log::warn!("{}: ignoring notification after unmount", self.kind.name());
                return Ok(());
            }
        }
        let tree = self.render()?;
        {
            let Ok(mut slot) = self.vdom.try_borrow_mut() else {
                log::warn!("{}: skipping re-entrant render", self.kind.name());
                return Ok(());
            };
            if let Some(vdom) = slot.as_mut() {
                reconcile::update(&tree, vdom, &self.content_ctx)?;
            }
        }
        self.call_hook(Hook::DidUpdate, |object| object.did_update())?;
        self.call_hook(Hook::DidRender, |object| object.did_render())
    }

    /// Releases every subscription and tears down the rendered content even
    /// when a hook fails; the first error is returned afterwards.
    pub(crate) fn unmount(&self) -> Result<(), ViewError> {
        let dependencies = self.dependencies.replace(Dependencies::new());
        for cell in dependencies.iter() {
            cell.unsubscribe(&self.listener);
        }
        self.phase.set(Phase::Unmounted);
        let hook = self.call_hook(Hook::WillUnmount, |object| object.will_unmount());
        let vdom = self.vdom.borrow_mut().take();
        let teardown = match vdom {
            Some(mut vdom) => vdom.unmount(),
            None => Ok(()),
        };
        hook.and(teardown)
    }
}

use std::fmt;
use std::rc::Rc;

use canopy_state::Priority;

use crate::component::UserContext;
use crate::error::ViewError;
use crate::platform::{Host, Namespace};

/// Receives errors raised below the point where it was installed.
///
/// Returning `Err` hands the error to the caller of the current operation.
#[derive(Clone)]
pub struct ErrorHandler(Rc<dyn Fn(ViewError) -> Result<(), ViewError>>);

impl ErrorHandler {
    pub fn new(f: impl Fn(ViewError) -> Result<(), ViewError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn rethrow() -> Self {
        Self::new(Err)
    }

    pub fn handle(&self, error: ViewError) -> Result<(), ViewError> {
        (self.0)(error)
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorHandler")
    }
}

/// Everything a subtree is created with. Derived, never mutated, when a
/// subtree changes one of its parts.
#[derive(Clone, Debug)]
pub struct RenderContext {
    host: Host,
    user_context: UserContext,
    error_handler: ErrorHandler,
    namespace: Namespace,
    priority: Priority,
}

impl RenderContext {
    pub fn root(host: Host, user_context: UserContext) -> Self {
        Self {
            host,
            user_context,
            error_handler: ErrorHandler::rethrow(),
            namespace: Namespace::Html,
            priority: 0,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn user_context(&self) -> &UserContext {
        &self.user_context
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn handle_error(&self, error: ViewError) -> Result<(), ViewError> {
        self.error_handler.handle(error)
    }

    pub(crate) fn error_handler(&self) -> &ErrorHandler {
        &self.error_handler
    }

    pub fn with_namespace(&self, namespace: Namespace) -> Self {
        Self {
            namespace,
            ..self.clone()
        }
    }

    pub fn with_user_context(&self, user_context: UserContext) -> Self {
        Self {
            user_context,
            ..self.clone()
        }
    }

    pub fn with_error_handler(&self, error_handler: ErrorHandler) -> Self {
        Self {
            error_handler,
            ..self.clone()
        }
    }

    /// Context for the content of a component one level deeper.
    pub fn nested(&self) -> Self {
        Self {
            priority: self.priority + 1,
            ..self.clone()
        }
    }
}

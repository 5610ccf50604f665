use std::fmt;

use canopy_state::ListenerError;

use crate::platform::NodeId;

/// Error type returned by user component code.
pub type BoxError = Box<dyn std::error::Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomError {
    Missing { node: NodeId },
    Detached { node: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::Missing { node } => write!(f, "node {node} missing"),
            DomError::Detached { node } => write!(f, "node {node} is not attached where expected"),
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    WillMount,
    DidMount,
    DidUpdate,
    DidRender,
    WillUnmount,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::WillMount => "will_mount",
            Hook::DidMount => "did_mount",
            Hook::DidUpdate => "did_update",
            Hook::DidRender => "did_render",
            Hook::WillUnmount => "will_unmount",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum ViewError {
    Construction {
        component: &'static str,
        source: BoxError,
    },
    Render {
        component: &'static str,
        source: BoxError,
    },
    Lifecycle {
        component: &'static str,
        hook: Hook,
        source: BoxError,
    },
    Dom(DomError),
    /// A reactive listener outside the reconciler failed during a flush.
    Reactive(BoxError),
    /// The tree in `container` is borrowed by a running `with_root` callback.
    RootBusy { container: NodeId },
}

impl ViewError {
    pub fn component(&self) -> Option<&'static str> {
        match self {
            ViewError::Construction { component, .. }
            | ViewError::Render { component, .. }
            | ViewError::Lifecycle { component, .. } => Some(component),
            ViewError::Dom(_) | ViewError::Reactive(_) | ViewError::RootBusy { .. } => None,
        }
    }

    pub fn from_listener(error: ListenerError) -> Self {
        match error.downcast::<ViewError>() {
            Ok(view) => *view,
            Err(other) => ViewError::Reactive(other),
        }
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Construction { component, source } => {
                write!(f, "failed to construct {component}: {source}")
            }
            ViewError::Render { component, source } => {
                write!(f, "{component} failed to render: {source}")
            }
            ViewError::Lifecycle {
                component,
                hook,
                source,
            } => write!(f, "{component}::{hook} failed: {source}"),
            ViewError::Dom(err) => write!(f, "platform error: {err}"),
            ViewError::Reactive(source) => write!(f, "reactive listener failed: {source}"),
            ViewError::RootBusy { container } => {
                write!(f, "root in container {container} is in use")
            }
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewError::Construction { source, .. }
            | ViewError::Render { source, .. }
            | ViewError::Lifecycle { source, .. }
            | ViewError::Reactive(source) => Some(source.as_ref()),
            ViewError::Dom(err) => Some(err),
            ViewError::RootBusy { .. } => None,
        }
    }
}

impl From<DomError> for ViewError {
    fn from(err: DomError) -> Self {
        ViewError::Dom(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn listener_errors_round_trip_into_view_errors() {
        let boxed: ListenerError = Box::new(ViewError::Dom(DomError::Missing { node: 4 }));
        match ViewError::from_listener(boxed) {
            ViewError::Dom(DomError::Missing { node }) => assert_eq!(node, 4),
            other => panic!("unexpected {other:?}"),
        }

        let foreign: ListenerError = "plain failure".into();
        let wrapped = ViewError::from_listener(foreign);
        assert!(matches!(wrapped, ViewError::Reactive(_)));
        assert_eq!(wrapped.to_string(), "reactive listener failed: plain failure");
    }

    #[test]
    fn lifecycle_error_names_component_and_hook() {
        let err = ViewError::Lifecycle {
            component: "Clock",
            hook: Hook::DidMount,
            source: "no timer".into(),
        };
        assert_eq!(err.to_string(), "Clock::did_mount failed: no timer");
        assert_eq!(err.component(), Some("Clock"));
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("no timer"));
    }
}

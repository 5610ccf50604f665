//! Testing utilities and harness for Canopy

pub mod lifecycle;
pub mod root;
pub mod strategies;

pub use lifecycle::{Boundary, LifecycleLog, Probe};
pub use root::{run_test_root, TestRoot, TestTree};
pub use strategies::{tree, PropSpec, TreeSpec, Wrapper};

pub mod prelude {
    pub use crate::lifecycle::*;
    pub use crate::root::*;
    pub use crate::strategies::*;
}

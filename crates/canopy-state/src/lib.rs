#![doc = r"Observable cells, computed cells and priority-ordered notification flush for Canopy."]

mod cell;
mod collections;
mod computed;
mod observable;
mod runtime;
mod tracking;

pub use cell::{
    CellId, CellRef, Dependencies, Listener, ListenerError, ListenerId, ListenerResult, Priority,
};
pub use computed::{computed, Computed};
pub use observable::{observable, observable_with, Observable, ObservableOptions};
pub use runtime::{flush, has_pending, is_flushing};
pub use tracking::{track, untracked};

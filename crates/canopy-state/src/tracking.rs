use std::cell::RefCell;
use std::thread_local;

use crate::cell::{CellRef, Dependencies};

thread_local! {
    // `None` frames come from `untracked` and swallow reads.
    static FRAMES: RefCell<Vec<Option<Dependencies>>> = RefCell::new(Vec::new()); // FUTURE(no_std): replace Vec with fixed-capacity stack storage.
}

pub(crate) fn record_read(cell: impl FnOnce() -> CellRef) {
    FRAMES.with(|frames| {
        if let Some(Some(frame)) = frames.borrow_mut().last_mut() {
            frame.insert(cell());
        }
    });
}

/// Runs `f` and returns its result together with every cell it read.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Dependencies) {
    FRAMES.with(|frames| frames.borrow_mut().push(Some(Dependencies::new())));
    let result = f();
    let dependencies = FRAMES
        .with(|frames| frames.borrow_mut().pop())
        .flatten()
        .unwrap_or_default();
    (result, dependencies)
}

/// Runs `f` without recording its reads into the enclosing [`track`] call.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    FRAMES.with(|frames| frames.borrow_mut().push(None));
    let result = f();
    FRAMES.with(|frames| {
        frames.borrow_mut().pop();
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable;

    #[test]
    fn track_records_each_cell_once_in_read_order() {
        let first = observable(1);
        let second = observable(2);

        let (sum, deps) = track(|| second.get() + first.get() + second.get());

        assert_eq!(sum, 5);
        assert_eq!(deps.len(), 2);
        let ids: Vec<_> = deps.ids().collect();
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[test]
    fn nested_track_does_not_leak_into_outer_frame() {
        let outer = observable("outer");
        let inner = observable("inner");

        let (inner_deps, outer_deps) = track(|| {
            outer.get();
            let (_, deps) = track(|| inner.get());
            deps
        });

        assert!(inner_deps.contains(inner.id()));
        assert!(!inner_deps.contains(outer.id()));
        assert!(outer_deps.contains(outer.id()));
        assert!(!outer_deps.contains(inner.id()));
    }

    #[test]
    fn untracked_reads_are_not_recorded() {
        let cell = observable(0);

        let (_, deps) = track(|| untracked(|| cell.get()));

        assert!(deps.is_empty());
    }

    #[test]
    fn reads_outside_track_are_ignored() {
        let cell = observable(3);
        assert_eq!(cell.get(), 3);
        let (_, deps) = track(|| ());
        assert!(deps.is_empty());
    }
}

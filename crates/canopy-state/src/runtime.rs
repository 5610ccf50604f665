use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::thread_local;

use crate::cell::{Listener, ListenerId, ListenerResult, Priority};
use crate::collections::map::HashSet;

#[derive(Default)]
struct Scheduler {
    queue: RefCell<BTreeMap<(Priority, u64), Listener>>,
    queued: RefCell<HashSet<ListenerId>>, // FUTURE(no_std): replace HashSet with sparse bitset.
    sequence: Cell<u64>,
    flushing: Cell<bool>,
}

thread_local! {
    static SCHEDULER: Scheduler = Scheduler::default();
}

pub(crate) fn schedule(listener: Listener, priority: Priority) {
    SCHEDULER.with(|scheduler| {
        if !scheduler.queued.borrow_mut().insert(listener.id()) {
            return;
        }
        let sequence = scheduler.sequence.get();
        scheduler.sequence.set(sequence.wrapping_add(1));
        scheduler
            .queue
            .borrow_mut()
            .insert((priority, sequence), listener);
    });
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        SCHEDULER.with(|scheduler| scheduler.flushing.set(false));
    }
}

fn pop_next() -> Option<(Priority, Listener)> {
    SCHEDULER.with(|scheduler| {
        let ((priority, _), listener) = scheduler.queue.borrow_mut().pop_first()?;
        scheduler.queued.borrow_mut().remove(&listener.id());
        Some((priority, listener))
    })
}

/// Delivers every pending notification, lowest priority first.
///
/// Listeners scheduled while flushing run in the same pass. A nested call
/// returns immediately and leaves the work to the outer flush. The first
/// listener error is returned once the queue is drained; later ones are logged.
pub fn flush() -> ListenerResult {
    if SCHEDULER.with(|scheduler| scheduler.flushing.replace(true)) {
        return Ok(());
    }
    let _guard = FlushGuard;

    let mut first_error = None;
    while let Some((priority, listener)) = pop_next() {
        log::trace!("flush: {:?} at priority {}", listener.id(), priority);
        if let Err(err) = listener.call() {
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                log::error!("listener {:?} failed during flush: {}", listener.id(), err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn has_pending() -> bool {
    SCHEDULER.with(|scheduler| !scheduler.queue.borrow().is_empty())
}

pub fn is_flushing() -> bool {
    SCHEDULER.with(|scheduler| scheduler.flushing.get())
}

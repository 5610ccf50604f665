use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::cell::{CellId, CellRef, Dependencies, Dependent, Listener, Priority, Source, Subscribers};
use crate::tracking::{record_read, track};

struct ComputedInner<T: 'static> {
    id: CellId,
    compute: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    sources: RefCell<Dependencies>,
    subscribers: Subscribers,
    this: Weak<ComputedInner<T>>,
}

impl<T: 'static> ComputedInner<T> {
    fn refresh(&self) {
        if !self.dirty.get() {
            return;
        }
        let (value, sources) = track(|| (self.compute)());

        let previous = self.sources.replace(Dependencies::new());
        for stale in previous.difference(&sources) {
            stale.remove_dependent(self.id);
        }
        for fresh in sources.difference(&previous) {
            let this: Weak<dyn Dependent> = self.this.clone();
            fresh.add_dependent(self.id, this);
        }
        *self.sources.borrow_mut() = sources;
        *self.value.borrow_mut() = Some(value);
        self.dirty.set(false);
    }
}

impl<T: 'static> Dependent for ComputedInner<T> {
    fn invalidate(&self) {
        self.dirty.set(true);
        self.subscribers.notify();
    }
}

impl<T: 'static> Source for ComputedInner<T> {
    fn id(&self) -> CellId {
        self.id
    }

    fn label(&self) -> Option<&'static str> {
        None
    }

    fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }
}

impl<T: 'static> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        for source in self.sources.borrow().iter() {
            source.remove_dependent(self.id);
        }
    }
}

/// Read-only cell derived from other cells.
///
/// The value is computed lazily on first read and cached until one of the
/// cells read by the last computation changes.
pub struct Computed<T: 'static> {
    inner: Rc<ComputedInner<T>>,
}

pub fn computed<T: 'static>(compute: impl Fn() -> T + 'static) -> Computed<T> {
    Computed {
        inner: Rc::new_cyclic(|this| ComputedInner {
            id: CellId::next(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            dirty: Cell::new(true),
            sources: RefCell::new(Dependencies::new()),
            subscribers: Subscribers::default(),
            this: this.clone(),
        }),
    }
}

impl<T: 'static> Computed<T> {
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    pub fn cell(&self) -> CellRef {
        let source: Rc<dyn Source> = self.inner.clone();
        CellRef::new(source)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        record_read(|| self.cell());
        self.inner.refresh();
        let value = self.inner.value.borrow();
        f(value.as_ref().expect("computed value is present after refresh"))
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    pub fn subscribe(&self, listener: &Listener, priority: Priority) {
        self.inner.subscribers.subscribe(listener, priority);
    }

    pub fn unsubscribe(&self, listener: &Listener) {
        self.inner.subscribers.unsubscribe(listener);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + 'static> Computed<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: 'static> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("dirty", &self.inner.dirty.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flush, observable};
    use proptest::prelude::*;

    #[test]
    fn computes_lazily_and_caches() {
        let runs = Rc::new(Cell::new(0));
        let base = observable(2);
        let doubled = {
            let runs = Rc::clone(&runs);
            let base = base.clone();
            computed(move || {
                runs.set(runs.get() + 1);
                base.get() * 2
            })
        };

        assert_eq!(runs.get(), 0);
        assert_eq!(doubled.get(), 4);
        assert_eq!(doubled.get(), 4);
        assert_eq!(runs.get(), 1);

        base.set(5);
        assert!(doubled.is_dirty());
        assert_eq!(doubled.get(), 10);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn source_change_notifies_computed_subscribers() {
        let calls = Rc::new(Cell::new(0));
        let base = observable("a".to_string());
        let upper = {
            let base = base.clone();
            computed(move || base.get().to_uppercase())
        };
        let seen = Rc::clone(&calls);
        upper.subscribe(
            &Listener::new(move || {
                seen.set(seen.get() + 1);
                Ok(())
            }),
            0,
        );
        assert_eq!(upper.get(), "A");

        base.set("b".to_string());
        flush().expect("flush");

        assert_eq!(calls.get(), 1);
        assert_eq!(upper.get(), "B");
    }

    #[test]
    fn stale_sources_are_dropped_after_recompute() {
        let use_left = observable(true);
        let left = observable(1);
        let right = observable(2);
        let picked = {
            let (use_left, left, right) = (use_left.clone(), left.clone(), right.clone());
            computed(move || if use_left.get() { left.get() } else { right.get() })
        };
        assert_eq!(picked.get(), 1);

        use_left.set(false);
        assert_eq!(picked.get(), 2);
        assert!(!picked.is_dirty());

        left.set(100);
        assert!(!picked.is_dirty());
        right.set(3);
        assert!(picked.is_dirty());
        assert_eq!(picked.get(), 3);
    }

    #[test]
    fn reading_a_computed_tracks_the_computed_itself() {
        let base = observable(1);
        let derived = {
            let base = base.clone();
            computed(move || base.get() + 1)
        };

        let (_, deps) = crate::track(|| derived.get());

        assert!(deps.contains(derived.id()));
        assert!(!deps.contains(base.id()));
    }

    #[test]
    fn chained_computed_invalidates_transitively() {
        let base = observable(1);
        let plus_one = {
            let base = base.clone();
            computed(move || base.get() + 1)
        };
        let times_ten = {
            let plus_one = plus_one.clone();
            computed(move || plus_one.get() * 10)
        };
        assert_eq!(times_ten.get(), 20);

        base.set(4);

        assert!(times_ten.is_dirty());
        assert_eq!(times_ten.get(), 50);
    }

    proptest! {
        #[test]
        fn only_sources_of_the_last_compute_invalidate(
            writes in prop::collection::vec((0u8..3, -5i32..5), 1..32),
        ) {
            let use_left = observable(true);
            let left = observable(0);
            let right = observable(0);
            let picked = {
                let (use_left, left, right) = (use_left.clone(), left.clone(), right.clone());
                computed(move || if use_left.get() { left.get() } else { right.get() })
            };
            picked.get();

            for (target, value) in writes {
                let reading_left = use_left.peek();
                let changed = match target {
                    0 => {
                        let next = value >= 0;
                        let changed = next != reading_left;
                        use_left.set(next);
                        changed
                    }
                    1 => {
                        let changed = value != left.peek();
                        left.set(value);
                        changed && reading_left
                    }
                    _ => {
                        let changed = value != right.peek();
                        right.set(value);
                        changed && !reading_left
                    }
                };
                prop_assert_eq!(picked.is_dirty(), changed);

                let expected = if use_left.peek() { left.peek() } else { right.peek() };
                prop_assert_eq!(picked.get(), expected);
                prop_assert!(!picked.is_dirty());
            }
        }
    }
}

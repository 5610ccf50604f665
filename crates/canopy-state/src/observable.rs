use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::cell::{CellId, CellRef, Listener, Priority, Source, Subscribers};
use crate::tracking::record_read;

pub struct ObservableOptions<T> {
    /// Writes for which `equal(current, next)` holds are dropped without notifying.
    pub equal: fn(&T, &T) -> bool,
    pub label: Option<&'static str>,
}

impl<T> ObservableOptions<T> {
    pub fn with_equality(equal: fn(&T, &T) -> bool) -> Self {
        Self { equal, label: None }
    }

    /// Every write notifies, even when the value is unchanged.
    pub fn always_notify() -> Self {
        Self::with_equality(|_, _| false)
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}

impl<T: PartialEq> Default for ObservableOptions<T> {
    fn default() -> Self {
        Self::with_equality(<T as PartialEq>::eq)
    }
}

struct ObservableInner<T> {
    id: CellId,
    label: Option<&'static str>,
    value: RefCell<T>,
    equal: fn(&T, &T) -> bool,
    subscribers: Subscribers,
}

impl<T: 'static> Source for ObservableInner<T> {
    fn id(&self) -> CellId {
        self.id
    }

    fn label(&self) -> Option<&'static str> {
        self.label
    }

    fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }
}

/// Writable reactive cell.
pub struct Observable<T: 'static> {
    inner: Rc<ObservableInner<T>>, // FUTURE(no_std): replace Rc with arena-managed state handles.
}

pub fn observable<T: PartialEq + 'static>(initial: T) -> Observable<T> {
    observable_with(initial, ObservableOptions::default())
}

pub fn observable_with<T: 'static>(initial: T, options: ObservableOptions<T>) -> Observable<T> {
    Observable {
        inner: Rc::new(ObservableInner {
            id: CellId::next(),
            label: options.label,
            value: RefCell::new(initial),
            equal: options.equal,
            subscribers: Subscribers::default(),
        }),
    }
}

impl<T: 'static> Observable<T> {
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    pub fn cell(&self) -> CellRef {
        let source: Rc<dyn Source> = self.inner.clone();
        CellRef::new(source)
    }

    /// Tracked borrow. `f` must not write to this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        record_read(|| self.cell());
        f(&self.inner.value.borrow())
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn set(&self, value: T) {
        let changed = {
            let current = self.inner.value.borrow();
            !(self.inner.equal)(&current, &value)
        };
        if changed {
            *self.inner.value.borrow_mut() = value;
            self.inner.subscribers.notify();
        }
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value)
        };
        self.inner.subscribers.notify();
        result
    }

    pub fn subscribe(&self, listener: &Listener, priority: Priority) {
        self.inner.subscribers.subscribe(listener, priority);
    }

    pub fn unsubscribe(&self, listener: &Listener) {
        self.inner.subscribers.unsubscribe(listener);
    }

    pub fn is_subscribed(&self, listener: &Listener) -> bool {
        self.inner.subscribers.contains(listener)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn peek(&self) -> T {
        self.with_untracked(T::clone)
    }
}

impl<T: 'static> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> PartialEq for Observable<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: 'static> Eq for Observable<T> {}

impl<T: fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("label", &self.inner.label)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{flush, has_pending};
    use std::cell::Cell;

    fn counting_listener() -> (Listener, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let listener = Listener::new(move || {
            seen.set(seen.get() + 1);
            Ok(())
        });
        (listener, calls)
    }

    #[test]
    fn equal_writes_do_not_notify() {
        let cell = observable(String::from("Hello"));
        let (listener, calls) = counting_listener();
        cell.subscribe(&listener, 0);

        cell.set(String::from("Hello"));
        assert!(!has_pending());

        cell.set(String::from("Hello world"));
        flush().expect("flush");
        assert_eq!(calls.get(), 1);
        assert_eq!(cell.peek(), "Hello world");
    }

    #[test]
    fn custom_equality_controls_notification() {
        let cell = observable_with(1.0_f64, ObservableOptions::always_notify().label("ratio"));
        let (listener, calls) = counting_listener();
        cell.subscribe(&listener, 0);

        cell.set(1.0);
        flush().expect("flush");

        assert_eq!(calls.get(), 1);
        assert_eq!(cell.cell().label(), Some("ratio"));
    }

    #[test]
    fn update_always_notifies() {
        let cell = observable(vec![1, 2]);
        let (listener, calls) = counting_listener();
        cell.subscribe(&listener, 0);

        cell.update(|items| items.push(3));
        flush().expect("flush");

        assert_eq!(calls.get(), 1);
        assert_eq!(cell.peek(), vec![1, 2, 3]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let cell = observable(0);
        let (listener, calls) = counting_listener();
        cell.subscribe(&listener, 0);
        assert!(cell.is_subscribed(&listener));

        cell.unsubscribe(&listener);
        cell.set(1);
        flush().expect("flush");

        assert_eq!(calls.get(), 0);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn resubscribing_keeps_a_single_entry() {
        let cell = observable(0);
        let (listener, _) = counting_listener();
        cell.subscribe(&listener, 1);
        cell.subscribe(&listener.clone(), 1);
        assert_eq!(cell.subscriber_count(), 1);
    }
}

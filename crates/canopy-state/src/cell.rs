use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::map::IndexMap;
use crate::runtime;

/// Ordering key for notifications; lower values are delivered first within one flush.
pub type Priority = usize;

pub type ListenerError = Box<dyn std::error::Error>;
pub type ListenerResult = Result<(), ListenerError>;

static NEXT_CELL_ID: AtomicUsize = AtomicUsize::new(1);
static NEXT_LISTENER_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

/// Callback invoked by [`flush`](crate::flush) after a cell it subscribed to changed.
///
/// Listeners compare by identity: clones of one listener are the same subscriber.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    callback: Rc<dyn Fn() -> ListenerResult>, // FUTURE(no_std): replace Rc with arena-managed callbacks.
}

impl Listener {
    pub fn new(callback: impl Fn() -> ListenerResult + 'static) -> Self {
        Self {
            id: ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed)),
            callback: Rc::new(callback),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn call(&self) -> ListenerResult {
        (self.callback)()
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id.0).finish()
    }
}

pub(crate) trait Dependent {
    fn invalidate(&self);
}

pub(crate) trait Source {
    fn id(&self) -> CellId;
    fn label(&self) -> Option<&'static str>;
    fn subscribers(&self) -> &Subscribers;
}

#[derive(Default)]
pub(crate) struct Subscribers {
    listeners: RefCell<IndexMap<ListenerId, (Listener, Priority)>>,
    dependents: RefCell<IndexMap<CellId, Weak<dyn Dependent>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self, listener: &Listener, priority: Priority) {
        self.listeners
            .borrow_mut()
            .insert(listener.id(), (listener.clone(), priority));
    }

    pub(crate) fn unsubscribe(&self, listener: &Listener) {
        self.listeners.borrow_mut().shift_remove(&listener.id());
    }

    pub(crate) fn contains(&self, listener: &Listener) -> bool {
        self.listeners.borrow().contains_key(&listener.id())
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub(crate) fn add_dependent(&self, id: CellId, dependent: Weak<dyn Dependent>) {
        self.dependents.borrow_mut().insert(id, dependent);
    }

    pub(crate) fn remove_dependent(&self, id: CellId) {
        self.dependents.borrow_mut().shift_remove(&id);
    }

    pub(crate) fn notify(&self) {
        let listeners: Vec<(Listener, Priority)> =
            self.listeners.borrow().values().cloned().collect();
        for (listener, priority) in listeners {
            runtime::schedule(listener, priority);
        }

        let dependents: Vec<Rc<dyn Dependent>> = {
            let mut dependents = self.dependents.borrow_mut();
            dependents.retain(|_, dependent| dependent.strong_count() > 0);
            dependents.values().filter_map(Weak::upgrade).collect()
        };
        for dependent in dependents {
            dependent.invalidate();
        }
    }
}

/// Type-erased handle to an observable or computed cell.
#[derive(Clone)]
pub struct CellRef(Rc<dyn Source>);

impl CellRef {
    pub(crate) fn new(source: Rc<dyn Source>) -> Self {
        Self(source)
    }

    pub fn id(&self) -> CellId {
        self.0.id()
    }

    pub fn label(&self) -> Option<&'static str> {
        self.0.label()
    }

    pub fn subscribe(&self, listener: &Listener, priority: Priority) {
        self.0.subscribers().subscribe(listener, priority);
    }

    pub fn unsubscribe(&self, listener: &Listener) {
        self.0.subscribers().unsubscribe(listener);
    }

    pub fn is_subscribed(&self, listener: &Listener) -> bool {
        self.0.subscribers().contains(listener)
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.subscribers().len()
    }

    pub(crate) fn add_dependent(&self, id: CellId, dependent: Weak<dyn Dependent>) {
        self.0.subscribers().add_dependent(id, dependent);
    }

    pub(crate) fn remove_dependent(&self, id: CellId) {
        self.0.subscribers().remove_dependent(id);
    }
}

impl PartialEq for CellRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for CellRef {}

impl fmt::Debug for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellRef")
            .field("id", &self.id())
            .field("label", &self.label())
            .finish()
    }
}

/// Ordered, de-duplicated set of cells read during one [`track`](crate::track) call.
#[derive(Clone, Default)]
pub struct Dependencies {
    cells: IndexMap<CellId, CellRef>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellRef) {
        self.cells.entry(cell.id()).or_insert(cell);
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellRef> + '_ {
        self.cells.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    /// Cells in `self` that are absent from `other`.
    pub fn difference<'a>(&'a self, other: &'a Dependencies) -> impl Iterator<Item = &'a CellRef> + 'a {
        self.cells
            .iter()
            .filter(move |(id, _)| !other.contains(**id))
            .map(|(_, cell)| cell)
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.cells.values()).finish()
    }
}

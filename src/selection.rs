use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::debug;

/// One selection transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionEvent {
    pub previous: Option<String>,
    pub current: Option<String>,
}

type Listener = Box<dyn FnMut(&SelectionEvent)>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
    /// Ids dropped while their listener was out for dispatch
    removed: Vec<u64>,
    /// Listeners currently moved out for dispatch
    in_flight: usize,
}

/// Single-selection state with ordered change notification.
///
/// Lives on the UI thread and is shared by `Rc`. Every `toggle` is one
/// transition, and each listener sees every transition exactly once, in the
/// order they happened. A toggle issued from inside a listener is queued
/// behind the transition currently being delivered.
#[derive(Default)]
pub struct SelectionStore {
    current: RefCell<Option<String>>,
    listeners: Rc<RefCell<Listeners>>,
    pending: RefCell<VecDeque<SelectionEvent>>,
    dispatching: Cell<bool>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected region code
    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    pub fn is_selected(&self, code: &str) -> bool {
        self.current.borrow().as_deref() == Some(code)
    }

    /// Select `code`, or clear the selection if `code` is already selected
    pub fn toggle(&self, code: &str) {
        let event = {
            let mut current = self.current.borrow_mut();
            let previous = current.take();
            let next = match previous.as_deref() {
                Some(selected) if selected == code => None,
                _ => Some(code.to_string()),
            };
            *current = next.clone();
            SelectionEvent {
                previous,
                current: next,
            }
        };
        debug!(previous = ?event.previous, current = ?event.current, "selection changed");
        self.pending.borrow_mut().push_back(event);
        self.dispatch();
    }

    /// Register a listener; it stays attached while the returned handle lives
    pub fn subscribe(&self, listener: impl FnMut(&SelectionEvent) + 'static) -> Subscription {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Box::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Attached listeners, including any out for an ongoing dispatch
    pub fn listener_count(&self) -> usize {
        let listeners = self.listeners.borrow();
        (listeners.entries.len() + listeners.in_flight).saturating_sub(listeners.removed.len())
    }

    fn dispatch(&self) {
        if self.dispatching.replace(true) {
            return;
        }

        loop {
            let Some(event) = self.pending.borrow_mut().pop_front() else {
                break;
            };

            // Listeners are moved out for the call so they may subscribe,
            // unsubscribe or toggle without a RefCell conflict
            let mut active = {
                let mut listeners = self.listeners.borrow_mut();
                let active = std::mem::take(&mut listeners.entries);
                listeners.in_flight = active.len();
                active
            };
            for (id, listener) in active.iter_mut() {
                if self.listeners.borrow().removed.contains(id) {
                    continue;
                }
                listener(&event);
            }

            let mut listeners = self.listeners.borrow_mut();
            let removed = std::mem::take(&mut listeners.removed);
            listeners.in_flight = 0;
            active.retain(|(id, _)| !removed.contains(id));
            let added = std::mem::take(&mut listeners.entries);
            active.extend(added);
            listeners.entries = active;
        }

        self.dispatching.set(false);
    }
}

/// Handle for an attached listener; dropping it detaches the listener
#[must_use = "dropping a Subscription detaches its listener"]
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        let mut listeners = listeners.borrow_mut();
        let before = listeners.entries.len();
        let id = self.id;
        listeners.entries.retain(|(entry, _)| *entry != id);
        if listeners.entries.len() == before {
            listeners.removed.push(id);
        }
    }
}

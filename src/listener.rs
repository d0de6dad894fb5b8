//!
//! Registry for screen-wide listeners.
//!
//! Some widgets need to see events outside their own area for a
//! while. A click-out detector while its popup is open, a drag
//! that continues outside the track. Such a widget acquires a
//! [ListenerGuard] from the shared [Listeners] when it starts
//! listening and drops it when it's done. Dropping the widget
//! state drops the guard too, so nothing stays registered.
//!
//! The registry itself doesn't dispatch events, the event loop
//! still hands every event to every widget. It is the record of
//! who is currently listening, and the check that nobody leaks.
//!
use log::debug;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: u64,
    active: Vec<(u64, &'static str)>,
}

/// Shared registry. Clones share the same registry.
#[derive(Debug, Default, Clone)]
pub struct Listeners {
    table: Rc<RefCell<ListenerTable>>,
}

/// Registration in [Listeners]. Removes itself when dropped.
pub struct ListenerGuard {
    table: Weak<RefCell<ListenerTable>>,
    id: u64,
    kind: &'static str,
}

/// Start value of a drag plus the listener for the rest of the drag.
///
/// Keep it in an `Option` and `take()` it on mouse-up.
#[derive(Debug)]
pub struct Drag<T> {
    pub start: T,
    _guard: ListenerGuard,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn attach(&self, kind: &'static str) -> ListenerGuard {
        let mut table = self.table.borrow_mut();
        table.next_id += 1;
        let id = table.next_id;
        table.active.push((id, kind));
        debug!("attach listener {} {}", kind, id);
        ListenerGuard {
            table: Rc::downgrade(&self.table),
            id,
            kind,
        }
    }

    /// Start a drag.
    pub fn drag<T>(&self, kind: &'static str, start: T) -> Drag<T> {
        Drag {
            start,
            _guard: self.attach(kind),
        }
    }

    /// Number of active listeners.
    pub fn len(&self) -> usize {
        self.table.borrow().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kinds of the active listeners.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.table.borrow().active.iter().map(|v| v.1).collect()
    }
}

impl ListenerGuard {
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl Debug for ListenerGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.borrow_mut().active.retain(|v| v.0 != self.id);
            debug!("detach listener {} {}", self.kind, self.id);
        }
    }
}

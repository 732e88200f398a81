/// Copy-on-write listener registry.
///
/// Every registration or removal publishes a new immutable `Vec`; dispatch
/// iterates whatever snapshot was current when it started. Listeners added
/// mid-dispatch therefore miss the in-flight event, and removing one
/// mid-dispatch never disturbs the iteration.
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

pub struct ListenerSet<L: ?Sized> {
    snap: ArcSwap<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub fn new() -> Self {
        Self {
            snap: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Appends a listener. Registering the same `Arc` twice delivers twice.
    pub fn add(&self, listener: Arc<L>) {
        self.update(|listeners| {
            listeners.push(Arc::clone(&listener));
            true
        });
    }

    /// Removes the first registration of `listener` (compared by pointer).
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, listener: &Arc<L>) -> bool {
        self.update(|listeners| {
            match listeners.iter().position(|l| Arc::ptr_eq(l, listener)) {
                Some(index) => {
                    listeners.remove(index);
                    true
                }
                None => false,
            }
        })
    }

    /// Current listeners, in registration order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<L>>> {
        self.snap.load_full()
    }

    /// Calls `f` for each listener of the current snapshot.
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snap = self.snapshot();
        for listener in snap.iter() {
            f(listener);
        }
    }

    pub fn len(&self) -> usize {
        self.snap.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snap.load().is_empty()
    }

    /// Clone-modify-swap loop. `edit` returns false to skip publishing.
    fn update(&self, mut edit: impl FnMut(&mut Vec<Arc<L>>) -> bool) -> bool {
        loop {
            let cur = self.snap.load_full();
            let mut next = Vec::clone(&cur);
            if !edit(&mut next) {
                return false;
            }

            let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
            if Arc::ptr_eq(&prev, &cur) {
                return true;
            }
        }
    }
}

impl<L: ?Sized> Default for ListenerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ?Sized> fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.len())
            .finish()
    }
}

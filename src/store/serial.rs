use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::warn;

/// Work queued by a re-entrant caller, run before the lock is released.
pub(crate) type Deferred = Box<dyn FnOnce() + Send>;

static NEXT_SERIAL_ID: AtomicUsize = AtomicUsize::new(0);

// Serial sections currently held by this thread, innermost last.
thread_local! {
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    static RETIRED: RefCell<Vec<Box<dyn Any>>> = const { RefCell::new(Vec::new()) };
}

/// Drop `value` once this thread has left every serial section.
///
/// Dropping a subscription can join a queue worker that is itself waiting
/// to enter the section, so nothing is released while one is held.
pub(crate) fn retire<T: 'static>(value: T) {
    if HELD.with(|held| held.borrow().is_empty()) {
        drop(value);
    } else {
        RETIRED.with(|retired| retired.borrow_mut().push(Box::new(value)));
    }
}

// Releases retired values when the outermost section on this thread ends.
struct ReleaseRetired;

impl Drop for ReleaseRetired {
    fn drop(&mut self) {
        if !HELD.with(|held| held.borrow().is_empty()) {
            return;
        }
        let retired = RETIRED.with(|retired| std::mem::take(&mut *retired.borrow_mut()));
        drop(retired);
    }
}

/// The store-wide critical section around "apply reducer + notify".
///
/// A thread already inside the section must not lock it again: it defers
/// work instead, and the outermost holder drains that work in FIFO order
/// before unlocking.
pub(crate) struct Serial {
    id: usize,
    lock: Mutex<()>,
    deferred: Mutex<VecDeque<Deferred>>,
}

struct Held<'a> {
    id: usize,
    deferred: &'a Mutex<VecDeque<Deferred>>,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for Held<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            // Queued work belongs to the transition that failed.
            let mut deferred = self.deferred.lock().unwrap_or_else(PoisonError::into_inner);
            let discarded = std::mem::take(&mut *deferred);
            drop(deferred);
            if !discarded.is_empty() {
                warn!(
                    target: "unistore::store",
                    discarded = discarded.len(),
                    "Discarding deferred actions after a panic"
                );
            }
            retire(discarded);
        }
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|id| *id == self.id) {
                held.remove(pos);
            }
        });
    }
}

impl Serial {
    pub(crate) fn new() -> Self {
        Self {
            id: NEXT_SERIAL_ID.fetch_add(1, Ordering::Relaxed),
            lock: Mutex::new(()),
            deferred: Mutex::new(VecDeque::new()),
        }
    }

    /// Whether the calling thread is inside this section.
    pub(crate) fn is_held_here(&self) -> bool {
        HELD.with(|held| held.borrow().contains(&self.id))
    }

    /// Run `f` inside the section, then everything deferred meanwhile.
    ///
    /// If `f` or a deferred job panics, the remaining deferred jobs are
    /// discarded. Must not be called by a thread for which `is_held_here` is true.
    /// Values retired meanwhile are dropped after the lock is released.
    pub(crate) fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _release = ReleaseRetired;
        let _held = self.enter();
        let result = f();
        while let Some(job) = self.pop_deferred() {
            job();
        }
        result
    }

    /// Queue work for the thread currently inside the section.
    pub(crate) fn defer(&self, job: Deferred) {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(job);
    }

    fn enter(&self) -> Held<'_> {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        HELD.with(|held| held.borrow_mut().push(self.id));
        Held {
            id: self.id,
            deferred: &self.deferred,
            _guard: guard,
        }
    }

    fn pop_deferred(&self) -> Option<Deferred> {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

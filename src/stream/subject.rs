//! Replay-latest subject: a value cell that notifies subscribers on write.
//!
//! Snapshot-on-emit semantics, as with any listener list:
//!   - A subscriber removed *during* notification is still called in that round.
//!   - A subscriber added *during* notification is NOT called until the next write
//!     (it does receive the replayed value when it subscribes).
//!
//! No lock is held while a subscriber runs, so subscribers may read the
//! subject, write other subjects, subscribe or unsubscribe.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use super::observable::{Callback, Observable, Source, Subscription};

type ListenerId = u64;

struct SubjectInner<T> {
    value: RwLock<T>,
    listeners: Mutex<Vec<(ListenerId, Arc<Callback<T>>)>>,
    next_id: AtomicU64,
}

impl<T: Clone + Send + Sync + 'static> SubjectInner<T> {
    fn snapshot(&self) -> Vec<Arc<Callback<T>>> {
        let guard = self.listeners.lock();
        guard.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    fn remove(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }
}

impl<T: Clone + Send + Sync + 'static> Source<T> for SubjectInner<T> {
    fn subscribe(self: Arc<Self>, sink: Arc<Callback<T>>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push((id, Arc::clone(&sink)));

        // Registered before the replay so a write made by the replay itself
        // reaches this subscriber too.
        let current = self.value.read().clone();
        sink(&current);

        let weak: Weak<Self> = Arc::downgrade(&self);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(id);
            }
        })
    }
}

/// A stream that always holds a current value.
///
/// New subscribers immediately receive the current value; history is not
/// kept. Clones share the same cell.
pub struct LatestSubject<T> {
    inner: Arc<SubjectInner<T>>,
}

impl<T> Clone for LatestSubject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> LatestSubject<T> {
    /// Create a subject seeded with `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                value: RwLock::new(initial),
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Current value.
    pub fn value(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Store `value` and notify every current subscriber before returning.
    pub fn next(&self, value: T) {
        *self.inner.value.write() = value.clone();
        for cb in self.inner.snapshot() {
            cb(&value);
        }
    }

    /// Subscribe-only view of this subject.
    pub fn as_observable(&self) -> Observable<T> {
        let source: Arc<dyn Source<T>> = Arc::clone(&self.inner) as Arc<dyn Source<T>>;
        Observable::from_source(source)
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

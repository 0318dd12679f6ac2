//! Read-only observable views, subscriptions and channel receivers.

use crossbeam_channel::{bounded, Receiver, RecvError, RecvTimeoutError, TryRecvError, TrySendError};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Closure type for subscribers.
pub type Callback<T> = dyn Fn(&T) + Send + Sync;

/// Something that can be subscribed to. Implemented by the concrete
/// streams; consumers only ever see [`Observable`].
pub(crate) trait Source<T>: Send + Sync {
    /// Register `sink`. Sources with a current value deliver it to `sink`
    /// before returning.
    fn subscribe(self: Arc<Self>, sink: Arc<Callback<T>>) -> Subscription;
}

/// Subscribe-only view of a stream. Clones share the same source.
pub struct Observable<T> {
    source: Arc<dyn Source<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observable(..)")
    }
}

impl<T: Clone + Send + 'static> Observable<T> {
    pub(crate) fn from_source(source: Arc<dyn Source<T>>) -> Self {
        Self { source }
    }

    /// True if both views share one source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.source) as *const (),
            Arc::as_ptr(&other.source) as *const (),
        )
    }

    /// Register `callback`. It runs synchronously for every emission,
    /// including any value replayed on subscription.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        Arc::clone(&self.source).subscribe(Arc::new(callback))
    }

    /// Subscribe through a bounded channel of `capacity` slots.
    ///
    /// When the buffer is full the subscriber is dropped and the receiver
    /// reports [`StreamReceiver::is_dropped`]. Dropping the receiver ends
    /// the subscription on the next emission.
    pub fn subscribe_channel(&self, capacity: usize) -> StreamReceiver<T> {
        let (sender, receiver) = bounded(capacity.max(1));
        let dropped = Arc::new(AtomicBool::new(false));
        let handle: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let subscription = {
            let dropped = Arc::clone(&dropped);
            let handle = Arc::clone(&handle);
            self.subscribe(move |value: &T| {
                if dropped.load(Ordering::SeqCst) {
                    return;
                }
                match sender.try_send(value.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(capacity, "dropping slow channel subscriber");
                        dropped.store(true, Ordering::SeqCst);
                        if let Some(sub) = handle.lock().take() {
                            sub.unsubscribe();
                        }
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        dropped.store(true, Ordering::SeqCst);
                        if let Some(sub) = handle.lock().take() {
                            sub.unsubscribe();
                        }
                    }
                }
            })
        };

        // The replay may already have overflowed before the handle existed.
        if dropped.load(Ordering::SeqCst) {
            subscription.unsubscribe();
        } else {
            *handle.lock() = Some(subscription.clone());
        }

        StreamReceiver {
            subscription,
            receiver,
            dropped,
        }
    }
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

type Teardown = Box<dyn FnOnce() + Send>;

struct SubscriptionInner {
    id: SubscriptionId,
    teardown: Mutex<Option<Teardown>>,
    closed: AtomicBool,
}

/// Handle to cancel a subscription.
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<SubscriptionInner>,
}

impl Subscription {
    pub(crate) fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(SubscriptionInner {
                id: SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed)),
                teardown: Mutex::new(Some(Box::new(teardown))),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.inner.id
    }

    /// Stop receiving emissions. Safe to call more than once.
    pub fn unsubscribe(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        // Take under the lock, run outside it.
        let teardown = self.inner.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.inner.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Channel-backed subscription.
pub struct StreamReceiver<T> {
    subscription: Subscription,
    receiver: Receiver<T>,
    dropped: Arc<AtomicBool>,
}

impl<T> StreamReceiver<T> {
    /// Receive the next value (blocking).
    pub fn recv(&self) -> Result<T, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a value (non-blocking).
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every value currently buffered.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// True once the subscriber was dropped for overflowing its buffer.
    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }
}

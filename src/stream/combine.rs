//! Combine-latest across N streams.

use parking_lot::Mutex;
use std::sync::Arc;

use super::observable::{Callback, Observable, Source, Subscription};

struct CombineLatest<T> {
    sources: Vec<Observable<T>>,
}

impl<T: Clone + Send + Sync + 'static> Source<Vec<T>> for CombineLatest<T> {
    fn subscribe(self: Arc<Self>, sink: Arc<Callback<Vec<T>>>) -> Subscription {
        if self.sources.is_empty() {
            sink(&Vec::new());
            return Subscription::new(|| {});
        }

        // Per-subscription slots: every subscriber gets its own chain.
        let latest: Arc<Mutex<Vec<Option<T>>>> =
            Arc::new(Mutex::new((0..self.sources.len()).map(|_| None).collect()));

        let inner: Vec<Subscription> = self
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                let latest = Arc::clone(&latest);
                let sink = Arc::clone(&sink);
                source.subscribe(move |value: &T| {
                    // Slots are released before the sink runs so that a write
                    // from inside the sink re-enters cleanly.
                    let ready = {
                        let mut slots = latest.lock();
                        if let Some(slot) = slots.get_mut(index) {
                            *slot = Some(value.clone());
                        }
                        slots.iter().cloned().collect::<Option<Vec<T>>>()
                    };
                    if let Some(values) = ready {
                        sink(&values);
                    }
                })
            })
            .collect();

        Subscription::new(move || {
            for sub in inner {
                sub.unsubscribe();
            }
        })
    }
}

/// Combine `sources` into one stream of positional value vectors.
///
/// Each subscription subscribes to every source in order. It emits once every
/// source has produced a value, then again on every emission of any source.
/// With replay-latest sources that means exactly one emission on subscribe.
/// An empty `sources` emits a single empty vector on subscribe.
pub fn combine_latest<T: Clone + Send + Sync + 'static>(
    sources: Vec<Observable<T>>,
) -> Observable<Vec<T>> {
    let source: Arc<dyn Source<Vec<T>>> = Arc::new(CombineLatest { sources });
    Observable::from_source(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::LatestSubject;

    #[test]
    fn test_emits_once_on_subscribe() {
        let a = LatestSubject::new(1);
        let b = LatestSubject::new(2);
        let combined = combine_latest(vec![a.as_observable(), b.as_observable()]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            combined.subscribe(move |v: &Vec<i32>| seen.lock().push(v.clone()));
        }

        assert_eq!(*seen.lock(), vec![vec![1, 2]]);
    }

    #[test]
    fn test_every_write_emits() {
        let a = LatestSubject::new(1);
        let b = LatestSubject::new(2);
        let combined = combine_latest(vec![a.as_observable(), b.as_observable()]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            combined.subscribe(move |v: &Vec<i32>| seen.lock().push(v.clone()));
        }
        a.next(10);
        b.next(20);
        a.next(10);

        assert_eq!(
            *seen.lock(),
            vec![vec![1, 2], vec![10, 2], vec![10, 20], vec![10, 20]]
        );
    }

    struct Silent;

    impl Source<i32> for Silent {
        fn subscribe(self: Arc<Self>, _sink: Arc<Callback<i32>>) -> Subscription {
            Subscription::new(|| {})
        }
    }

    #[test]
    fn test_waits_for_every_source() {
        let a = LatestSubject::new(1);
        let silent: Observable<i32> = Observable::from_source(Arc::new(Silent));
        let combined = combine_latest(vec![a.as_observable(), silent]);

        let count = Arc::new(Mutex::new(0));
        {
            let count = Arc::clone(&count);
            combined.subscribe(move |_: &Vec<i32>| *count.lock() += 1);
        }
        a.next(2);

        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_empty_sources_emit_empty_vector() {
        let combined = combine_latest(Vec::<Observable<u8>>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            combined.subscribe(move |v: &Vec<u8>| seen.lock().push(v.len()));
        }
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn test_unsubscribe_detaches_from_sources() {
        let a = LatestSubject::new(1);
        let b = LatestSubject::new(2);
        let combined = combine_latest(vec![a.as_observable(), b.as_observable()]);

        let sub = combined.subscribe(|_: &Vec<i32>| {});
        assert_eq!(a.subscriber_count(), 1);
        assert_eq!(b.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(a.subscriber_count(), 0);
        assert_eq!(b.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriptions_are_independent() {
        let a = LatestSubject::new(1);
        let combined = combine_latest(vec![a.as_observable()]);

        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        {
            let first = Arc::clone(&first);
            combined.subscribe(move |v: &Vec<i32>| first.lock().push(v[0]));
        }
        a.next(2);
        {
            let second = Arc::clone(&second);
            combined.subscribe(move |v: &Vec<i32>| second.lock().push(v[0]));
        }
        a.next(3);

        assert_eq!(*first.lock(), vec![1, 2, 3]);
        assert_eq!(*second.lock(), vec![2, 3]);
    }
}

//! The composite state stream exposed by a model.

use crate::config::ModelConfig;
use crate::stream::{Observable, Source, StreamReceiver, Subscription};
use crate::types::StateSnapshot;
use std::fmt;
use std::sync::Arc;

/// Stream of [`StateSnapshot`]s for one model.
///
/// Created once, when the model is transformed. Clones are the same stream.
#[derive(Clone)]
pub struct StateStream {
    key: Arc<str>,
    fields: Arc<[String]>,
    observable: Observable<StateSnapshot>,
    channel_buffer: usize,
}

impl StateStream {
    pub(crate) fn new(
        fields: Arc<[String]>,
        source: Arc<dyn Source<StateSnapshot>>,
        config: &ModelConfig,
    ) -> Self {
        Self {
            key: Arc::from(config.state_key.as_str()),
            fields,
            observable: Observable::from_source(source),
            channel_buffer: config.channel_buffer,
        }
    }

    /// Name the stream is discoverable under (`state$` by default).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tracked field names, in snapshot order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Subscribe with a callback. The first snapshot is delivered before
    /// this returns.
    pub fn subscribe(
        &self,
        callback: impl Fn(&StateSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.observable.subscribe(callback)
    }

    /// Subscribe through a channel sized by the model's `channel_buffer`.
    pub fn subscribe_channel(&self) -> StreamReceiver<StateSnapshot> {
        self.observable.subscribe_channel(self.channel_buffer)
    }

    pub fn as_observable(&self) -> Observable<StateSnapshot> {
        self.observable.clone()
    }

    /// True if both handles are the same stream.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.observable.ptr_eq(&other.observable)
    }
}

impl fmt::Debug for StateStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStream")
            .field("key", &self.key)
            .field("fields", &self.fields)
            .finish()
    }
}

//! Model configuration.

use crate::types::Value;

/// Configuration for a model.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Name under which the state stream is discoverable.
    /// Default: "state$"
    pub state_key: String,

    /// Value every field holds in the `previous` side of a first snapshot.
    /// Default: null
    pub sentinel: Value,

    /// Buffered snapshots per channel subscriber before it is dropped.
    /// Default: 1024
    pub channel_buffer: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            state_key: "state$".to_string(),
            sentinel: Value::Null,
            channel_buffer: 1024,
        }
    }
}

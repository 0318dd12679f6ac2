//! # Model Stream
//!
//! Turn a plain record into a reactive entity: every data field becomes an
//! observable cell, and one combined stream emits `{previous, next}`
//! snapshots of the whole record on every field write.
//!
//! ## Core Concepts
//!
//! - **Records**: Ordered name -> value entries; methods are entries too
//! - **Field streams**: Replay-latest cells installed in place of data fields
//! - **State stream**: Combine-latest over all field streams, with a
//!   per-subscription accumulator remembering the last emitted snapshot
//! - **Activation**: Eager via `Model::transform`, lazy via `Model::state`;
//!   either way the model is frozen afterwards
//!
//! ## Example
//!
//! ```ignore
//! use model_stream::Model;
//! use serde_json::json;
//!
//! let model = Model::transform_value(json!({"foo": "bar"}))?;
//!
//! model.state()?.subscribe(|snapshot| {
//!     println!("{:?} -> {:?}", snapshot.previous, snapshot.next);
//! });
//! // prints {"foo": null} -> {"foo": "bar"}
//!
//! model.set("foo", "baz")?;
//! // prints {"foo": "bar"} -> {"foo": "baz"}
//! ```

pub mod config;
pub mod error;
mod fields;
pub mod model;
pub mod record;
pub mod state;
pub mod stream;
pub mod types;

// Re-exports
pub use config::ModelConfig;
pub use error::{ModelError, Result};
pub use model::Model;
pub use record::Record;
pub use state::{StateAccumulator, StateStream};
pub use stream::{
    combine_latest, LatestSubject, Observable, StreamReceiver, Subscription, SubscriptionId,
};
pub use types::*;

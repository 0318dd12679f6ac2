//! Synchronous reactive stream primitives.
//!
//! This module provides the two building blocks models are made of:
//! - [`LatestSubject`]: a value cell that replays its current value to new
//!   subscribers and notifies them synchronously on every write
//! - [`combine_latest`]: one stream of positional vectors over N streams
//!
//! Everything is delivered on the writer's call stack; there is no
//! scheduler and no buffering except for channel subscribers.
//!
//! # Example
//!
//! ```ignore
//! let count = LatestSubject::new(0);
//! let sub = count.as_observable().subscribe(|v| println!("count = {v}"));
//! count.next(1);
//! sub.unsubscribe();
//! ```

mod combine;
mod observable;
mod subject;

pub use combine::combine_latest;
pub(crate) use observable::Source;
pub use observable::{Callback, Observable, StreamReceiver, Subscription, SubscriptionId};
pub use subject::LatestSubject;

//! Combined model state.
//!
//! Every field write produces one [`StateSnapshot`](crate::StateSnapshot)
//! holding the whole field set before and after the write. Snapshots are
//! built on the writer's call stack, in write order.

mod aggregator;
mod stream;

pub(crate) use aggregator::StateAggregator;
pub use aggregator::StateAccumulator;
pub use stream::StateStream;

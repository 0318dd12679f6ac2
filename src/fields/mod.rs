//! Field storage and per-field proxies.
//!
//! A model keeps its entries in a [`FieldTable`]. Transforming the model
//! swaps each plain data slot for a [`FieldProxy`], after which reads and
//! writes of that field go through its replay-latest stream.

mod proxy;
mod table;

pub(crate) use proxy::FieldProxy;
pub(crate) use table::{FieldTable, Slot};

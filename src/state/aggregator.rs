//! Combining per-field streams into a two-generation state stream.

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::fields::{FieldProxy, FieldTable};
use crate::stream::{combine_latest, Callback, Observable, Source, Subscription};
use crate::types::{StateMap, StateSnapshot, Value};
use parking_lot::Mutex;
use std::sync::Arc;

use super::stream::StateStream;

/// The `previous` side of the next snapshot, owned by one subscription.
///
/// [`StateAccumulator::step`] is the only place `previous` changes, and it
/// changes to exactly the `next` it just produced.
#[derive(Clone, Debug)]
pub struct StateAccumulator {
    fields: Arc<[String]>,
    previous: StateMap,
}

impl StateAccumulator {
    /// Start with every field mapped to `sentinel`.
    pub fn new(fields: Arc<[String]>, sentinel: &Value) -> Self {
        let previous = fields
            .iter()
            .map(|name| (name.clone(), sentinel.clone()))
            .collect();
        Self { fields, previous }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn previous(&self) -> &StateMap {
        &self.previous
    }

    /// Build the snapshot for `values` (positional, in field order) and
    /// remember its `next` for the following call.
    ///
    /// Fails with [`ModelError::ValueCount`] unless there is exactly one
    /// value per field; `previous` is left unchanged.
    pub fn step(&mut self, values: &[Value]) -> Result<StateSnapshot> {
        if values.len() != self.fields.len() {
            return Err(ModelError::ValueCount {
                expected: self.fields.len(),
                got: values.len(),
            });
        }
        let next: StateMap = self
            .fields
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        let previous = std::mem::replace(&mut self.previous, next.clone());
        Ok(StateSnapshot { previous, next })
    }
}

/// Source behind a model's [`StateStream`].
///
/// Subscribing starts a fresh combine-latest chain over the field streams
/// with its own [`StateAccumulator`], so every subscriber sees a sentinel
/// first snapshot followed by one snapshot per field write.
pub(crate) struct StateAggregator {
    fields: Arc<[String]>,
    combined: Observable<Vec<Value>>,
    sentinel: Value,
}

impl StateAggregator {
    /// Proxy every plain data field of `table`, in table order, and build
    /// the state stream over them.
    ///
    /// Validation happens before the first field is touched, so on error
    /// the table is unchanged.
    pub(crate) fn transform(table: &mut FieldTable, config: &ModelConfig) -> Result<StateStream> {
        if table.contains(&config.state_key) {
            return Err(ModelError::ReservedField(config.state_key.clone()));
        }

        let fields = table.data_fields();
        let mut streams = Vec::with_capacity(fields.len());
        for name in &fields {
            streams.push(FieldProxy::install(table, name)?);
        }

        let aggregator = StateAggregator {
            fields: fields.into(),
            combined: combine_latest(streams),
            sentinel: config.sentinel.clone(),
        };
        tracing::debug!(fields = aggregator.fields.len(), "fields proxied");

        Ok(StateStream::new(
            Arc::clone(&aggregator.fields),
            Arc::new(aggregator),
            config,
        ))
    }
}

impl Source<StateSnapshot> for StateAggregator {
    fn subscribe(self: Arc<Self>, sink: Arc<Callback<StateSnapshot>>) -> Subscription {
        let accumulator = Mutex::new(StateAccumulator::new(
            Arc::clone(&self.fields),
            &self.sentinel,
        ));
        self.combined.subscribe(move |values: &Vec<Value>| {
            // Released before the sink runs; a write from the sink steps again.
            let stepped = accumulator.lock().step(values);
            match stepped {
                Ok(snapshot) => sink(&snapshot),
                Err(e) => tracing::warn!(error = %e, "state snapshot skipped"),
            }
        })
    }
}

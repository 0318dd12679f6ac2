//! Model: a record whose data fields become observable on activation.

use crate::config::ModelConfig;
use crate::error::{ModelError, Result};
use crate::fields::{FieldProxy, FieldTable, Slot};
use crate::record::Record;
use crate::state::{StateAggregator, StateStream};
use crate::stream::Observable;
use crate::types::{Entry, Method, StateMap, Value};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Field table plus the state stream once activated.
///
/// `state` is `None` until the model is transformed; after that the table's
/// set of names is fixed and every data slot is proxied.
struct ModelState {
    table: FieldTable,
    state: Option<StateStream>,
}

/// Field writes waiting to be delivered, in the order they were made.
#[derive(Default)]
struct WriteQueue {
    draining: bool,
    pending: VecDeque<(FieldProxy, Value)>,
}

/// Clears the draining flag even if a subscriber panics.
struct DrainGuard<'a>(&'a RefCell<WriteQueue>);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.borrow_mut().draining = false;
    }
}

struct ModelInner {
    config: ModelConfig,
    state: RwLock<ModelState>,
    /// Serializes delivery of field writes across threads. Reentrant so a
    /// subscriber's own write can join the queue of the round it runs in.
    writes: ReentrantMutex<RefCell<WriteQueue>>,
}

/// A record that can be turned into a reactive entity.
///
/// A fresh model behaves like a plain mutable record. It is activated
/// either eagerly by [`Model::transform`] or lazily by the first call to
/// [`Model::state`]. Activation proxies every data field, builds the
/// [`StateStream`] and freezes the set of names.
///
/// `Model` is a handle: clones refer to the same record.
///
/// Writes are delivered synchronously and one at a time. A write made by a
/// subscriber while another write is being delivered is queued and
/// delivered after the current one has reached every subscriber, before
/// the outermost [`Model::set`] returns. Writes from other threads wait
/// for the delivery in progress, so every subscriber sees the same order.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Create an unactivated model copying the entries of `source`.
    ///
    /// `None` gives an empty model. A source that is present but not an
    /// object (including `null`) is rejected.
    pub fn new(source: Option<Value>) -> Result<Self> {
        Self::with_config(source, ModelConfig::default())
    }

    /// [`Model::new`] with an explicit configuration.
    pub fn with_config(source: Option<Value>, config: ModelConfig) -> Result<Self> {
        let record = match source {
            Some(value) => Record::from_value(value)?,
            None => Record::new(),
        };
        Ok(Self::from_record_with_config(record, config))
    }

    /// Create an unactivated model from a record, methods included.
    pub fn from_record(record: Record) -> Self {
        Self::from_record_with_config(record, ModelConfig::default())
    }

    pub fn from_record_with_config(record: Record, config: ModelConfig) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                config,
                state: RwLock::new(ModelState {
                    table: FieldTable::from_record(record),
                    state: None,
                }),
                writes: ReentrantMutex::new(RefCell::new(WriteQueue::default())),
            }),
        }
    }

    /// Activate `model` in place and return it.
    ///
    /// Fails with [`ModelError::AlreadyTransformed`] on an active model and
    /// with [`ModelError::ReservedField`] if an entry uses the state key;
    /// in both cases the model is left untouched.
    pub fn transform(model: &Model) -> Result<&Model> {
        model.activate()?;
        Ok(model)
    }

    /// Build an active model from a JSON value.
    ///
    /// Non-objects are rejected before anything is created.
    pub fn transform_value(value: Value) -> Result<Model> {
        let record = Record::from_value(value)?;
        let model = Model::from_record(record);
        Model::transform(&model)?;
        Ok(model)
    }

    fn activate(&self) -> Result<StateStream> {
        let mut guard = self.inner.state.write();
        if guard.state.is_some() {
            return Err(ModelError::AlreadyTransformed);
        }
        let stream = StateAggregator::transform(&mut guard.table, &self.inner.config)?;
        guard.state = Some(stream.clone());
        tracing::debug!(
            key = %stream.key(),
            fields = ?stream.fields(),
            "model transformed"
        );
        Ok(stream)
    }

    /// The state stream, activating the model on first access.
    pub fn state(&self) -> Result<StateStream> {
        if let Some(stream) = self.inner.state.read().state.clone() {
            return Ok(stream);
        }
        match self.activate() {
            // Lost a race with another activation; use its stream.
            Err(ModelError::AlreadyTransformed) => self
                .inner
                .state
                .read()
                .state
                .clone()
                .ok_or(ModelError::AlreadyTransformed),
            other => other,
        }
    }

    /// True once the state stream exists.
    pub fn has_own_state(&self) -> bool {
        self.inner.state.read().state.is_some()
    }

    /// True once no entry can be added, removed or redefined.
    pub fn is_frozen(&self) -> bool {
        self.has_own_state()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.inner.config
    }

    /// True if both handles are the same model.
    pub fn ptr_eq(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // --- Field access ---

    /// Current value of a data field. `None` for methods and unknown names.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.inner.state.read().table.slot(name)? {
            Slot::Plain(value) => Some(value.clone()),
            Slot::Proxied(proxy) => Some(proxy.get()),
            Slot::Method(_) => None,
        }
    }

    /// Write a data field.
    ///
    /// Before activation this inserts or overwrites like a plain record.
    /// After activation only tracked fields can be written; the write is
    /// pushed into the field's stream and every subscriber has run by the
    /// time this returns. Called from a subscriber, the write is queued
    /// behind the one being delivered and this returns immediately.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let proxy = {
            let mut guard = self.inner.state.write();
            if guard.state.is_none() {
                guard.table.insert(name.to_string(), Entry::Data(value));
                return Ok(());
            }
            match guard.table.slot(name) {
                Some(Slot::Proxied(proxy)) => proxy.clone(),
                _ => {
                    return Err(ModelError::Frozen {
                        op: "set",
                        field: name.to_string(),
                    })
                }
            }
        };

        let writes = self.inner.writes.lock();
        {
            let mut queue = writes.borrow_mut();
            queue.pending.push_back((proxy, value));
            if queue.draining {
                tracing::trace!(field = name, "field write queued");
                return Ok(());
            }
            queue.draining = true;
        }
        tracing::trace!(field = name, "field write");

        let _drain = DrainGuard(&*writes);
        loop {
            // The borrow ends before delivery so subscribers can enqueue.
            let next = writes.borrow_mut().pending.pop_front();
            let Some((proxy, value)) = next else { break };
            proxy.set(value);
        }
        Ok(())
    }

    /// Insert or overwrite an entry (data or method). Fails once frozen.
    pub fn insert(&self, name: &str, entry: impl Into<Entry>) -> Result<()> {
        let mut guard = self.inner.state.write();
        if guard.state.is_some() {
            return Err(ModelError::Frozen {
                op: "insert",
                field: name.to_string(),
            });
        }
        guard.table.insert(name.to_string(), entry.into());
        Ok(())
    }

    /// Remove an entry, returning what it held. Fails once frozen.
    pub fn remove(&self, name: &str) -> Result<Option<Entry>> {
        let mut guard = self.inner.state.write();
        if guard.state.is_some() {
            return Err(ModelError::Frozen {
                op: "remove",
                field: name.to_string(),
            });
        }
        Ok(guard.table.remove(name).map(|slot| match slot {
            Slot::Plain(value) => Entry::Data(value),
            Slot::Proxied(proxy) => Entry::Data(proxy.get()),
            Slot::Method(method) => Entry::Method(method),
        }))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.state.read().table.contains(name)
    }

    /// Every entry name, methods included, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.state.read().table.keys()
    }

    /// Names that are (or on activation will be) tracked, in order.
    pub fn tracked_fields(&self) -> Vec<String> {
        let guard = self.inner.state.read();
        match &guard.state {
            Some(stream) => stream.fields().to_vec(),
            None => guard.table.data_fields(),
        }
    }

    /// Read-only stream of one tracked field. `None` before activation.
    pub fn field_stream(&self, name: &str) -> Option<Observable<Value>> {
        match self.inner.state.read().table.slot(name)? {
            Slot::Proxied(proxy) => Some(proxy.observable()),
            _ => None,
        }
    }

    /// Current values of all data fields.
    pub fn values(&self) -> StateMap {
        self.inner.state.read().table.values()
    }

    pub fn method(&self, name: &str) -> Option<Method> {
        match self.inner.state.read().table.slot(name)? {
            Slot::Method(method) => Some(method.clone()),
            _ => None,
        }
    }

    /// Call a method entry with this model as receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let method = match self.inner.state.read().table.slot(name) {
            Some(Slot::Method(method)) => method.clone(),
            Some(_) => return Err(ModelError::NotAMethod(name.to_string())),
            None => return Err(ModelError::FieldNotFound(name.to_string())),
        };
        Ok(method.call(self, args))
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::from_record(Record::new())
    }
}

impl From<Record> for Model {
    fn from(record: Record) -> Self {
        Self::from_record(record)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("values", &self.values())
            .field("active", &self.has_own_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_copies_source() {
        let model = Model::new(Some(json!({"foo": "bar"}))).unwrap();
        assert_eq!(model.get("foo"), Some(json!("bar")));
        assert!(!model.has_own_state());
    }

    #[test]
    fn test_new_without_source_is_empty() {
        let model = Model::new(None).unwrap();
        assert!(model.keys().is_empty());
    }

    #[test]
    fn test_new_rejects_non_objects() {
        for value in [json!("string"), json!(1), json!(true), json!(null), json!([])] {
            assert!(matches!(
                Model::new(Some(value)),
                Err(ModelError::NotAnObject(_))
            ));
        }
    }

    #[test]
    fn test_unactivated_model_is_mutable() {
        let model = Model::default();
        model.set("a", 1).unwrap();
        model.insert("b", json!(2)).unwrap();
        assert_eq!(model.remove("a").unwrap().map(|e| e.is_callable()), Some(false));
        assert_eq!(model.keys(), vec!["b"]);
    }

    #[test]
    fn test_transform_returns_same_model() {
        let model = Model::default();
        let out = Model::transform(&model).unwrap();
        assert!(out.ptr_eq(&model));
        assert!(model.has_own_state());
        assert!(model.is_frozen());
    }

    #[test]
    fn test_second_transform_is_an_error() {
        let model = Model::transform_value(json!({"foo": 1})).unwrap();
        let first = model.state().unwrap();

        assert_eq!(
            Model::transform(&model).unwrap_err(),
            ModelError::AlreadyTransformed
        );
        assert!(model.state().unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_lazy_state_materializes_once() {
        let model = Model::new(Some(json!({"foo": "bar"}))).unwrap();
        assert!(!model.has_own_state());

        let first = model.state().unwrap();
        assert!(model.has_own_state());
        assert!(model.state().unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_frozen_rejects_structural_changes() {
        let model = Model::transform_value(json!({"foo": 1})).unwrap();

        assert!(matches!(model.insert("bar", json!(1)), Err(ModelError::Frozen { op: "insert", .. })));
        assert!(matches!(model.remove("foo"), Err(ModelError::Frozen { op: "remove", .. })));
        assert!(matches!(model.set("bar", 1), Err(ModelError::Frozen { op: "set", .. })));
        assert_eq!(model.keys(), vec!["foo"]);
    }

    #[test]
    fn test_call_method() {
        let record = Record::new().with("name", "world").with_method("greet", |model, _| {
            let name = model.get("name").unwrap_or_default();
            json!(format!("hello {}", name.as_str().unwrap_or("")))
        });
        let model = Model::from_record(record);
        Model::transform(&model).unwrap();
        model.set("name", "rust").unwrap();

        assert_eq!(model.call("greet", &[]).unwrap(), json!("hello rust"));
        assert_eq!(
            model.call("name", &[]).unwrap_err(),
            ModelError::NotAMethod("name".to_string())
        );
        assert_eq!(
            model.call("missing", &[]).unwrap_err(),
            ModelError::FieldNotFound("missing".to_string())
        );
    }

    #[test]
    fn test_subscriber_write_to_same_field_is_queued() {
        let model = Model::transform_value(json!({"level": 0})).unwrap();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        {
            let clamp = model.clone();
            let seen = Arc::clone(&seen);
            model.state().unwrap().subscribe(move |snapshot| {
                let level = snapshot.next["level"].as_i64().unwrap_or(0);
                seen.lock().push(level);
                if level > 10 {
                    clamp.set("level", 10).unwrap();
                    // Applied only after this round finishes.
                    assert_eq!(clamp.get("level"), Some(json!(level)));
                }
            });
        }

        model.set("level", 50).unwrap();

        assert_eq!(*seen.lock(), vec![0, 50, 10]);
        assert_eq!(model.get("level"), Some(json!(10)));
    }
}

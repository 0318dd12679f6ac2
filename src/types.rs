//! Core types for reactive models.

use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A field value. Anything JSON can hold; callables live in [`Method`].
pub use serde_json::Value;

/// Insertion-ordered mapping of field name to value.
pub type StateMap = serde_json::Map<String, Value>;

/// Describe the JSON kind of a value (for error messages).
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Two generations of a model's tracked fields.
///
/// `previous` is always the `next` of the snapshot emitted just before this
/// one on the same subscription. The first snapshot of a subscription maps
/// every field to the sentinel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub previous: StateMap,
    pub next: StateMap,
}

impl StateSnapshot {
    /// Names of fields whose value differs between `previous` and `next`,
    /// in field order.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.next
            .iter()
            .filter(|(name, value)| self.previous.get(name.as_str()) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

type MethodFn = dyn Fn(&Model, &[Value]) -> Value + Send + Sync;

/// A callable record entry. Never tracked.
#[derive(Clone)]
pub struct Method(Arc<MethodFn>);

impl Method {
    pub fn new(f: impl Fn(&Model, &[Value]) -> Value + Send + Sync + 'static) -> Self {
        Method(Arc::new(f))
    }

    /// Invoke with the owning model as receiver.
    pub fn call(&self, model: &Model, args: &[Value]) -> Value {
        (self.0)(model, args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method(..)")
    }
}

/// One entry of a plain record.
#[derive(Clone, Debug)]
pub enum Entry {
    Data(Value),
    Method(Method),
}

impl Entry {
    pub fn is_callable(&self) -> bool {
        matches!(self, Entry::Method(_))
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Data(value)
    }
}

impl From<Method> for Entry {
    fn from(method: Method) -> Self {
        Entry::Method(method)
    }
}

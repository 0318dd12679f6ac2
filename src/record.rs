//! Plain, not yet reactive records.

use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::types::{value_kind, Entry, Method, Value};

/// An ordered set of named entries.
///
/// Entry order is insertion order; overwriting an existing name keeps its
/// position. This is the order fields are tracked in once a model built
/// from the record is transformed.
#[derive(Clone, Debug, Default)]
pub struct Record {
    entries: Vec<(String, Entry)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`] for data values.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, Entry::Data(value.into()));
        self
    }

    /// Builder form of [`Record::insert`] for methods.
    pub fn with_method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&Model, &[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, Entry::Method(Method::new(f)));
        self
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<Entry>) {
        let name = name.into();
        let entry = entry.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// Build from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(ModelError::NotAnObject(value_kind(&other))),
        }
    }
}

impl TryFrom<Value> for Record {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self> {
        Record::from_value(value)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, Entry::Data(value));
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Entry);
    type IntoIter = std::vec::IntoIter<(String, Entry)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

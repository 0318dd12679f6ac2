//! Field storage of a model.

use crate::record::Record;
use crate::types::{Entry, Method, StateMap, Value};

use super::proxy::FieldProxy;

/// Storage for one named entry.
#[derive(Clone, Debug)]
pub(crate) enum Slot {
    /// Plain data, not yet observable.
    Plain(Value),
    /// Data routed through a field stream.
    Proxied(FieldProxy),
    /// Callable entry. Never tracked.
    Method(Method),
}

impl From<Entry> for Slot {
    fn from(entry: Entry) -> Self {
        match entry {
            Entry::Data(value) => Slot::Plain(value),
            Entry::Method(method) => Slot::Method(method),
        }
    }
}

/// Ordered name -> slot table.
#[derive(Clone, Debug, Default)]
pub(crate) struct FieldTable {
    slots: Vec<(String, Slot)>,
}

impl FieldTable {
    pub(crate) fn from_record(record: Record) -> Self {
        Self {
            slots: record
                .into_iter()
                .map(|(name, entry)| (name, Slot::from(entry)))
                .collect(),
        }
    }

    pub(crate) fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub(crate) fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Insert or overwrite, keeping the position of an existing name.
    pub(crate) fn insert(&mut self, name: String, entry: Entry) {
        let slot = Slot::from(entry);
        match self.slot_mut(&name) {
            Some(existing) => *existing = slot,
            None => self.slots.push((name, slot)),
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Slot> {
        let pos = self.slots.iter().position(|(n, _)| n == name)?;
        Some(self.slots.remove(pos).1)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.slots.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Names of the plain data entries, in table order.
    pub(crate) fn data_fields(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Plain(_)))
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Current value of every data entry, plain or proxied.
    pub(crate) fn values(&self) -> StateMap {
        self.slots
            .iter()
            .filter_map(|(name, slot)| match slot {
                Slot::Plain(value) => Some((name.clone(), value.clone())),
                Slot::Proxied(proxy) => Some((name.clone(), proxy.get())),
                Slot::Method(_) => None,
            })
            .collect()
    }
}

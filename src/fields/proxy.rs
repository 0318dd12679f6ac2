//! Per-field observable cells.

use crate::error::{ModelError, Result};
use crate::stream::{LatestSubject, Observable};
use crate::types::Value;
use std::fmt;

use super::table::{FieldTable, Slot};

/// Interceptor installed in place of a plain field.
///
/// Reads return the stream's latest value; writes push into the stream and
/// notify every subscriber before returning. Clones share the stream.
#[derive(Clone)]
pub(crate) struct FieldProxy {
    subject: LatestSubject<Value>,
}

impl FieldProxy {
    /// Replace the plain field `name` in `table` with a proxy seeded with
    /// its current value and return the field's read-only stream.
    ///
    /// The caller is expected to pass a plain data field; proxying twice
    /// is refused rather than silently replacing the first stream.
    pub(crate) fn install(table: &mut FieldTable, name: &str) -> Result<Observable<Value>> {
        let slot = table
            .slot_mut(name)
            .ok_or_else(|| ModelError::FieldNotFound(name.to_string()))?;

        let value = match slot {
            Slot::Plain(value) => std::mem::take(value),
            Slot::Proxied(_) => return Err(ModelError::AlreadyProxied(name.to_string())),
            Slot::Method(_) => return Err(ModelError::CallableField(name.to_string())),
        };

        let proxy = FieldProxy {
            subject: LatestSubject::new(value),
        };
        let observable = proxy.subject.as_observable();
        *slot = Slot::Proxied(proxy);

        Ok(observable)
    }

    pub(crate) fn get(&self) -> Value {
        self.subject.value()
    }

    pub(crate) fn set(&self, value: Value) {
        self.subject.next(value);
    }

    pub(crate) fn observable(&self) -> Observable<Value> {
        self.subject.as_observable()
    }
}

impl fmt::Debug for FieldProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldProxy({})", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;

    fn table() -> FieldTable {
        FieldTable::from_record(
            Record::new()
                .with("foo", "bar")
                .with_method("method", |_, _| Value::Null),
        )
    }

    fn proxy(table: &FieldTable, name: &str) -> FieldProxy {
        match table.slot(name) {
            Some(Slot::Proxied(proxy)) => proxy.clone(),
            other => panic!("Expected proxied slot, got {:?}", other),
        }
    }

    #[test]
    fn test_install_seeds_stream_with_current_value() {
        let mut table = table();
        let stream = FieldProxy::install(&mut table, "foo").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            stream.subscribe(move |v: &Value| seen.lock().push(v.clone()));
        }

        assert_eq!(*seen.lock(), vec![json!("bar")]);
        assert_eq!(proxy(&table, "foo").get(), json!("bar"));
    }

    #[test]
    fn test_write_goes_through_stream() {
        let mut table = table();
        let stream = FieldProxy::install(&mut table, "foo").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            stream.subscribe(move |v: &Value| seen.lock().push(v.clone()));
        }
        proxy(&table, "foo").set(json!("baz"));

        assert_eq!(*seen.lock(), vec![json!("bar"), json!("baz")]);
        assert_eq!(proxy(&table, "foo").get(), json!("baz"));
    }

    #[test]
    fn test_install_twice_is_refused() {
        let mut table = table();
        FieldProxy::install(&mut table, "foo").unwrap();

        assert_eq!(
            FieldProxy::install(&mut table, "foo").unwrap_err(),
            ModelError::AlreadyProxied("foo".to_string())
        );
    }

    #[test]
    fn test_install_rejects_methods_and_missing_fields() {
        let mut table = table();
        assert_eq!(
            FieldProxy::install(&mut table, "method").unwrap_err(),
            ModelError::CallableField("method".to_string())
        );
        assert_eq!(
            FieldProxy::install(&mut table, "missing").unwrap_err(),
            ModelError::FieldNotFound("missing".to_string())
        );
    }
}

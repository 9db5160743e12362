//! Serialized access to non-reentrant backends.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Narrowing;
use crate::data::DataBuffer;
use crate::error::Result;
use crate::slice::SliceSpec;
use crate::source::{DataSink, DataSource};
use crate::types::{Dimension, Schema, Variable};

/// Wraps a backend that must not be called concurrently.
///
/// Every call, read or write, holds one mutex for its whole duration, so the
/// wrapped backend only ever sees one caller at a time. The wrapper itself is
/// `Sync` whenever the backend is `Send`.
pub struct SerializedSource<S> {
    inner: Mutex<S>,
}

impl<S> SerializedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Unwrap the backend.
    pub fn into_inner(self) -> S {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: DataSource> DataSource for SerializedSource<S> {
    fn schema(&self) -> Schema {
        self.lock().schema()
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        self.lock().read_raw_slice(variable, slice)
    }

    fn variable(&self, name: &str) -> Result<Variable> {
        self.lock().variable(name)
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        self.lock().variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        self.lock().dimension_length(name)
    }

    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        self.lock().missing_value_marker(name)
    }

    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        self.lock().native_unit(name)
    }
}

impl<S: DataSink> DataSink for SerializedSource<S> {
    fn write_raw_slice(&self, variable: &str, slice: &SliceSpec, data: &DataBuffer) -> Result<()> {
        self.lock().write_raw_slice(variable, slice, data)
    }

    fn sync(&self) -> Result<()> {
        self.lock().sync()
    }

    fn narrowing(&self) -> Option<Narrowing> {
        self.lock().narrowing()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::types::DataType;

    /// A backend that is `Send` but not `Sync`.
    struct CountingBackend {
        schema: Schema,
        reads: Cell<usize>,
    }

    impl DataSource for CountingBackend {
        fn schema(&self) -> Schema {
            self.schema.clone()
        }

        fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
            self.reads.set(self.reads.get() + 1);
            let shape = self.schema.variable_shape(variable)?;
            slice.validate_against(&shape)?;
            Ok(DataBuffer::filled(DataType::Float32, slice.element_count(), 1.0))
        }
    }

    #[test]
    fn test_concurrent_reads_through_wrapper() {
        let schema = Schema::new(
            vec![Dimension::new("x", 8)],
            vec![Variable::new("v", &["x"], DataType::Float32)],
        )
        .unwrap();
        let source = Arc::new(SerializedSource::new(CountingBackend {
            schema,
            reads: Cell::new(0),
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = Arc::clone(&source);
                thread::spawn(move || {
                    let shape = source.variable_shape("v").unwrap();
                    for _ in 0..50 {
                        let data = source.read_raw_slice("v", &SliceSpec::new(&shape)).unwrap();
                        assert_eq!(data.len(), 8);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let source = Arc::try_unwrap(source).ok().unwrap();
        assert_eq!(source.into_inner().reads.get(), 400);
    }
}

//! In-memory dataset.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::Narrowing;
use crate::data::DataBuffer;
use crate::error::{GridProcessorError, Result};
use crate::slice::SliceSpec;
use crate::source::{DataSink, DataSource};
use crate::types::{shape_size, Schema};

struct MemoryState {
    schema: Schema,
    data: HashMap<String, DataBuffer>,
}

/// A dataset held entirely in memory, one full buffer per variable.
///
/// New elements (initial buffers and records appended by growing the
/// growable dimension) hold the variable's missing value, or zero.
pub struct MemoryDataset {
    state: Mutex<MemoryState>,
    narrowing: Option<Narrowing>,
    writes: AtomicUsize,
    syncs: AtomicUsize,
}

impl MemoryDataset {
    pub fn new(schema: Schema) -> Result<Self> {
        schema.validate()?;
        let mut data = HashMap::new();
        for var in schema.variables() {
            let len = shape_size(&schema.variable_shape(&var.name)?);
            let fill = var.missing_value.unwrap_or(0.0);
            data.insert(var.name.clone(), DataBuffer::filled(var.data_type, len, fill));
        }
        Ok(Self {
            state: Mutex::new(MemoryState { schema, data }),
            narrowing: None,
            writes: AtomicUsize::new(0),
            syncs: AtomicUsize::new(0),
        })
    }

    /// Replace the full contents of a variable.
    pub fn with_data(self, variable: &str, data: impl Into<DataBuffer>) -> Result<Self> {
        self.set_variable_data(variable, data.into())?;
        Ok(self)
    }

    /// Narrowing rule advertised to writers.
    pub fn with_narrowing(mut self, narrowing: Narrowing) -> Self {
        self.narrowing = Some(narrowing);
        self
    }

    /// Replace the full contents of a variable, casting to its type.
    pub fn set_variable_data(&self, variable: &str, data: DataBuffer) -> Result<()> {
        let mut state = self.lock();
        let var = state
            .schema
            .variable(variable)
            .cloned()
            .ok_or_else(|| GridProcessorError::unknown_variable(variable))?;
        let expected = shape_size(&state.schema.variable_shape(variable)?);
        if data.len() != expected {
            return Err(GridProcessorError::size_mismatch(expected, data.len()));
        }
        let narrowing = self.narrowing.unwrap_or_default();
        state
            .data
            .insert(var.name, data.cast(var.data_type, narrowing));
        Ok(())
    }

    /// Full contents of a variable.
    pub fn variable_data(&self, variable: &str) -> Result<DataBuffer> {
        self.lock()
            .data
            .get(variable)
            .cloned()
            .ok_or_else(|| GridProcessorError::unknown_variable(variable))
    }

    /// Number of `write_raw_slice` calls received.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of `sync` calls received.
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    /// Grow the growable dimension to `length`, padding every variable over it.
    fn grow(&mut self, dimension: &str, length: usize) -> Result<()> {
        self.schema.extend_dimension(dimension, length)?;
        for var in self.schema.variables() {
            if var.dimensions.first().map(String::as_str) != Some(dimension) {
                continue;
            }
            let len = shape_size(&self.schema.variable_shape(&var.name)?);
            if let Some(buffer) = self.data.get_mut(&var.name) {
                buffer.resize(len, var.missing_value.unwrap_or(0.0));
            }
        }
        debug!(dimension = %dimension, length = length, "Extended growable dimension");
        Ok(())
    }
}

impl DataSource for MemoryDataset {
    fn schema(&self) -> Schema {
        self.lock().schema.clone()
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        let state = self.lock();
        let shape = state.schema.variable_shape(variable)?;
        let buffer = state
            .data
            .get(variable)
            .ok_or_else(|| GridProcessorError::unknown_variable(variable))?;
        let out = buffer.extract(&shape, slice)?;
        debug!(variable = %variable, elements = out.len(), "Read raw slice");
        Ok(out)
    }
}

impl DataSink for MemoryDataset {
    fn write_raw_slice(&self, variable: &str, slice: &SliceSpec, data: &DataBuffer) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        let var = state
            .schema
            .variable(variable)
            .cloned()
            .ok_or_else(|| GridProcessorError::unknown_variable(variable))?;
        let mut shape = state.schema.variable_shape(variable)?;

        // Check everything against the grown shape before touching any buffer.
        let mut growth = None;
        if let Some(required) = slice.required_growable_length(&shape) {
            if let Some(dim) = shape.iter_mut().find(|d| d.growable) {
                if required > dim.length {
                    dim.length = required;
                    growth = Some((dim.name.clone(), required));
                }
            }
        }
        let expected: usize = slice.resolve(&shape)?.iter().map(|r| r.length).product();
        if data.len() != expected {
            return Err(GridProcessorError::size_mismatch(expected, data.len()));
        }

        if let Some((dimension, length)) = growth {
            state.grow(&dimension, length)?;
        }

        let values = data.cast(var.data_type, self.narrowing.unwrap_or_default());
        let buffer = state
            .data
            .get_mut(variable)
            .ok_or_else(|| GridProcessorError::unknown_variable(variable))?;
        buffer.insert(&shape, slice, &values)?;
        debug!(variable = %variable, elements = values.len(), "Wrote raw slice");
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn narrowing(&self) -> Option<Narrowing> {
        self.narrowing
    }
}

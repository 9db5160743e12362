//! Backend capabilities.
//!
//! A backend is anything that can hand out raw slices of its variables
//! ([`DataSource`]) and, optionally, accept raw slices back ([`DataSink`]).
//! Processors wrap a source and implement the same traits, so they stack.

mod memory;
mod serialized;

pub use memory::MemoryDataset;
pub use serialized::SerializedSource;

use std::sync::Arc;

use crate::config::Narrowing;
use crate::data::DataBuffer;
use crate::error::{GridProcessorError, Result};
use crate::slice::SliceSpec;
use crate::types::{Dimension, Schema, Variable};

/// Read capability of a backend.
pub trait DataSource {
    /// Current schema. The growable dimension may have grown since the last call.
    fn schema(&self) -> Schema;

    /// Read a slice in the variable's stored type, without unpacking or
    /// unit conversion.
    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer>;

    fn variable(&self, name: &str) -> Result<Variable> {
        self.schema()
            .variable(name)
            .cloned()
            .ok_or_else(|| GridProcessorError::unknown_variable(name))
    }

    /// Ordered dimensions of a variable.
    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        self.schema().variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        self.schema()
            .dimension(name)
            .map(|d| d.length)
            .ok_or_else(|| GridProcessorError::unknown_dimension(name))
    }

    /// Raw value marking missing data in a variable.
    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.variable(name)?.missing_value)
    }

    /// Unit of the variable's unpacked values.
    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        Ok(self.variable(name)?.units)
    }
}

/// Write capability of a backend.
pub trait DataSink: DataSource {
    /// Write a slice of raw values. Writing past the end of the growable
    /// dimension extends it.
    fn write_raw_slice(&self, variable: &str, slice: &SliceSpec, data: &DataBuffer) -> Result<()>;

    /// Flush pending writes.
    fn sync(&self) -> Result<()>;

    /// How this sink narrows floating values into integer variables.
    /// `None` leaves the choice to the caller's configuration.
    fn narrowing(&self) -> Option<Narrowing> {
        None
    }
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn schema(&self) -> Schema {
        (**self).schema()
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        (**self).read_raw_slice(variable, slice)
    }

    fn variable(&self, name: &str) -> Result<Variable> {
        (**self).variable(name)
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        (**self).variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        (**self).dimension_length(name)
    }

    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        (**self).missing_value_marker(name)
    }

    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        (**self).native_unit(name)
    }
}

impl<T: DataSink + ?Sized> DataSink for &T {
    fn write_raw_slice(&self, variable: &str, slice: &SliceSpec, data: &DataBuffer) -> Result<()> {
        (**self).write_raw_slice(variable, slice, data)
    }

    fn sync(&self) -> Result<()> {
        (**self).sync()
    }

    fn narrowing(&self) -> Option<Narrowing> {
        (**self).narrowing()
    }
}

impl<T: DataSource + ?Sized> DataSource for Arc<T> {
    fn schema(&self) -> Schema {
        (**self).schema()
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        (**self).read_raw_slice(variable, slice)
    }

    fn variable(&self, name: &str) -> Result<Variable> {
        (**self).variable(name)
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        (**self).variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        (**self).dimension_length(name)
    }

    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        (**self).missing_value_marker(name)
    }

    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        (**self).native_unit(name)
    }
}

impl<T: DataSink + ?Sized> DataSink for Arc<T> {
    fn write_raw_slice(&self, variable: &str, slice: &SliceSpec, data: &DataBuffer) -> Result<()> {
        (**self).write_raw_slice(variable, slice, data)
    }

    fn sync(&self) -> Result<()> {
        (**self).sync()
    }

    fn narrowing(&self) -> Option<Narrowing> {
        (**self).narrowing()
    }
}

//! De-accumulation along the growable dimension.

use std::collections::HashSet;

use tracing::debug;

use crate::config::{GridProcessorConfig, Narrowing};
use crate::data::DataBuffer;
use crate::error::{GridProcessorError, Result};
use crate::packing::Packing;
use crate::slice::SliceSpec;
use crate::source::DataSource;
use crate::types::{Dimension, Schema, Variable};

/// Turns accumulated fields (e.g. precipitation since the start of a
/// forecast) into per-step fields: `v'(n) = v(n) - v(n-1)`, `v'(0) = v(0)`.
///
/// Differences are taken on physical values, so packed variables work.
/// A step is missing when either of its inputs is.
pub struct DeAccumulate<S> {
    source: S,
    variables: HashSet<String>,
    parallel_threshold: usize,
}

impl<S: DataSource> DeAccumulate<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            variables: HashSet::new(),
            parallel_threshold: GridProcessorConfig::default().parallel_threshold,
        }
    }

    /// Mark a variable for de-accumulation. Its outermost dimension must be
    /// the growable one.
    pub fn deaccumulate(mut self, variable: &str) -> Result<Self> {
        let shape = self.source.variable_shape(variable)?;
        if !shape.first().is_some_and(|d| d.growable) {
            return Err(GridProcessorError::invalid_schema(format!(
                "cannot de-accumulate '{}': no growable dimension",
                variable
            )));
        }
        self.variables.insert(variable.to_string());
        Ok(self)
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn is_deaccumulated(&self, variable: &str) -> bool {
        self.variables.contains(variable)
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: DataSource> DataSource for DeAccumulate<S> {
    fn schema(&self) -> Schema {
        self.source.schema()
    }

    fn variable(&self, name: &str) -> Result<Variable> {
        self.source.variable(name)
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        self.source.variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        self.source.dimension_length(name)
    }

    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        self.source.missing_value_marker(name)
    }

    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        self.source.native_unit(name)
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        if !self.is_deaccumulated(variable) {
            return self.source.read_raw_slice(variable, slice);
        }

        let var = self.source.variable(variable)?;
        let shape = self.source.variable_shape(variable)?;
        let ranges = slice.resolve(&shape)?;
        let (Some(record_dim), Some(records)) = (shape.first(), ranges.first()) else {
            return Err(GridProcessorError::invalid_schema(format!(
                "'{}' has no growable dimension",
                variable
            )));
        };
        let block: usize = ranges[1..].iter().map(|r| r.length).product();

        // One extra leading record supplies the predecessor of the first step.
        let lead = usize::from(records.start > 0);
        let extended = slice.clone().restrict(
            record_dim.name.as_str(),
            records.start - lead,
            records.length + lead,
        );
        let raw = self.source.read_raw_slice(variable, &extended)?;
        let expected = (records.length + lead) * block;
        if raw.len() != expected {
            return Err(GridProcessorError::size_mismatch(expected, raw.len()));
        }

        let packing = Packing::from_source(&self.source, &var)?;
        let mut values = raw.to_f64_vec();
        packing.unpack_all(&mut values, self.parallel_threshold);

        let mut steps = Vec::with_capacity(records.length * block);
        for k in lead..records.length + lead {
            let current = &values[k * block..(k + 1) * block];
            if k == 0 {
                steps.extend_from_slice(current);
            } else {
                let previous = &values[(k - 1) * block..k * block];
                steps.extend(current.iter().zip(previous).map(|(c, p)| c - p));
            }
        }

        packing.pack_all(&mut steps, self.parallel_threshold);
        debug!(
            variable = %variable,
            start = records.start,
            records = records.length,
            "De-accumulated slice"
        );
        Ok(DataBuffer::from_f64(var.data_type, &steps, Narrowing::Round))
    }
}

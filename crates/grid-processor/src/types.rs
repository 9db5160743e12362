//! Core data model: dimensions, variables and dataset schemas.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Upper bound on the number of dimensions of one variable.
pub const MAX_RANK: usize = 32;

/// Element type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    Float32,
    Float64,
}

impl DataType {
    /// Check whether values of this type are integers.
    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    /// Check whether values of this type are floating point.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Size of one element in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::UInt8 => "uint8",
            Self::Int16 => "int16",
            Self::UInt16 => "uint16",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named axis of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub length: usize,
    /// The record dimension; its length grows as data is appended.
    pub growable: bool,
}

impl Dimension {
    /// A fixed-length dimension.
    pub fn new(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            growable: false,
        }
    }

    /// A growable (record) dimension.
    pub fn growable(name: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            length,
            growable: true,
        }
    }
}

/// A variable: an N-dimensional array over named dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Dimension names, outermost first. Defines the buffer layout.
    pub dimensions: Vec<String>,
    pub data_type: DataType,
    /// Physical unit of unpacked values.
    pub units: Option<String>,
    /// Raw value marking missing data.
    pub missing_value: Option<f64>,
    /// Packing: `physical = raw * scale_factor + add_offset`.
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
}

impl Variable {
    pub fn new(name: impl Into<String>, dimensions: &[&str], data_type: DataType) -> Self {
        Self {
            name: name.into(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            data_type,
            units: None,
            missing_value: None,
            scale_factor: None,
            add_offset: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_missing_value(mut self, value: f64) -> Self {
        self.missing_value = Some(value);
        self
    }

    pub fn with_packing(mut self, scale_factor: f64, add_offset: f64) -> Self {
        self.scale_factor = Some(scale_factor);
        self.add_offset = Some(add_offset);
        self
    }

    /// `(scale_factor, add_offset)` with defaults of 1 and 0.
    pub fn packing(&self) -> (f64, f64) {
        (
            self.scale_factor.unwrap_or(1.0),
            self.add_offset.unwrap_or(0.0),
        )
    }

    /// Check whether raw values differ from physical values.
    pub fn is_packed(&self) -> bool {
        self.packing() != (1.0, 0.0)
    }

    /// Check whether a raw value is the missing marker. A NaN marker matches NaN.
    #[inline]
    pub fn is_missing(&self, raw: f64) -> bool {
        matches_marker(raw, self.missing_value)
    }
}

#[inline]
pub(crate) fn matches_marker(raw: f64, marker: Option<f64>) -> bool {
    match marker {
        Some(marker) if marker.is_nan() => raw.is_nan(),
        Some(marker) => raw == marker,
        None => false,
    }
}

/// Dimensions and variables of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    dimensions: Vec<Dimension>,
    variables: Vec<Variable>,
}

impl Schema {
    /// Build a schema, checking it against the data model rules.
    pub fn new(dimensions: Vec<Dimension>, variables: Vec<Variable>) -> Result<Self> {
        let schema = Self {
            dimensions,
            variables,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the data model rules:
    /// unique names, at most one growable dimension, known variable
    /// dimensions, bounded rank, and the growable dimension outermost.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for dim in &self.dimensions {
            if !names.insert(dim.name.as_str()) {
                return Err(GridProcessorError::invalid_schema(format!(
                    "duplicate dimension '{}'",
                    dim.name
                )));
            }
        }

        let growable: Vec<_> = self.dimensions.iter().filter(|d| d.growable).collect();
        if growable.len() > 1 {
            return Err(GridProcessorError::invalid_schema(format!(
                "{} growable dimensions, at most one allowed",
                growable.len()
            )));
        }

        let mut var_names = HashSet::new();
        for var in &self.variables {
            if !var_names.insert(var.name.as_str()) {
                return Err(GridProcessorError::invalid_schema(format!(
                    "duplicate variable '{}'",
                    var.name
                )));
            }
            if var.dimensions.len() > MAX_RANK {
                return Err(GridProcessorError::invalid_schema(format!(
                    "variable '{}' has {} dimensions, at most {} allowed",
                    var.name,
                    var.dimensions.len(),
                    MAX_RANK
                )));
            }
            let mut seen = HashSet::new();
            for (position, name) in var.dimensions.iter().enumerate() {
                let dim = self.dimension(name).ok_or_else(|| {
                    GridProcessorError::invalid_schema(format!(
                        "variable '{}' uses unknown dimension '{}'",
                        var.name, name
                    ))
                })?;
                if !seen.insert(name.as_str()) {
                    return Err(GridProcessorError::invalid_schema(format!(
                        "variable '{}' repeats dimension '{}'",
                        var.name, name
                    )));
                }
                if dim.growable && position != 0 {
                    return Err(GridProcessorError::invalid_schema(format!(
                        "growable dimension '{}' must be outermost in '{}'",
                        name, var.name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// The growable dimension, if the dataset has one.
    pub fn growable_dimension(&self) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.growable)
    }

    /// Ordered dimensions of a variable.
    pub fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        let var = self
            .variable(name)
            .ok_or_else(|| GridProcessorError::unknown_variable(name))?;
        var.dimensions
            .iter()
            .map(|d| {
                self.dimension(d)
                    .cloned()
                    .ok_or_else(|| GridProcessorError::unknown_dimension(d.as_str()))
            })
            .collect()
    }

    /// Grow a dimension. Only the growable dimension may change, and only upward.
    pub fn extend_dimension(&mut self, name: &str, length: usize) -> Result<()> {
        let dim = self
            .dimensions
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| GridProcessorError::unknown_dimension(name))?;
        if !dim.growable {
            return Err(GridProcessorError::invalid_schema(format!(
                "dimension '{}' is not growable",
                name
            )));
        }
        dim.length = dim.length.max(length);
        Ok(())
    }
}

/// Element count of a shape.
pub fn shape_size(shape: &[Dimension]) -> usize {
    shape.iter().map(|d| d.length).product()
}

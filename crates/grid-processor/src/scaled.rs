//! Unit-aware slice reads and writes.
//!
//! [`ScaledSliceAccess`] sits on top of a backend and hands out slices in
//! the unit the caller asks for. Reads unpack raw values and convert them
//! from the variable's native unit; writes run the same pipeline backwards.
//! Missing values never go through either formula.

use tracing::debug;
use units::{UnitSystem, UnitsConverter};

use crate::config::{GridProcessorConfig, ScaledOutput};
use crate::data::DataBuffer;
use crate::error::{GridProcessorError, Result};
use crate::packing::{map_values, Packing};
use crate::slice::SliceSpec;
use crate::source::{DataSink, DataSource};
use crate::types::{DataType, Dimension};

/// Which part of a variable to access.
#[derive(Debug, Clone, Copy)]
pub enum SliceSelector<'a> {
    /// An explicit slice.
    Spec(&'a SliceSpec),
    /// One position of the growable dimension, everything else in full.
    Position(usize),
}

impl<'a> From<&'a SliceSpec> for SliceSelector<'a> {
    fn from(spec: &'a SliceSpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<usize> for SliceSelector<'_> {
    fn from(position: usize) -> Self {
        Self::Position(position)
    }
}

impl SliceSelector<'_> {
    fn to_spec(self, shape: &[Dimension]) -> SliceSpec {
        match self {
            Self::Spec(spec) => spec.clone(),
            Self::Position(position) => SliceSpec::at_position(shape, position),
        }
    }
}

/// Reads and writes slices of a backend's variables in caller-chosen units.
pub struct ScaledSliceAccess<S> {
    source: S,
    units: UnitSystem,
    config: GridProcessorConfig,
}

impl<S: DataSource> ScaledSliceAccess<S> {
    /// Wrap a backend with the default configuration.
    pub fn new(source: S) -> Result<Self> {
        Self::with_config(source, GridProcessorConfig::default())
    }

    pub fn with_config(source: S, config: GridProcessorConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::Config)?;
        Ok(Self {
            source,
            units: UnitSystem::new()?,
            config,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &GridProcessorConfig {
        &self.config
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read a slice of `variable` converted to `target_unit`.
    ///
    /// Without a target unit only the packing is undone. Missing values are
    /// copied through unchanged. The element type of the result follows
    /// [`ScaledOutput`].
    pub fn get_scaled_slice<'a>(
        &self,
        variable: &str,
        selector: impl Into<SliceSelector<'a>>,
        target_unit: Option<&str>,
    ) -> Result<DataBuffer> {
        let var = self.source.variable(variable)?;
        let shape = self.source.variable_shape(variable)?;
        let spec = selector.into().to_spec(&shape);
        let expected = element_count(&spec, &shape)?;

        let converter = match target_unit {
            Some(unit) => {
                let native = self.source.native_unit(variable)?;
                self.converter(native.as_deref().unwrap_or(""), unit)?
            }
            None => UnitsConverter::identity(),
        };

        let raw = self.source.read_raw_slice(variable, &spec)?;
        if raw.len() != expected {
            return Err(GridProcessorError::size_mismatch(expected, raw.len()));
        }

        let packing = Packing::from_source(&self.source, &var)?;
        let identity = packing.is_identity() && converter.is_identity();
        debug!(
            variable = %variable,
            elements = raw.len(),
            target_unit = ?target_unit,
            identity = identity,
            "getScaledSlice"
        );

        if identity && self.config.scaled_output == ScaledOutput::Native {
            return Ok(raw);
        }

        let mut values = raw.to_f64_vec();
        if !identity {
            map_values(&mut values, self.config.parallel_threshold, |x| {
                if packing.is_missing(x) {
                    x
                } else {
                    converter.convert(packing.unpack(x))
                }
            });
        }

        Ok(match output_type(self.config.scaled_output, raw.data_type()) {
            DataType::Float32 => DataBuffer::Float32(values.into_iter().map(|v| v as f32).collect()),
            _ => DataBuffer::Float64(values),
        })
    }

    fn converter(&self, from: &str, to: &str) -> Result<UnitsConverter> {
        let converter = self.units.get_converter(from, to)?;
        Ok(converter.linearized().unwrap_or(converter))
    }
}

impl<S: DataSink> ScaledSliceAccess<S> {
    /// Write `data`, given in `source_unit`, into a slice of `variable`.
    ///
    /// An empty buffer is a no-op: nothing is validated or written. Values
    /// equal to the missing marker, and NaN when the variable has a marker,
    /// are stored as the marker.
    pub fn put_scaled_slice<'a>(
        &self,
        variable: &str,
        selector: impl Into<SliceSelector<'a>>,
        data: &DataBuffer,
        source_unit: Option<&str>,
    ) -> Result<()> {
        if data.is_empty() {
            debug!(variable = %variable, "putScaledSlice with empty buffer, nothing to write");
            return Ok(());
        }

        let var = self.source.variable(variable)?;
        let mut shape = self.source.variable_shape(variable)?;
        let spec = selector.into().to_spec(&shape);

        if let Some(required) = spec.required_growable_length(&shape) {
            if let Some(dim) = shape.iter_mut().find(|d| d.growable) {
                dim.length = dim.length.max(required);
            }
        }
        let expected = element_count(&spec, &shape)?;
        if data.len() != expected {
            return Err(GridProcessorError::size_mismatch(expected, data.len()));
        }

        let converter = match source_unit {
            Some(unit) => {
                let native = self.source.native_unit(variable)?;
                self.converter(unit, native.as_deref().unwrap_or(""))?
            }
            None => UnitsConverter::identity(),
        };
        let packing = Packing::from_source(&self.source, &var)?;
        let identity = packing.is_identity() && converter.is_identity();
        debug!(
            variable = %variable,
            elements = data.len(),
            source_unit = ?source_unit,
            identity = identity,
            "putScaledSlice"
        );

        let narrowing = self.source.narrowing().unwrap_or(self.config.narrowing);
        // integer input holds no NaN, so only float input can need the marker
        let unchanged = identity
            && data.data_type() == var.data_type
            && (packing.missing_value.is_none() || !data.data_type().is_float());
        let raw = if unchanged {
            data.clone()
        } else {
            let mut values = data.to_f64_vec();
            map_values(&mut values, self.config.parallel_threshold, |x| {
                match packing.missing_value {
                    Some(marker) if x.is_nan() || packing.is_missing(x) => marker,
                    _ if identity => x,
                    _ => packing.pack(converter.convert(x)),
                }
            });
            DataBuffer::from_f64(var.data_type, &values, narrowing)
        };

        self.source.write_raw_slice(variable, &spec, &raw)
    }
}

fn element_count(spec: &SliceSpec, shape: &[Dimension]) -> Result<usize> {
    Ok(spec.resolve(shape)?.iter().map(|r| r.length).product())
}

fn output_type(policy: ScaledOutput, raw: DataType) -> DataType {
    match policy {
        ScaledOutput::Float32 => DataType::Float32,
        ScaledOutput::Float64 => DataType::Float64,
        ScaledOutput::Native if raw == DataType::Float32 => DataType::Float32,
        ScaledOutput::Native => DataType::Float64,
    }
}

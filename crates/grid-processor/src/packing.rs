//! In-file packing of variable values.
//!
//! Stored ("raw") values relate to physical values by
//! `physical = raw * scale_factor + add_offset`. Raw values equal to the
//! variable's missing marker carry no physical value.

use rayon::prelude::*;

use crate::error::Result;
use crate::source::DataSource;
use crate::types::{matches_marker, Variable};

/// Packing attributes of one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Packing {
    pub scale_factor: f64,
    pub add_offset: f64,
    pub missing_value: Option<f64>,
}

impl Packing {
    pub fn of(variable: &Variable) -> Self {
        let (scale_factor, add_offset) = variable.packing();
        Self {
            scale_factor,
            add_offset,
            missing_value: variable.missing_value,
        }
    }

    /// Packing of `variable` with the missing marker `source` reports for it.
    pub fn from_source<S: DataSource + ?Sized>(source: &S, variable: &Variable) -> Result<Self> {
        Ok(Self {
            missing_value: source.missing_value_marker(&variable.name)?,
            ..Self::of(variable)
        })
    }

    /// Check whether raw and physical values coincide.
    pub fn is_identity(&self) -> bool {
        self.scale_factor == 1.0 && self.add_offset == 0.0
    }

    #[inline]
    pub fn is_missing(&self, raw: f64) -> bool {
        matches_marker(raw, self.missing_value)
    }

    #[inline]
    pub fn unpack(&self, raw: f64) -> f64 {
        raw * self.scale_factor + self.add_offset
    }

    #[inline]
    pub fn pack(&self, physical: f64) -> f64 {
        (physical - self.add_offset) / self.scale_factor
    }

    /// Raw values to physical ones; missing values become NaN.
    pub fn unpack_all(&self, raw: &mut [f64], parallel_threshold: usize) {
        let packing = *self;
        map_values(raw, parallel_threshold, move |x| {
            if packing.is_missing(x) {
                f64::NAN
            } else {
                packing.unpack(x)
            }
        });
    }

    /// Physical values to raw ones; NaN becomes the missing marker when
    /// the variable has one.
    pub fn pack_all(&self, physical: &mut [f64], parallel_threshold: usize) {
        let packing = *self;
        map_values(physical, parallel_threshold, move |x| match packing.missing_value {
            Some(marker) if x.is_nan() => marker,
            _ => packing.pack(x),
        });
    }
}

/// Apply `f` to every value, on rayon when there are at least
/// `parallel_threshold` of them.
pub(crate) fn map_values<F>(values: &mut [f64], parallel_threshold: usize, f: F)
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    if values.len() >= parallel_threshold {
        values.par_iter_mut().for_each(|v| *v = f(*v));
    } else {
        values.iter_mut().for_each(|v| *v = f(*v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn test_unpack_pack() {
        let var = Variable::new("t", &[], DataType::Int16)
            .with_packing(0.01, 273.15)
            .with_missing_value(-32768.0);
        let packing = Packing::of(&var);
        assert!(!packing.is_identity());
        assert!((packing.unpack(100.0) - 274.15).abs() < 1e-9);
        assert!((packing.pack(274.15) - 100.0).abs() < 1e-6);

        let mut values = vec![100.0, -32768.0];
        packing.unpack_all(&mut values, usize::MAX);
        assert!((values[0] - 274.15).abs() < 1e-9);
        assert!(values[1].is_nan());

        packing.pack_all(&mut values, 1);
        assert!((values[0] - 100.0).abs() < 1e-6);
        assert_eq!(values[1], -32768.0);
    }

    #[test]
    fn test_nan_without_marker_stays_nan() {
        let packing = Packing::of(&Variable::new("v", &[], DataType::Float32));
        let mut values = vec![f64::NAN];
        packing.pack_all(&mut values, usize::MAX);
        assert!(values[0].is_nan());
    }
}

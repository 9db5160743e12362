//! Value converters between two units.

use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::{Result, UnitsError};
use crate::system;

/// Maximum deviation from the affine prediction still considered linear.
const LINEARITY_TOLERANCE: f64 = 1e-5;

/// Maximum change accepted when refining the scale away from the offset.
const SCALE_REFINEMENT_TOLERANCE: f64 = 1e-3;

/// Sample points checked after the (0, 1) calibration.
const LINEARITY_SAMPLES: [f64; 4] = [10.0, 100.0, 1000.0, -1000.0];

/// Element count above which slice conversion is spread over rayon.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

type ConvertFn = dyn Fn(f64) -> f64 + Send + Sync;

#[derive(Clone)]
enum Kind {
    Linear { scale: f64, offset: f64 },
    General {
        func: Arc<ConvertFn>,
        /// Evaluate under the unit-system lock.
        serialized: bool,
    },
}

/// Converts values from one unit to another.
///
/// A converter is either *linear* (`to = scale * from + offset`, no locking)
/// or *general* (an arbitrary function). Whether a general converter is
/// affine is determined by sampling, see [`UnitsConverter::is_linear`].
#[derive(Clone)]
pub struct UnitsConverter {
    kind: Kind,
}

impl UnitsConverter {
    /// The identity conversion (scale 1, offset 0).
    pub fn identity() -> Self {
        Self::linear(1.0, 0.0)
    }

    /// A linear conversion `to = scale * from + offset`.
    pub fn linear(scale: f64, offset: f64) -> Self {
        Self {
            kind: Kind::Linear { scale, offset },
        }
    }

    /// A general conversion from an arbitrary function.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            kind: Kind::General {
                func: Arc::new(func),
                serialized: false,
            },
        }
    }

    /// A general conversion backed by the unit registry's evaluator.
    pub(crate) fn from_registry<F>(func: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            kind: Kind::General {
                func: Arc::new(func),
                serialized: true,
            },
        }
    }

    /// Convert a single value.
    #[inline]
    pub fn convert(&self, from: f64) -> f64 {
        match &self.kind {
            Kind::Linear { scale, offset } => scale * from + offset,
            Kind::General { func, serialized } => {
                if *serialized {
                    let _guard = system::evaluator_lock();
                    func(from)
                } else {
                    func(from)
                }
            }
        }
    }

    /// Convert a single `f32` value.
    #[inline]
    pub fn convert_f32(&self, from: f32) -> f32 {
        match &self.kind {
            Kind::Linear { scale, offset } => (*scale as f32) * from + (*offset as f32),
            Kind::General { .. } => self.convert(f64::from(from)) as f32,
        }
    }

    /// Check whether the conversion is affine.
    ///
    /// Calibrates offset and slope at 0 and 1, then requires the samples at
    /// 10, 100, 1000 and -1000 to be finite and within 1e-5 of the
    /// affine prediction.
    pub fn is_linear(&self) -> bool {
        match &self.kind {
            Kind::Linear { .. } => true,
            Kind::General { .. } => {
                let offset = self.convert(0.0);
                if !offset.is_finite() {
                    return false;
                }
                let slope = self.convert(1.0) - offset;
                if !slope.is_finite() {
                    return false;
                }
                LINEARITY_SAMPLES.iter().all(|&x| {
                    let value = self.convert(x);
                    value.is_finite() && (value - (x * slope + offset)).abs() <= LINEARITY_TOLERANCE
                })
            }
        }
    }

    /// The `(scale, offset)` pair of a linear conversion.
    ///
    /// Fails with [`UnitsError::NonLinear`] when [`is_linear`](Self::is_linear)
    /// is false. When scale and offset are both nonzero the scale is
    /// re-evaluated at `-offset/scale` and the refined value is kept only if
    /// it differs by less than 1e-3.
    pub fn scale_offset(&self) -> Result<(f64, f64)> {
        match &self.kind {
            Kind::Linear { scale, offset } => Ok((*scale, *offset)),
            Kind::General { .. } => {
                if !self.is_linear() {
                    return Err(UnitsError::non_linear(
                        "cannot get scale and offset of non-linear function",
                    ));
                }
                let offset = self.convert(0.0);
                let mut scale = self.convert(1.0) - offset;
                if scale != 0.0 && offset != 0.0 {
                    let x = -offset / scale;
                    if x.is_finite() && x != 0.0 {
                        let refined = (self.convert(x) - offset) / x;
                        if (scale - refined).abs() < SCALE_REFINEMENT_TOLERANCE {
                            scale = refined;
                        }
                    }
                }
                Ok((scale, offset))
            }
        }
    }

    /// The lock-free linear form of this converter, if it is affine.
    pub fn linearized(&self) -> Option<UnitsConverter> {
        match &self.kind {
            Kind::Linear { .. } => Some(self.clone()),
            Kind::General { .. } => self
                .scale_offset()
                .ok()
                .map(|(scale, offset)| Self::linear(scale, offset)),
        }
    }

    /// Check whether this is the identity conversion.
    pub fn is_identity(&self) -> bool {
        matches!(self.kind, Kind::Linear { scale, offset } if scale == 1.0 && offset == 0.0)
    }

    /// Convert a buffer in place.
    pub fn convert_slice(&self, values: &mut [f64]) {
        match &self.kind {
            Kind::Linear { scale, offset } => {
                let (scale, offset) = (*scale, *offset);
                if values.len() >= PARALLEL_THRESHOLD {
                    values.par_iter_mut().for_each(|v| *v = scale * *v + offset);
                } else {
                    values.iter_mut().for_each(|v| *v = scale * *v + offset);
                }
            }
            Kind::General { .. } => values.iter_mut().for_each(|v| *v = self.convert(*v)),
        }
    }

    /// Convert an `f32` buffer in place.
    pub fn convert_slice_f32(&self, values: &mut [f32]) {
        match &self.kind {
            Kind::Linear { scale, offset } => {
                let (scale, offset) = (*scale as f32, *offset as f32);
                if values.len() >= PARALLEL_THRESHOLD {
                    values.par_iter_mut().for_each(|v| *v = scale * *v + offset);
                } else {
                    values.iter_mut().for_each(|v| *v = scale * *v + offset);
                }
            }
            Kind::General { .. } => values.iter_mut().for_each(|v| *v = self.convert_f32(*v)),
        }
    }
}

impl fmt::Debug for UnitsConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Linear { scale, offset } => f
                .debug_struct("UnitsConverter::Linear")
                .field("scale", scale)
                .field("offset", offset)
                .finish(),
            Kind::General { serialized, .. } => f
                .debug_struct("UnitsConverter::General")
                .field("serialized", serialized)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let c = UnitsConverter::identity();
        assert!(c.is_identity());
        assert!(c.is_linear());
        assert_eq!(c.scale_offset().unwrap(), (1.0, 0.0));
        assert_eq!(c.convert(42.5), 42.5);
    }

    #[test]
    fn test_general_affine_is_linear() {
        let c = UnitsConverter::from_fn(|x| 1.8 * x + 32.0);
        assert!(c.is_linear());
        let (scale, offset) = c.scale_offset().unwrap();
        assert!((scale - 1.8).abs() < 1e-12);
        assert!((offset - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_sine_perturbation_is_not_linear() {
        let c = UnitsConverter::from_fn(|x| x + x.sin() * 1000.0);
        assert!(!c.is_linear());
        assert!(matches!(c.scale_offset(), Err(UnitsError::NonLinear(_))));
        assert!(c.linearized().is_none());
    }

    #[test]
    fn test_non_finite_samples_are_not_linear() {
        let c = UnitsConverter::from_fn(|x| 1.0 / x);
        assert!(!c.is_linear());
        let d = UnitsConverter::from_fn(|x| if x < 0.0 { f64::NAN } else { x });
        assert!(!d.is_linear());
    }

    #[test]
    fn test_small_deviation_tolerated() {
        let c = UnitsConverter::from_fn(|x| if x == 1000.0 { 1000.0 + 5e-6 } else { x });
        assert!(c.is_linear());
        let d = UnitsConverter::from_fn(|x| if x == 1000.0 { 1000.0 + 5e-5 } else { x });
        assert!(!d.is_linear());
    }

    #[test]
    fn test_refinement_rejected_when_far() {
        // slope between 0 and 1 is 2, but at -offset/scale = -50 the secant is 3
        let c = UnitsConverter::from_fn(|x| if x == -50.0 { 100.0 - 150.0 } else { 2.0 * x + 100.0 });
        let (scale, offset) = c.scale_offset().unwrap();
        assert_eq!(offset, 100.0);
        assert_eq!(scale, 2.0);
    }

    #[test]
    fn test_refinement_accepted_when_close() {
        let c = UnitsConverter::from_fn(|x| if x == -50.0 { 100.0 - 100.0002 } else { 2.0 * x + 100.0 });
        let (scale, _) = c.scale_offset().unwrap();
        assert!((scale - 2.000004).abs() < 1e-9);
    }

    #[test]
    fn test_linearized_general() {
        let c = UnitsConverter::from_fn(|x| x * 0.001);
        let lin = c.linearized().unwrap();
        assert!((lin.convert(2500.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_convert_slice_large_parallel() {
        let c = UnitsConverter::linear(2.0, 1.0);
        let mut values = vec![1.0f64; PARALLEL_THRESHOLD + 10];
        c.convert_slice(&mut values);
        assert!(values.iter().all(|v| *v == 3.0));

        let mut floats = vec![1.0f32; 8];
        c.convert_slice_f32(&mut floats);
        assert!(floats.iter().all(|v| *v == 3.0));
    }
}

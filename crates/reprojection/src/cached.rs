//! Reusable vector reprojection for one pair of grids.

use std::sync::Arc;

use nalgebra::Vector2;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ReprojectionError, Result};
use crate::matrix::{rotation_angle, ReprojectionMatrix};

/// Cell count above which reprojection is spread over rayon.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256 * 1024;

/// Applies a shared [`ReprojectionMatrix`] to vector and direction buffers.
///
/// Holds no mutable state; one instance can be used from many threads.
#[derive(Debug, Clone)]
pub struct CachedVectorReprojection {
    matrix: Arc<ReprojectionMatrix>,
    parallel_threshold: usize,
}

impl CachedVectorReprojection {
    pub fn new(matrix: Arc<ReprojectionMatrix>) -> Self {
        Self {
            matrix,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the cell count above which work is parallelized.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn matrix(&self) -> &Arc<ReprojectionMatrix> {
        &self.matrix
    }

    pub fn x_size(&self) -> usize {
        self.matrix.x_size()
    }

    pub fn y_size(&self) -> usize {
        self.matrix.y_size()
    }

    fn check_size(&self, size: usize, buffers: &[usize]) -> Result<()> {
        let expected = self.matrix.len();
        if size != expected {
            return Err(ReprojectionError::size_mismatch(expected, size));
        }
        if let Some(&actual) = buffers.iter().find(|&&len| len != size) {
            return Err(ReprojectionError::size_mismatch(size, actual));
        }
        Ok(())
    }

    /// Transform `(u, v)` component pairs in place, one matrix cell per pair.
    ///
    /// `size` must equal `x_size * y_size` and both buffer lengths.
    pub fn reproject_values(&self, u: &mut [f32], v: &mut [f32], size: usize) -> Result<()> {
        self.check_size(size, &[u.len(), v.len()])?;
        debug!(cells = size, "Reprojecting vector components");

        let apply = |((u, v), m): ((&mut f32, &mut f32), &nalgebra::Matrix2<f32>)| {
            let out = m * Vector2::new(*u, *v);
            *u = out.x;
            *v = out.y;
        };

        let cells = self.matrix.cells();
        if size >= self.parallel_threshold {
            u.par_iter_mut()
                .zip(v.par_iter_mut())
                .zip(cells.par_iter())
                .for_each(apply);
        } else {
            u.iter_mut().zip(v.iter_mut()).zip(cells.iter()).for_each(apply);
        }
        Ok(())
    }

    /// Rotate direction angles (degrees, counterclockwise from the x axis)
    /// in place by the rotation part of each cell, normalized to `[0, 360)`.
    pub fn reproject_direction_values(&self, angles: &mut [f32], size: usize) -> Result<()> {
        self.check_size(size, &[angles.len()])?;
        debug!(cells = size, "Reprojecting direction values");

        let cells = self.matrix.cells();
        if size >= self.parallel_threshold {
            angles
                .par_iter_mut()
                .zip(cells.par_iter())
                .for_each(|(a, m)| *a = rotate_direction(*a, rotation_angle(m)));
        } else {
            angles
                .iter_mut()
                .zip(cells.iter())
                .for_each(|(a, m)| *a = rotate_direction(*a, rotation_angle(m)));
        }
        Ok(())
    }
}

/// Rotate a direction in degrees by `rotation` radians, result in `[0, 360)`.
#[inline]
fn rotate_direction(degrees: f32, rotation: f64) -> f32 {
    let (sin, cos) = (f64::from(degrees).to_radians() + rotation).sin_cos();
    let out = sin.atan2(cos).to_degrees().rem_euclid(360.0) as f32;
    // rounding can land exactly on 360
    if out >= 360.0 {
        0.0
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotation_90() -> Arc<ReprojectionMatrix> {
        Arc::new(ReprojectionMatrix::from_coefficients(1, 1, &[0.0, -1.0, 1.0, 0.0]).unwrap())
    }

    #[test]
    fn test_rotate_direction_normalizes() {
        assert!((rotate_direction(350.0, 20f64.to_radians()) - 10.0).abs() < 1e-4);
        assert!((rotate_direction(10.0, -20f64.to_radians()) - 350.0).abs() < 1e-4);
        assert!(rotate_direction(f32::NAN, 0.1).is_nan());
    }

    #[test]
    fn test_tiny_negative_rounds_to_zero() {
        let out = rotate_direction(-1e-9, 0.0);
        assert!((0.0..360.0).contains(&out));
    }

    #[test]
    fn test_size_mismatch() {
        let r = CachedVectorReprojection::new(rotation_90());
        let mut u = vec![1.0f32; 2];
        let mut v = vec![0.0f32; 2];
        assert_eq!(
            r.reproject_values(&mut u, &mut v, 2),
            Err(ReprojectionError::SizeMismatch {
                expected: 1,
                actual: 2
            })
        );
        // Buffers untouched
        assert_eq!(u, vec![1.0, 1.0]);
    }

    #[test]
    fn test_buffer_length_must_match_size() {
        let r = CachedVectorReprojection::new(rotation_90());
        let mut u = vec![1.0f32];
        let mut v: Vec<f32> = Vec::new();
        assert!(matches!(
            r.reproject_values(&mut u, &mut v, 1),
            Err(ReprojectionError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_parallel_path_matches_serial() {
        let angles: Vec<f64> = (0..64).map(|i| i as f64 * 0.1).collect();
        let matrix = Arc::new(ReprojectionMatrix::from_rotation_angles(8, 8, &angles).unwrap());
        let serial = CachedVectorReprojection::new(matrix.clone());
        let parallel = CachedVectorReprojection::new(matrix).with_parallel_threshold(1);

        let mut u1: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let mut v1: Vec<f32> = (0..64).map(|i| 64.0 - i as f32).collect();
        let (mut u2, mut v2) = (u1.clone(), v1.clone());

        serial.reproject_values(&mut u1, &mut v1, 64).unwrap();
        parallel.reproject_values(&mut u2, &mut v2, 64).unwrap();
        assert_eq!(u1, u2);
        assert_eq!(v1, v2);
    }
}

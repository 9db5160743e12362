//! Per-cell vector transforms between two grid coordinate systems.

use nalgebra::{Matrix2, Rotation2};
use tracing::debug;

use crate::error::{ReprojectionError, Result};
use crate::projection::GridProjection;

/// Immutable table of 2x2 transforms, one per grid cell.
///
/// Cells are stored in the flattened order of the grid buffers
/// (`index = y * x_size + x`). The matrix maps source components `(u, v)` to
/// target components: `u' = m00*u + m01*v`, `v' = m10*u + m11*v`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprojectionMatrix {
    x_size: usize,
    y_size: usize,
    cells: Vec<Matrix2<f32>>,
}

impl ReprojectionMatrix {
    /// Build from per-cell matrices. `cells.len()` must equal `x_size * y_size`.
    pub fn new(x_size: usize, y_size: usize, cells: Vec<Matrix2<f32>>) -> Result<Self> {
        let expected = cell_count(x_size, y_size)?;
        if cells.len() != expected {
            return Err(ReprojectionError::invalid_matrix(format!(
                "{} cells given for a {}x{} grid",
                cells.len(),
                x_size,
                y_size
            )));
        }
        if cells.iter().any(|m| m.iter().any(|c| !c.is_finite())) {
            return Err(ReprojectionError::invalid_matrix("non-finite coefficient"));
        }
        Ok(Self {
            x_size,
            y_size,
            cells,
        })
    }

    /// Build from a flat coefficient array, four row-major values per cell
    /// (`m00, m01, m10, m11`).
    pub fn from_coefficients(x_size: usize, y_size: usize, coefficients: &[f32]) -> Result<Self> {
        if coefficients.len() % 4 != 0 {
            return Err(ReprojectionError::invalid_matrix(format!(
                "coefficient count {} is not a multiple of 4",
                coefficients.len()
            )));
        }
        let cells = coefficients
            .chunks_exact(4)
            .map(|c| Matrix2::new(c[0], c[1], c[2], c[3]))
            .collect();
        Self::new(x_size, y_size, cells)
    }

    /// A matrix that leaves every vector unchanged.
    pub fn identity(x_size: usize, y_size: usize) -> Result<Self> {
        Ok(Self {
            x_size,
            y_size,
            cells: vec![Matrix2::identity(); cell_count(x_size, y_size)?],
        })
    }

    /// Pure rotations, one counterclockwise angle in radians per cell.
    pub fn from_rotation_angles(x_size: usize, y_size: usize, angles: &[f64]) -> Result<Self> {
        let cells = angles
            .iter()
            .map(|&angle| Rotation2::new(angle).into_inner().cast::<f32>())
            .collect();
        Self::new(x_size, y_size, cells)
    }

    /// Rotations taking components along `source` grid axes to components
    /// along `target` grid axes, evaluated at every target cell.
    pub fn between(source: &dyn GridProjection, target: &dyn GridProjection) -> Result<Self> {
        let (nx, ny) = target.dimensions();
        let mut angles = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let (lat, lon) = target.grid_to_geo(i as f64, j as f64);
                let angle = target.north_angle(lat, lon) - source.north_angle(lat, lon);
                if !angle.is_finite() {
                    return Err(ReprojectionError::projection(format!(
                        "no rotation at cell ({}, {})",
                        i, j
                    )));
                }
                angles.push(angle);
            }
        }
        debug!(x_size = nx, y_size = ny, "Built reprojection matrix");
        Self::from_rotation_angles(nx, ny, &angles)
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// Number of cells (`x_size * y_size`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The transform of one cell.
    pub fn cell(&self, index: usize) -> Option<&Matrix2<f32>> {
        self.cells.get(index)
    }

    pub fn cells(&self) -> &[Matrix2<f32>] {
        &self.cells
    }
}

/// Angle in radians of the rotation part of a 2x2 transform.
///
/// Any scale or shear is discarded; for a pure rotation this is its angle.
#[inline]
pub fn rotation_angle(m: &Matrix2<f32>) -> f64 {
    let (m00, m01) = (f64::from(m[(0, 0)]), f64::from(m[(0, 1)]));
    let (m10, m11) = (f64::from(m[(1, 0)]), f64::from(m[(1, 1)]));
    (m10 - m01).atan2(m00 + m11)
}

fn cell_count(x_size: usize, y_size: usize) -> Result<usize> {
    x_size
        .checked_mul(y_size)
        .ok_or_else(|| ReprojectionError::invalid_matrix("grid size overflows"))
}

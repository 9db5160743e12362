//! Grid projections that produce reprojection matrices.
//!
//! A grid's local axes are rotated against true east/north by an angle that
//! depends on position. [`GridProjection::north_angle`] reports that angle so
//! that [`ReprojectionMatrix::between`](crate::ReprojectionMatrix::between)
//! can rotate vector components from one grid's axes into another's.

mod lambert;
mod latlon;
mod polar;

pub use lambert::{LambertConformal, LambertParams};
pub use latlon::LatLonGrid;
pub use polar::{Hemisphere, PolarParams, PolarStereographic};

use std::f64::consts::PI;

/// A two-dimensional grid georeferenced by a projection.
pub trait GridProjection: Send + Sync {
    /// Grid size as `(nx, ny)`.
    fn dimensions(&self) -> (usize, usize);

    /// Geographic position `(lat, lon)` in degrees of grid index `(i, j)`.
    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64);

    /// Counterclockwise angle in radians from the grid's +y axis to true
    /// north at `(lat, lon)` degrees.
    ///
    /// Vector components along the grid axes are obtained from east/north
    /// components by a rotation of this angle.
    fn north_angle(&self, lat_deg: f64, lon_deg: f64) -> f64;
}

/// Wrap a longitude difference in radians into `[-π, π]`.
pub(crate) fn wrap_longitude(mut dlon: f64) -> f64 {
    while dlon > PI {
        dlon -= 2.0 * PI;
    }
    while dlon < -PI {
        dlon += 2.0 * PI;
    }
    dlon
}

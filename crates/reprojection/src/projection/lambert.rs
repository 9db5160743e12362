//! Lambert Conformal Conic projection.
//!
//! Commonly used for regional weather models such as HRRR. The cone is
//! tangent or secant to the sphere at the standard parallels; meridians are
//! straight lines converging at the cone apex, so a grid's y axis only
//! points north along the central meridian (LoV).

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{wrap_longitude, GridProjection};
use crate::error::{ReprojectionError, Result};

/// Mean earth radius used for meteorological grids (meters).
pub const EARTH_RADIUS: f64 = 6_371_229.0;

/// Lambert Conformal grid definition, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambertParams {
    /// Latitude of first grid point
    pub lat1: f64,
    /// Longitude of first grid point
    pub lon1: f64,
    /// Central meridian / orientation of the grid
    pub lov: f64,
    /// First standard parallel
    pub latin1: f64,
    /// Second standard parallel
    pub latin2: f64,
    /// Grid spacing in X (meters)
    pub dx: f64,
    /// Grid spacing in Y (meters)
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

/// Lambert Conformal Conic projection of a grid.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    params: LambertParams,
    /// Central meridian in radians
    lon0: f64,
    /// Cone constant
    n: f64,
    /// Scaled F constant (earth radius included)
    rf: f64,
    /// Rho at the first grid point
    rho0: f64,
    /// Projected coordinates of the first grid point
    x0: f64,
    y0: f64,
}

impl LambertConformal {
    /// Build the projection, rejecting degenerate cones and grid spacings.
    pub fn new(params: LambertParams) -> Result<Self> {
        if !(params.dx > 0.0 && params.dy > 0.0) {
            return Err(ReprojectionError::projection(format!(
                "grid spacing must be positive, got dx={} dy={}",
                params.dx, params.dy
            )));
        }

        let n = cone_constant(params.latin1.to_radians(), params.latin2.to_radians());
        if !n.is_finite() || n.abs() < 1e-10 {
            return Err(ReprojectionError::projection(format!(
                "degenerate cone for standard parallels {} and {}",
                params.latin1, params.latin2
            )));
        }

        Ok(Self::with_cone(params, n))
    }

    /// HRRR CONUS grid: 1799 x 1059 at 3 km, LoV 97.5°W, tangent at 38.5°N.
    pub fn hrrr() -> Self {
        let params = LambertParams {
            lat1: 21.138123,
            lon1: -122.719528, // 237.280472 - 360
            lov: -97.5,        // 262.5 - 360
            latin1: 38.5,
            latin2: 38.5,
            dx: 3000.0,
            dy: 3000.0,
            nx: 1799,
            ny: 1059,
        };
        Self::with_cone(params, 38.5f64.to_radians().sin())
    }

    fn with_cone(params: LambertParams, n: f64) -> Self {
        let to_rad = PI / 180.0;
        let lat1 = params.lat1 * to_rad;
        let lon0 = params.lov * to_rad;
        let latin1 = params.latin1 * to_rad;

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rf = EARTH_RADIUS * f;
        let rho0 = rf / (PI / 4.0 + lat1 / 2.0).tan().powf(n);

        // First grid point in projection coordinates
        let theta0 = n * wrap_longitude(params.lon1 * to_rad - lon0);
        let x0 = rho0 * theta0.sin();
        let y0 = rho0 - rho0 * theta0.cos();

        Self {
            params,
            lon0,
            n,
            rf,
            rho0,
            x0,
            y0,
        }
    }

    pub fn params(&self) -> &LambertParams {
        &self.params
    }

    /// Cone constant `n`.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }

    /// Fractional grid index `(i, j)` of a geographic position in degrees.
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let to_rad = PI / 180.0;
        let lat = lat_deg * to_rad;
        let dlon = wrap_longitude(lon_deg * to_rad - self.lon0);

        let rho = self.rf / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();

        ((x - self.x0) / self.params.dx, (y - self.y0) / self.params.dy)
    }
}

/// Cone constant for standard parallels in radians.
fn cone_constant(latin1: f64, latin2: f64) -> f64 {
    if (latin1 - latin2).abs() < 1e-10 {
        // Tangent cone
        latin1.sin()
    } else {
        let ln_ratio = (latin1.cos() / latin2.cos()).ln();
        let tan_ratio = ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
        ln_ratio / tan_ratio
    }
}

impl GridProjection for LambertConformal {
    fn dimensions(&self) -> (usize, usize) {
        (self.params.nx, self.params.ny)
    }

    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let to_deg = 180.0 / PI;

        let x = self.x0 + i * self.params.dx;
        let y = self.rho0 - (self.y0 + j * self.params.dy);

        let sign = self.n.signum();
        let rho = sign * (x * x + y * y).sqrt();
        let theta = (sign * x).atan2(sign * y);

        let lat = 2.0 * (self.rf / rho).powf(1.0 / self.n).atan() - PI / 2.0;
        let lon = self.lon0 + theta / self.n;

        (lat * to_deg, wrap_longitude(lon) * to_deg)
    }

    fn north_angle(&self, _lat_deg: f64, lon_deg: f64) -> f64 {
        self.n * wrap_longitude(lon_deg.to_radians() - self.lon0)
    }
}

//! Polar Stereographic projection.
//!
//! Meridians radiate from the pole, so the grid's y axis is rotated against
//! north by the longitude difference to the orientation meridian.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::lambert::EARTH_RADIUS;
use super::{wrap_longitude, GridProjection};
use crate::error::{ReprojectionError, Result};

/// Projection pole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hemisphere {
    North,
    South,
}

/// Polar Stereographic grid definition, angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarParams {
    /// Latitude of first grid point
    pub lat1: f64,
    /// Longitude of first grid point
    pub lon1: f64,
    /// Orientation meridian (points straight up the grid)
    pub lov: f64,
    /// Latitude at which dx/dy are true
    pub lad: f64,
    /// Grid spacing in X (meters)
    pub dx: f64,
    /// Grid spacing in Y (meters)
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub hemisphere: Hemisphere,
}

/// Polar Stereographic projection of a grid.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    params: PolarParams,
    lon0: f64,
    /// `R * (1 + sin |lad|)`
    k: f64,
    x0: f64,
    y0: f64,
}

impl PolarStereographic {
    pub fn new(params: PolarParams) -> Result<Self> {
        if !(params.dx > 0.0 && params.dy > 0.0) {
            return Err(ReprojectionError::projection(format!(
                "grid spacing must be positive, got dx={} dy={}",
                params.dx, params.dy
            )));
        }
        if !(params.lad.abs() > 0.0 && params.lad.abs() <= 90.0) {
            return Err(ReprojectionError::projection(format!(
                "true-scale latitude must be within (0, 90], got {}",
                params.lad
            )));
        }

        let k = EARTH_RADIUS * (1.0 + params.lad.abs().to_radians().sin());
        let mut proj = Self {
            lon0: params.lov.to_radians(),
            k,
            x0: 0.0,
            y0: 0.0,
            params,
        };
        let (x0, y0) = proj.project(proj.params.lat1, proj.params.lon1);
        proj.x0 = x0;
        proj.y0 = y0;
        Ok(proj)
    }

    pub fn params(&self) -> &PolarParams {
        &self.params
    }

    /// Projection coordinates in meters, pole at the origin.
    fn project(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = wrap_longitude(lon_deg.to_radians() - self.lon0);
        match self.params.hemisphere {
            Hemisphere::North => {
                let rho = self.k * (PI / 4.0 - lat / 2.0).tan();
                (rho * dlon.sin(), -rho * dlon.cos())
            }
            Hemisphere::South => {
                let rho = self.k * (PI / 4.0 + lat / 2.0).tan();
                (rho * dlon.sin(), rho * dlon.cos())
            }
        }
    }

    /// Fractional grid index `(i, j)` of a geographic position in degrees.
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let (x, y) = self.project(lat_deg, lon_deg);
        ((x - self.x0) / self.params.dx, (y - self.y0) / self.params.dy)
    }
}

impl GridProjection for PolarStereographic {
    fn dimensions(&self) -> (usize, usize) {
        (self.params.nx, self.params.ny)
    }

    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let x = self.x0 + i * self.params.dx;
        let y = self.y0 + j * self.params.dy;
        let rho = x.hypot(y);

        let (lat, dlon) = match self.params.hemisphere {
            Hemisphere::North => (PI / 2.0 - 2.0 * (rho / self.k).atan(), x.atan2(-y)),
            Hemisphere::South => (2.0 * (rho / self.k).atan() - PI / 2.0, x.atan2(y)),
        };

        (lat.to_degrees(), wrap_longitude(self.lon0 + dlon).to_degrees())
    }

    fn north_angle(&self, _lat_deg: f64, lon_deg: f64) -> f64 {
        let dlon = wrap_longitude(lon_deg.to_radians() - self.lon0);
        match self.params.hemisphere {
            Hemisphere::North => dlon,
            Hemisphere::South => -dlon,
        }
    }
}

//! Regular latitude/longitude grid.

use serde::{Deserialize, Serialize};

use super::GridProjection;

/// Regular lat/lon grid. Its axes are aligned with east and north everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLonGrid {
    /// Latitude of the first grid point (degrees)
    pub lat1: f64,
    /// Longitude of the first grid point (degrees)
    pub lon1: f64,
    /// Latitude increment per row (degrees, negative for north-to-south rows)
    pub dlat: f64,
    /// Longitude increment per column (degrees)
    pub dlon: f64,
    pub nx: usize,
    pub ny: usize,
}

impl LatLonGrid {
    pub fn new(lat1: f64, lon1: f64, dlat: f64, dlon: f64, nx: usize, ny: usize) -> Self {
        Self {
            lat1,
            lon1,
            dlat,
            dlon,
            nx,
            ny,
        }
    }

    /// Fractional grid index `(i, j)` of a geographic position.
    pub fn geo_to_grid(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        ((lon_deg - self.lon1) / self.dlon, (lat_deg - self.lat1) / self.dlat)
    }
}

impl GridProjection for LatLonGrid {
    fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        (self.lat1 + j * self.dlat, self.lon1 + i * self.dlon)
    }

    fn north_angle(&self, _lat_deg: f64, _lon_deg: f64) -> f64 {
        0.0
    }
}

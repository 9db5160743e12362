//! Vector and direction reprojection of registered variables.

use std::sync::Arc;

use reprojection::{CachedVectorReprojection, ReprojectionError};
use tracing::debug;

use crate::config::{GridProcessorConfig, Narrowing};
use crate::data::DataBuffer;
use crate::error::{GridProcessorError, Result};
use crate::packing::Packing;
use crate::slice::{DimRange, SliceSpec};
use crate::source::DataSource;
use crate::types::{Dimension, Schema, Variable};

#[derive(Clone)]
struct VectorPair {
    u: String,
    v: String,
    reprojection: Arc<CachedVectorReprojection>,
}

/// Rotates registered vector components and directions into the target grid.
///
/// Reading either component of a registered `(u, v)` pair reads both raw
/// slices, reprojects them together and returns the requested one.
/// Slices must cover the whole `(y, x)` plane of the reprojection for every
/// index of the outer dimensions.
pub struct VectorReprojectionProcessor<S> {
    source: S,
    pairs: Vec<VectorPair>,
    directions: Vec<(String, Arc<CachedVectorReprojection>)>,
    parallel_threshold: usize,
}

impl<S: DataSource> VectorReprojectionProcessor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pairs: Vec::new(),
            directions: Vec::new(),
            parallel_threshold: GridProcessorConfig::default().parallel_threshold,
        }
    }

    /// Register the `(u, v)` components of a vector field.
    pub fn reproject_vectors(
        mut self,
        u: &str,
        v: &str,
        reprojection: Arc<CachedVectorReprojection>,
    ) -> Result<Self> {
        let u_shape = self.source.variable_shape(u)?;
        let v_shape = self.source.variable_shape(v)?;
        if u_shape != v_shape {
            return Err(GridProcessorError::invalid_schema(format!(
                "vector components '{}' and '{}' have different shapes",
                u, v
            )));
        }
        check_plane(&u_shape, &reprojection)?;
        debug!(u = %u, v = %v, "Registered vector reprojection");
        self.pairs.push(VectorPair {
            u: u.to_string(),
            v: v.to_string(),
            reprojection,
        });
        Ok(self)
    }

    /// Register a variable holding direction angles in degrees.
    pub fn reproject_direction(
        mut self,
        variable: &str,
        reprojection: Arc<CachedVectorReprojection>,
    ) -> Result<Self> {
        check_plane(&self.source.variable_shape(variable)?, &reprojection)?;
        debug!(variable = %variable, "Registered direction reprojection");
        self.directions.push((variable.to_string(), reprojection));
        Ok(self)
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn inner(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Read a raw slice as physical `f32` values, NaN where missing.
    fn read_physical(&self, variable: &str, slice: &SliceSpec) -> Result<(Packing, Vec<f32>)> {
        let var = self.source.variable(variable)?;
        let packing = Packing::from_source(&self.source, &var)?;
        let mut values = self.source.read_raw_slice(variable, slice)?.to_f64_vec();
        packing.unpack_all(&mut values, self.parallel_threshold);
        Ok((packing, values.into_iter().map(|x| x as f32).collect()))
    }

    fn to_raw(&self, variable: &str, packing: &Packing, values: Vec<f32>) -> Result<DataBuffer> {
        let data_type = self.source.variable(variable)?.data_type;
        let mut values: Vec<f64> = values.into_iter().map(f64::from).collect();
        packing.pack_all(&mut values, self.parallel_threshold);
        Ok(DataBuffer::from_f64(data_type, &values, Narrowing::Round))
    }

    fn read_vector(&self, pair: &VectorPair, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        let shape = self.source.variable_shape(variable)?;
        let plane = plane_size(&slice.resolve(&shape)?, &pair.reprojection)?;

        let (u_packing, mut u) = self.read_physical(&pair.u, slice)?;
        let (v_packing, mut v) = self.read_physical(&pair.v, slice)?;
        if u.len() != v.len() {
            return Err(GridProcessorError::size_mismatch(u.len(), v.len()));
        }
        for (u_block, v_block) in u.chunks_mut(plane).zip(v.chunks_mut(plane)) {
            pair.reprojection.reproject_values(u_block, v_block, plane)?;
        }
        debug!(u = %pair.u, v = %pair.v, elements = u.len(), "Reprojected vector slice");

        if variable == pair.u {
            self.to_raw(variable, &u_packing, u)
        } else {
            self.to_raw(variable, &v_packing, v)
        }
    }

    fn read_direction(
        &self,
        reprojection: &CachedVectorReprojection,
        variable: &str,
        slice: &SliceSpec,
    ) -> Result<DataBuffer> {
        let shape = self.source.variable_shape(variable)?;
        let plane = plane_size(&slice.resolve(&shape)?, reprojection)?;

        let (packing, mut angles) = self.read_physical(variable, slice)?;
        for block in angles.chunks_mut(plane) {
            reprojection.reproject_direction_values(block, plane)?;
        }
        debug!(variable = %variable, elements = angles.len(), "Reprojected direction slice");
        self.to_raw(variable, &packing, angles)
    }
}

impl<S: DataSource> DataSource for VectorReprojectionProcessor<S> {
    fn schema(&self) -> Schema {
        self.source.schema()
    }

    fn variable(&self, name: &str) -> Result<Variable> {
        self.source.variable(name)
    }

    fn variable_shape(&self, name: &str) -> Result<Vec<Dimension>> {
        self.source.variable_shape(name)
    }

    fn dimension_length(&self, name: &str) -> Result<usize> {
        self.source.dimension_length(name)
    }

    fn missing_value_marker(&self, name: &str) -> Result<Option<f64>> {
        self.source.missing_value_marker(name)
    }

    fn native_unit(&self, name: &str) -> Result<Option<String>> {
        self.source.native_unit(name)
    }

    fn read_raw_slice(&self, variable: &str, slice: &SliceSpec) -> Result<DataBuffer> {
        if let Some(pair) = self
            .pairs
            .iter()
            .find(|p| p.u == variable || p.v == variable)
        {
            return self.read_vector(pair, variable, slice);
        }
        if let Some((_, reprojection)) = self.directions.iter().find(|(name, _)| name == variable) {
            return self.read_direction(reprojection, variable, slice);
        }
        self.source.read_raw_slice(variable, slice)
    }
}

/// The last two dimensions must be `(y, x)` of the reprojection grid.
fn check_plane(shape: &[Dimension], reprojection: &CachedVectorReprojection) -> Result<()> {
    let expected = reprojection.x_size() * reprojection.y_size();
    if expected == 0 {
        return Err(ReprojectionError::invalid_matrix("empty reprojection grid").into());
    }
    match shape {
        [.., y, x] if y.length == reprojection.y_size() && x.length == reprojection.x_size() => Ok(()),
        [.., y, x] => Err(GridProcessorError::size_mismatch(expected, y.length * x.length)),
        _ => Err(GridProcessorError::size_mismatch(expected, 0)),
    }
}

/// Elements per `(y, x)` plane of a resolved slice, which must span the grid.
fn plane_size(ranges: &[DimRange], reprojection: &CachedVectorReprojection) -> Result<usize> {
    let expected = reprojection.x_size() * reprojection.y_size();
    match ranges {
        [.., y, x] if y.length == reprojection.y_size() && x.length == reprojection.x_size() => {
            Ok(expected)
        }
        [.., y, x] => Err(GridProcessorError::size_mismatch(expected, y.length * x.length)),
        _ => Err(GridProcessorError::size_mismatch(expected, 0)),
    }
}

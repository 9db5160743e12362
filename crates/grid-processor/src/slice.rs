//! Hyper-rectangular slice addressing of N-dimensional variables.
//!
//! A [`SliceSpec`] starts out covering the full shape of a variable and is
//! narrowed one dimension at a time with [`SliceSpec::restrict`]. The
//! growable dimension is the exception: unless restricted it addresses a
//! single position, the first record.
//!
//! Buffers are row-major in the variable's dimension order, so the last
//! dimension varies fastest.

use crate::error::{GridProcessorError, Result};
use crate::types::{shape_size, Dimension};

/// Start offset and length along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimRange {
    pub start: usize,
    pub length: usize,
}

impl DimRange {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// One past the last index, `None` on overflow.
    pub fn end(&self) -> Option<usize> {
        self.start.checked_add(self.length)
    }
}

/// A subregion of a variable, per dimension `(start, length)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSpec {
    shape: Vec<Dimension>,
    restrictions: Vec<(String, DimRange)>,
}

impl SliceSpec {
    /// A slice covering `shape` (one record of the growable dimension).
    pub fn new(shape: &[Dimension]) -> Self {
        Self {
            shape: shape.to_vec(),
            restrictions: Vec::new(),
        }
    }

    /// The slice at `position` of the growable dimension.
    ///
    /// Shapes without a growable dimension ignore `position`.
    pub fn at_position(shape: &[Dimension], position: usize) -> Self {
        let spec = Self::new(shape);
        match shape.iter().find(|d| d.growable) {
            Some(dim) => {
                let name = dim.name.clone();
                spec.restrict(name, position, 1)
            }
            None => spec,
        }
    }

    /// Narrow one dimension. A later restriction of the same dimension
    /// replaces the earlier one. Checked by [`validate`](Self::validate).
    pub fn restrict(mut self, dimension: impl Into<String>, start: usize, length: usize) -> Self {
        let dimension = dimension.into();
        let range = DimRange::new(start, length);
        match self.restrictions.iter_mut().find(|(name, _)| *name == dimension) {
            Some(entry) => entry.1 = range,
            None => self.restrictions.push((dimension, range)),
        }
        self
    }

    /// The shape this slice was built for.
    pub fn shape(&self) -> &[Dimension] {
        &self.shape
    }

    /// The restriction of one dimension, if any.
    pub fn restriction(&self, dimension: &str) -> Option<DimRange> {
        self.restrictions
            .iter()
            .find(|(name, _)| name == dimension)
            .map(|(_, range)| *range)
    }

    /// Validate against the shape the slice was built for.
    pub fn validate(&self) -> Result<()> {
        self.validate_against(&self.shape)
    }

    /// Validate against a concrete shape.
    pub fn validate_against(&self, shape: &[Dimension]) -> Result<()> {
        self.resolve(shape).map(|_| ())
    }

    /// Per-dimension ranges in `shape` order.
    ///
    /// Fails with `UnknownDimension` for restrictions naming a dimension
    /// outside `shape` and `OutOfBounds` for empty or overlong ranges.
    pub fn resolve(&self, shape: &[Dimension]) -> Result<Vec<DimRange>> {
        for (name, _) in &self.restrictions {
            if !shape.iter().any(|d| d.name == *name) {
                return Err(GridProcessorError::unknown_dimension(name.as_str()));
            }
        }

        shape
            .iter()
            .map(|dim| {
                let range = match self.restriction(&dim.name) {
                    Some(range) => range,
                    None if dim.growable => DimRange::new(0, 1),
                    None => return Ok(DimRange::new(0, dim.length)),
                };
                match range.end() {
                    Some(end) if range.length > 0 && end <= dim.length => Ok(range),
                    _ => Err(GridProcessorError::out_of_bounds(
                        dim.name.as_str(),
                        range.start,
                        range.length,
                        dim.length,
                    )),
                }
            })
            .collect()
    }

    /// Lengths of the sliced buffer, in shape order.
    pub fn effective_shape(&self) -> Vec<usize> {
        self.shape
            .iter()
            .map(|dim| match self.restriction(&dim.name) {
                Some(range) => range.length,
                None if dim.growable => 1,
                None => dim.length,
            })
            .collect()
    }

    /// Start offsets, in shape order.
    pub fn start_positions(&self) -> Vec<usize> {
        self.shape
            .iter()
            .map(|dim| self.restriction(&dim.name).map_or(0, |r| r.start))
            .collect()
    }

    /// Number of elements in the sliced buffer.
    pub fn element_count(&self) -> usize {
        self.effective_shape().iter().product()
    }

    /// Length the growable dimension of `shape` needs for this slice to fit.
    pub fn required_growable_length(&self, shape: &[Dimension]) -> Option<usize> {
        let dim = shape.iter().find(|d| d.growable)?;
        match self.restriction(&dim.name) {
            Some(range) => range.end(),
            None => Some(1),
        }
    }

    /// Copy this slice out of `data`, laid out as `shape`.
    pub fn extract<T: Copy>(&self, shape: &[Dimension], data: &[T]) -> Result<Vec<T>> {
        let ranges = self.resolve(shape)?;
        check_len(shape_size(shape), data.len())?;
        let mut out = Vec::with_capacity(ranges.iter().map(|r| r.length).product());
        for_each_run(shape, &ranges, |src, _dst, run| {
            out.extend_from_slice(&data[src..src + run]);
        });
        Ok(out)
    }

    /// Copy `values` into this slice of `target`, laid out as `shape`.
    pub fn insert<T: Copy>(&self, shape: &[Dimension], target: &mut [T], values: &[T]) -> Result<()> {
        let ranges = self.resolve(shape)?;
        check_len(shape_size(shape), target.len())?;
        check_len(ranges.iter().map(|r| r.length).product(), values.len())?;
        for_each_run(shape, &ranges, |dst, src, run| {
            target[dst..dst + run].copy_from_slice(&values[src..src + run]);
        });
        Ok(())
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(GridProcessorError::size_mismatch(expected, actual));
    }
    Ok(())
}

/// Visit the contiguous runs of a slice: `f(full_offset, slice_offset, run_len)`.
fn for_each_run(shape: &[Dimension], ranges: &[DimRange], mut f: impl FnMut(usize, usize, usize)) {
    let rank = ranges.len();
    if rank == 0 {
        f(0, 0, 1);
        return;
    }
    if ranges.iter().any(|r| r.length == 0) {
        return;
    }

    let mut strides = vec![1usize; rank];
    for d in (0..rank - 1).rev() {
        strides[d] = strides[d + 1] * shape[d + 1].length;
    }

    let outer = rank - 1;
    let run = ranges[outer].length;
    let mut index = vec![0usize; outer];
    let mut written = 0;
    loop {
        let offset: usize = ranges[outer].start
            + (0..outer)
                .map(|d| (ranges[d].start + index[d]) * strides[d])
                .sum::<usize>();
        f(offset, written, run);
        written += run;

        let mut d = outer;
        loop {
            if d == 0 {
                return;
            }
            d -= 1;
            index[d] += 1;
            if index[d] < ranges[d].length {
                break;
            }
            index[d] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape() -> Vec<Dimension> {
        vec![
            Dimension::growable("time", 3),
            Dimension::new("y", 3),
            Dimension::new("x", 4),
        ]
    }

    #[test]
    fn test_growable_defaults_to_one_record() {
        let spec = SliceSpec::new(&shape());
        assert_eq!(spec.effective_shape(), vec![1, 3, 4]);
        assert_eq!(spec.element_count(), 12);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_at_position() {
        let spec = SliceSpec::at_position(&shape(), 2);
        assert_eq!(spec.start_positions(), vec![2, 0, 0]);
        assert!(spec.validate().is_ok());
        assert!(SliceSpec::at_position(&shape(), 3).validate().is_err());

        let fixed = vec![Dimension::new("x", 4)];
        assert_eq!(SliceSpec::at_position(&fixed, 7).effective_shape(), vec![4]);
    }

    #[test]
    fn test_restrict_replaces() {
        let spec = SliceSpec::new(&shape()).restrict("x", 0, 2).restrict("x", 1, 3);
        assert_eq!(spec.restriction("x"), Some(DimRange::new(1, 3)));
        assert_eq!(spec.effective_shape(), vec![1, 3, 3]);
    }

    #[test]
    fn test_bounds() {
        let shape = vec![Dimension::new("x", 6)];
        let err = SliceSpec::new(&shape).restrict("x", 5, 3).validate().unwrap_err();
        assert_eq!(err, GridProcessorError::out_of_bounds("x", 5, 3, 6));
        assert!(SliceSpec::new(&shape).restrict("x", 3, 3).validate().is_ok());
        assert!(SliceSpec::new(&shape).restrict("x", 2, 0).validate().is_err());
        assert!(SliceSpec::new(&shape).restrict("x", usize::MAX, 2).validate().is_err());
    }

    #[test]
    fn test_unknown_dimension() {
        let err = SliceSpec::new(&shape()).restrict("z", 0, 1).validate().unwrap_err();
        assert!(matches!(err, GridProcessorError::UnknownDimension(name) if name == "z"));
    }

    #[test]
    fn test_validate_against_grown_shape() {
        let spec = SliceSpec::new(&shape()).restrict("time", 3, 1);
        assert!(spec.validate().is_err());
        let mut grown = shape();
        grown[0].length = 4;
        assert!(spec.validate_against(&grown).is_ok());
        assert_eq!(spec.required_growable_length(&shape()), Some(4));
    }

    #[test]
    fn test_extract_and_insert() {
        let shape = vec![Dimension::new("y", 3), Dimension::new("x", 4)];
        let data: Vec<i32> = (0..12).collect();
        let spec = SliceSpec::new(&shape).restrict("y", 1, 2).restrict("x", 1, 2);
        assert_eq!(spec.extract(&shape, &data).unwrap(), vec![5, 6, 9, 10]);

        let mut target = vec![0; 12];
        spec.insert(&shape, &mut target, &[1, 2, 3, 4]).unwrap();
        assert_eq!(target, vec![0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0]);
    }

    #[test]
    fn test_scalar_shape() {
        let spec = SliceSpec::new(&[]);
        assert_eq!(spec.extract(&[], &[42.0]).unwrap(), vec![42.0]);
        assert_eq!(spec.element_count(), 1);
    }

    #[test]
    fn test_insert_size_mismatch() {
        let shape = vec![Dimension::new("x", 4)];
        let mut target = vec![0u8; 4];
        let err = SliceSpec::new(&shape).insert(&shape, &mut target, &[1, 2]).unwrap_err();
        assert_eq!(err, GridProcessorError::size_mismatch(4, 2));
    }
}

//! Tests for processors layered over a data source.

use std::sync::Arc;

use grid_processor::{
    DataBuffer, DataSource, DataType, DeAccumulate, Dimension, GridProcessorError, MemoryDataset,
    ScaledSliceAccess, Schema, SliceSpec, Variable, VectorReprojectionProcessor,
};
use reprojection::{CachedVectorReprojection, ReprojectionMatrix};
use test_utils::{
    assert_approx_eq, assert_slice_approx_eq, create_accumulated_precipitation,
    create_precipitation_grid,
};

const W: usize = 5;
const H: usize = 4;
const STEPS: usize = 4;

fn precipitation_dataset() -> MemoryDataset {
    let schema = Schema::new(
        vec![
            Dimension::growable("time", STEPS),
            Dimension::new("y", H),
            Dimension::new("x", W),
        ],
        vec![
            Variable::new("precip_acc", &["time", "y", "x"], DataType::Float32)
                .with_units("mm")
                .with_missing_value(-1.0),
            Variable::new("precip_packed", &["time", "y", "x"], DataType::Int32)
                .with_units("mm")
                .with_packing(0.01, 0.0),
            Variable::new("orography", &["y", "x"], DataType::Float32).with_units("m"),
        ],
    )
    .unwrap();
    let accumulated = create_accumulated_precipitation(W, H, STEPS);
    let packed: Vec<i32> = accumulated.iter().map(|v| (v * 100.0).round() as i32).collect();
    MemoryDataset::new(schema)
        .unwrap()
        .with_data("precip_acc", accumulated)
        .unwrap()
        .with_data("precip_packed", packed)
        .unwrap()
}

// ============================================================================
// De-accumulation
// ============================================================================

#[test]
fn test_deaccumulate_each_step() {
    let processor = DeAccumulate::new(precipitation_dataset())
        .deaccumulate("precip_acc")
        .unwrap();
    let shape = processor.variable_shape("precip_acc").unwrap();

    for step in 0..STEPS {
        let data = processor
            .read_raw_slice("precip_acc", &SliceSpec::at_position(&shape, step))
            .unwrap();
        let expected = create_precipitation_grid(W, H, step as u32);
        assert_slice_approx_eq!(data.as_f32().unwrap(), expected, 1e-3);
    }
}

#[test]
fn test_deaccumulate_range_of_steps() {
    let processor = DeAccumulate::new(precipitation_dataset())
        .deaccumulate("precip_acc")
        .unwrap();
    let shape = processor.variable_shape("precip_acc").unwrap();
    let spec = SliceSpec::new(&shape).restrict("time", 0, STEPS);

    let data = processor.read_raw_slice("precip_acc", &spec).unwrap();

    let expected: Vec<f32> = (0..STEPS)
        .flat_map(|step| create_precipitation_grid(W, H, step as u32))
        .collect();
    assert_slice_approx_eq!(data.as_f32().unwrap(), expected, 1e-3);
}

#[test]
fn test_deaccumulate_propagates_missing() {
    let ds = precipitation_dataset();
    let shape = ds.variable_shape("precip_acc").unwrap();
    let spec = SliceSpec::at_position(&shape, 1)
        .restrict("y", 0, 1)
        .restrict("x", 0, 1);
    ds.set_variable_data("precip_acc", {
        let mut data = ds.variable_data("precip_acc").unwrap().to_f32_vec();
        data[W * H] = -1.0;
        DataBuffer::from(data)
    })
    .unwrap();
    let processor = DeAccumulate::new(ds).deaccumulate("precip_acc").unwrap();

    let step1 = processor.read_raw_slice("precip_acc", &spec).unwrap();
    let step2 = processor
        .read_raw_slice("precip_acc", &SliceSpec::at_position(&shape, 2).restrict("y", 0, 1).restrict("x", 0, 1))
        .unwrap();

    assert_eq!(step1.get(0), Some(-1.0));
    assert_eq!(step2.get(0), Some(-1.0));
}

#[test]
fn test_deaccumulate_packed_variable() {
    let processor = DeAccumulate::new(precipitation_dataset())
        .deaccumulate("precip_packed")
        .unwrap();
    let access = ScaledSliceAccess::new(processor).unwrap();

    let step = access.get_scaled_slice("precip_packed", 3, Some("mm")).unwrap();
    let expected = create_precipitation_grid(W, H, 3);
    assert_slice_approx_eq!(step.to_f64_vec(), expected, 0.011);

    let cm = access.get_scaled_slice("precip_packed", 3, Some("cm")).unwrap();
    assert_approx_eq!(cm.get(0).unwrap(), step.get(0).unwrap() / 10.0, 1e-9);
}

#[test]
fn test_other_variables_pass_through() {
    let processor = DeAccumulate::new(precipitation_dataset())
        .deaccumulate("precip_acc")
        .unwrap();
    let shape = processor.variable_shape("precip_packed").unwrap();
    let raw = processor
        .read_raw_slice("precip_packed", &SliceSpec::at_position(&shape, 3))
        .unwrap();
    let direct = processor
        .inner()
        .read_raw_slice("precip_packed", &SliceSpec::at_position(&shape, 3))
        .unwrap();
    assert_eq!(raw, direct);
}

#[test]
fn test_deaccumulate_requires_growable_dimension() {
    let err = DeAccumulate::new(precipitation_dataset())
        .deaccumulate("orography")
        .err()
        .unwrap();
    assert!(matches!(err, GridProcessorError::InvalidSchema(_)));
}

// ============================================================================
// Vector reprojection
// ============================================================================

fn wind_dataset() -> MemoryDataset {
    let schema = Schema::new(
        vec![
            Dimension::growable("time", 2),
            Dimension::new("y", 2),
            Dimension::new("x", 2),
        ],
        vec![
            Variable::new("u", &["time", "y", "x"], DataType::Float32).with_units("m/s"),
            Variable::new("v", &["time", "y", "x"], DataType::Float32).with_units("m/s"),
            Variable::new("wdir", &["time", "y", "x"], DataType::Float32).with_units("degree"),
            Variable::new("row", &["x"], DataType::Float32),
        ],
    )
    .unwrap();
    MemoryDataset::new(schema)
        .unwrap()
        .with_data("u", vec![1.0f32; 8])
        .unwrap()
        .with_data("v", vec![0.0f32; 8])
        .unwrap()
        .with_data("wdir", vec![0.0f32, 90.0, 180.0, 270.0, 10.0, 20.0, 30.0, 40.0])
        .unwrap()
}

fn rotation_90(x: usize, y: usize) -> Arc<CachedVectorReprojection> {
    let matrix = ReprojectionMatrix::from_rotation_angles(x, y, &vec![90f64.to_radians(); x * y]).unwrap();
    Arc::new(CachedVectorReprojection::new(Arc::new(matrix)))
}

#[test]
fn test_vector_components_rotated() {
    let processor = VectorReprojectionProcessor::new(wind_dataset())
        .reproject_vectors("u", "v", rotation_90(2, 2))
        .unwrap();
    let access = ScaledSliceAccess::new(processor).unwrap();

    let u = access.get_scaled_slice("u", 1, None).unwrap();
    let v = access.get_scaled_slice("v", 1, Some("knot")).unwrap();

    assert_slice_approx_eq!(u.to_f64_vec(), vec![0.0; 4], 1e-6);
    assert_slice_approx_eq!(v.to_f64_vec(), vec![1.943844; 4], 1e-4);
}

#[test]
fn test_direction_rotated() {
    let processor = VectorReprojectionProcessor::new(wind_dataset())
        .reproject_direction("wdir", rotation_90(2, 2))
        .unwrap();
    let shape = processor.variable_shape("wdir").unwrap();

    let data = processor
        .read_raw_slice("wdir", &SliceSpec::new(&shape).restrict("time", 0, 2))
        .unwrap();

    assert_slice_approx_eq!(
        data.as_f32().unwrap(),
        vec![90.0f32, 180.0, 270.0, 0.0, 100.0, 110.0, 120.0, 130.0],
        1e-3
    );
}

#[test]
fn test_partial_plane_is_size_mismatch() {
    let processor = VectorReprojectionProcessor::new(wind_dataset())
        .reproject_vectors("u", "v", rotation_90(2, 2))
        .unwrap();
    let shape = processor.variable_shape("u").unwrap();
    let err = processor
        .read_raw_slice("u", &SliceSpec::new(&shape).restrict("x", 0, 1))
        .unwrap_err();
    assert_eq!(err, GridProcessorError::size_mismatch(4, 2));
}

#[test]
fn test_registration_checks_grid() {
    let result = VectorReprojectionProcessor::new(wind_dataset()).reproject_vectors("u", "v", rotation_90(3, 2));
    assert!(matches!(result.err(), Some(GridProcessorError::SizeMismatch { expected: 6, actual: 4 })));

    let result = VectorReprojectionProcessor::new(wind_dataset()).reproject_vectors("u", "row", rotation_90(2, 2));
    assert!(matches!(result.err(), Some(GridProcessorError::InvalidSchema(_))));
}

//! Tests for applying reprojection matrices to vector and direction buffers.

use std::sync::Arc;
use std::thread;

use reprojection::{
    CachedVectorReprojection, LambertConformal, LatLonGrid, ReprojectionError, ReprojectionMatrix,
};
use test_utils::{
    assert_approx_eq, assert_slice_approx_eq, create_direction_grid, create_u_wind_grid,
    create_v_wind_grid,
};

fn rotation_90() -> Arc<ReprojectionMatrix> {
    Arc::new(ReprojectionMatrix::from_coefficients(1, 1, &[0.0, -1.0, 1.0, 0.0]).unwrap())
}

// ============================================================================
// Vector components
// ============================================================================

#[test]
fn test_identity_leaves_components_unchanged() {
    let (w, h) = (16, 12);
    let matrix = ReprojectionMatrix::identity(w, h).unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
    let mut u = create_u_wind_grid(w, h);
    let mut v = create_v_wind_grid(w, h);
    let (u0, v0) = (u.clone(), v.clone());

    reprojection.reproject_values(&mut u, &mut v, w * h).unwrap();

    assert_eq!(u, u0);
    assert_eq!(v, v0);
}

#[test]
fn test_rotation_90_degrees() {
    let reprojection = CachedVectorReprojection::new(rotation_90());
    let mut u = vec![1.0f32];
    let mut v = vec![0.0f32];

    reprojection.reproject_values(&mut u, &mut v, 1).unwrap();

    assert_approx_eq!(u[0], 0.0, 1e-6);
    assert_approx_eq!(v[0], 1.0, 1e-6);
}

#[test]
fn test_scale_is_applied_to_components() {
    let matrix = ReprojectionMatrix::from_coefficients(2, 1, &[2.0, 0.0, 0.0, 2.0, 1.0, 1.0, 0.0, 1.0])
        .unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
    let mut u = vec![1.0f32, 1.0];
    let mut v = vec![3.0f32, 3.0];

    reprojection.reproject_values(&mut u, &mut v, 2).unwrap();

    assert_eq!(u, vec![2.0, 4.0]);
    assert_eq!(v, vec![6.0, 3.0]);
}

#[test]
fn test_rotation_preserves_speed() {
    let (w, h) = (20, 10);
    let angles: Vec<f64> = (0..w * h).map(|i| i as f64 * 0.05).collect();
    let matrix = ReprojectionMatrix::from_rotation_angles(w, h, &angles).unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));

    let mut u = create_u_wind_grid(w, h);
    let mut v = create_v_wind_grid(w, h);
    let speeds: Vec<f32> = u.iter().zip(&v).map(|(a, b)| a.hypot(*b)).collect();

    reprojection.reproject_values(&mut u, &mut v, w * h).unwrap();

    let after: Vec<f32> = u.iter().zip(&v).map(|(a, b)| a.hypot(*b)).collect();
    assert_slice_approx_eq!(after, speeds, 1e-4);
}

#[test]
fn test_missing_values_stay_missing() {
    let reprojection = CachedVectorReprojection::new(rotation_90());
    let mut u = vec![f32::NAN];
    let mut v = vec![2.0f32];
    reprojection.reproject_values(&mut u, &mut v, 1).unwrap();
    assert!(u[0].is_nan());
    assert!(v[0].is_nan());
}

#[test]
fn test_size_must_match_grid() {
    let matrix = ReprojectionMatrix::identity(4, 4).unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
    assert_eq!((reprojection.x_size(), reprojection.y_size()), (4, 4));

    let mut u = vec![0.0f32; 15];
    let mut v = vec![0.0f32; 15];
    let err = reprojection.reproject_values(&mut u, &mut v, 15).unwrap_err();
    assert_eq!(err, ReprojectionError::SizeMismatch { expected: 16, actual: 15 });

    let mut angles = vec![0.0f32; 17];
    assert!(matches!(
        reprojection.reproject_direction_values(&mut angles, 17),
        Err(ReprojectionError::SizeMismatch { .. })
    ));
}

// ============================================================================
// Directions
// ============================================================================

#[test]
fn test_direction_rotation_90_degrees() {
    let matrix = ReprojectionMatrix::from_coefficients(
        4,
        1,
        &[0.0, -1.0, 1.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, -1.0, 1.0, 0.0],
    )
    .unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
    let mut angles = vec![0.0f32, 90.0, 180.0, 270.0];

    reprojection.reproject_direction_values(&mut angles, 4).unwrap();

    assert_slice_approx_eq!(angles, [90.0f32, 180.0, 270.0, 0.0], 1e-4);
    assert!(angles.iter().all(|a| (0.0..360.0).contains(a)));
}

#[test]
fn test_direction_ignores_scale() {
    let matrix = ReprojectionMatrix::from_coefficients(1, 1, &[0.0, -3.0, 3.0, 0.0]).unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));
    let mut angles = vec![45.0f32];
    reprojection.reproject_direction_values(&mut angles, 1).unwrap();
    assert_approx_eq!(angles[0], 135.0, 1e-4);
}

#[test]
fn test_direction_matches_vector_rotation() {
    let (w, h) = (12, 6);
    let angles: Vec<f64> = (0..w * h).map(|i| (i as f64 * 0.37).sin()).collect();
    let matrix = Arc::new(ReprojectionMatrix::from_rotation_angles(w, h, &angles).unwrap());
    let reprojection = CachedVectorReprojection::new(matrix);

    let mut directions = create_direction_grid(w, h);
    let mut u: Vec<f32> = directions.iter().map(|d| d.to_radians().cos()).collect();
    let mut v: Vec<f32> = directions.iter().map(|d| d.to_radians().sin()).collect();

    reprojection.reproject_direction_values(&mut directions, w * h).unwrap();
    reprojection.reproject_values(&mut u, &mut v, w * h).unwrap();

    for i in 0..w * h {
        let expected = v[i].atan2(u[i]).to_degrees().rem_euclid(360.0);
        let diff = (directions[i] - expected).abs();
        assert!(diff.min(360.0 - diff) < 1e-3, "cell {}: {} vs {}", i, directions[i], expected);
    }
}

// ============================================================================
// Matrices from projections
// ============================================================================

#[test]
fn test_lambert_grid_winds_to_earth_axes() {
    let lambert = LambertConformal::hrrr();
    // One row along 40N, 10 degree steps, straddling the central meridian
    let target = LatLonGrid::new(40.0, -117.5, 0.0, 10.0, 5, 1);
    let matrix = ReprojectionMatrix::between(&lambert, &target).unwrap();
    let reprojection = CachedVectorReprojection::new(Arc::new(matrix));

    // Pure grid-north wind everywhere
    let mut u = vec![0.0f32; 5];
    let mut v = vec![10.0f32; 5];
    reprojection.reproject_values(&mut u, &mut v, 5).unwrap();

    // Unchanged on the central meridian, turned away from it elsewhere
    assert_approx_eq!(u[2], 0.0, 1e-5);
    assert_approx_eq!(v[2], 10.0, 1e-5);
    assert!(u[0] < 0.0 && u[1] < 0.0);
    assert!(u[3] > 0.0 && u[4] > 0.0);
    assert_approx_eq!(u[0], -u[4], 1e-4);
    for i in 0..5 {
        assert_approx_eq!(u[i].hypot(v[i]), 10.0, 1e-4);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_shared_matrix_across_threads() {
    let (w, h) = (64, 32);
    let angles: Vec<f64> = (0..w * h).map(|i| i as f64 * 0.01).collect();
    let matrix = Arc::new(ReprojectionMatrix::from_rotation_angles(w, h, &angles).unwrap());
    let reprojection = Arc::new(CachedVectorReprojection::new(matrix));

    let mut expected_u = create_u_wind_grid(w, h);
    let mut expected_v = create_v_wind_grid(w, h);
    reprojection
        .reproject_values(&mut expected_u, &mut expected_v, w * h)
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reprojection = Arc::clone(&reprojection);
            thread::spawn(move || {
                let mut u = create_u_wind_grid(w, h);
                let mut v = create_v_wind_grid(w, h);
                reprojection.reproject_values(&mut u, &mut v, w * h).unwrap();
                (u, v)
            })
        })
        .collect();

    for handle in handles {
        let (u, v) = handle.join().unwrap();
        assert_eq!(u, expected_u);
        assert_eq!(v, expected_v);
    }
}

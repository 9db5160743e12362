//! Test data generators for creating synthetic gridded data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`, in row-major order.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates an N-dimensional array whose values spell out their own index.
///
/// The value at index `(i0, i1, .., ik)` is `i0 * 100^k + i1 * 100^(k-1) + .. + ik`,
/// so every dimension must be shorter than 100.
///
/// ```
/// use test_utils::create_indexed_array;
///
/// let data = create_indexed_array(&[2, 3, 4]);
/// assert_eq!(data.len(), 24);
/// assert_eq!(data[23], 10203.0); // (1, 2, 3)
/// ```
pub fn create_indexed_array(shape: &[usize]) -> Vec<f64> {
    let total: usize = shape.iter().product();
    let mut data = Vec::with_capacity(total);
    for flat in 0..total {
        let mut rest = flat;
        let mut value = 0.0;
        let mut weight = 1.0;
        for &len in shape.iter().rev() {
            value += (rest % len) as f64 * weight;
            rest /= len;
            weight *= 100.0;
        }
        data.push(value);
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin.
///
/// Values form a gradient from 250K (top-left) towards 310K (bottom-right).
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Creates a U-component wind grid (along the x axis), -20 to +20 m/s by row.
pub fn create_u_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        let lat_factor = (row as f32 / height.max(1) as f32 - 0.5) * 2.0;
        data.extend(std::iter::repeat(lat_factor * 20.0).take(width));
    }
    data
}

/// Creates a V-component wind grid (along the y axis), -15 to +15 m/s by column.
pub fn create_v_wind_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let lon_factor = (col as f32 / width.max(1) as f32 - 0.5) * 2.0;
            data.push(lon_factor * 15.0);
        }
    }
    data
}

/// Creates direction angles in degrees covering `[0, 360)` across the grid.
pub fn create_direction_grid(width: usize, height: usize) -> Vec<f32> {
    let total = (width * height).max(1);
    (0..width * height)
        .map(|i| (i as f32 * 360.0 / total as f32) % 360.0)
        .collect()
}

/// Creates deterministic precipitation amounts in mm; most cells are dry.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f32 / 100.0
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

/// Creates `steps` grids of precipitation accumulated since the first step,
/// concatenated time-major (`[step][row][col]`).
///
/// Step `n` holds the sum of [`create_precipitation_grid`] with seeds `0..=n`.
pub fn create_accumulated_precipitation(width: usize, height: usize, steps: usize) -> Vec<f32> {
    let cells = width * height;
    let mut data = Vec::with_capacity(cells * steps);
    let mut total = vec![0.0f32; cells];
    for step in 0..steps {
        let increment = create_precipitation_grid(width, height, step as u32);
        for (acc, inc) in total.iter_mut().zip(&increment) {
            *acc += inc;
        }
        data.extend_from_slice(&total);
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Replaces the cells at `positions` (col, row) with `marker`.
pub fn with_missing(
    mut data: Vec<f32>,
    width: usize,
    positions: &[(usize, usize)],
    marker: f32,
) -> Vec<f32> {
    for &(col, row) in positions {
        if let Some(cell) = data.get_mut(row * width + col) {
            *cell = marker;
        }
    }
    data
}

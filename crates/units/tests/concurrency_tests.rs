//! First-use initialization from many threads at once.
//!
//! Kept in its own test binary so no other test initializes the registry first.

use std::sync::{Arc, Barrier};
use std::thread;

use units::UnitSystem;

const THREADS: usize = 100;

const PAIRS: &[(&str, &str)] = &[
    ("m", "km"),
    ("km", "m"),
    ("degC", "K"),
    ("K", "degF"),
    ("Pa", "hPa"),
    ("m/s", "knot"),
    ("hours since 1970-01-01", "seconds since 1970-01-01"),
    ("g", "kg"),
    ("mm", "inch"),
    ("day", "hour"),
];

#[test]
fn test_concurrent_first_use_initializes_once() {
    assert_eq!(UnitSystem::initialization_count(), 0);

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let (from, to) = PAIRS[i % PAIRS.len()];
                barrier.wait();
                let units = UnitSystem::new().unwrap();
                let conv = units.get_converter(from, to).unwrap();
                let forward = conv.convert(i as f64);
                let back = units.get_converter(to, from).unwrap().convert(forward);
                assert!((back - i as f64).abs() < 1e-6 * (1.0 + i as f64));
                conv.is_linear()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }

    assert_eq!(UnitSystem::initialization_count(), 1);
    assert!(UnitSystem::is_initialized());
}

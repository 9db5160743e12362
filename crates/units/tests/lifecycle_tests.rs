//! Initialization failure and unload behavior of the unit system.
//!
//! Mutates process-wide state, so everything runs in a single test.

use test_utils::{temp_file_with, BROKEN_UNITS_YAML, EXTRA_UNITS_YAML};
use units::{UnitSystem, UnitSystemConfig, UnitsError};

#[test]
fn test_failed_initialization_is_sticky_until_unload() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let bad = temp_file_with(BROKEN_UNITS_YAML, "yaml");
    UnitSystem::configure(UnitSystemConfig::default().with_database(bad.path()));

    let err = UnitSystem::new().unwrap_err();
    assert!(matches!(err, UnitsError::SystemInit(_)));
    assert!(!UnitSystem::is_initialized());

    // Fixing the configuration does not clear the failure by itself
    UnitSystem::configure(UnitSystemConfig::default());
    assert!(matches!(
        UnitSystem::ensure_initialized(),
        Err(UnitsError::SystemInit(_))
    ));

    // A non-forced unload is a no-op
    assert!(!UnitSystem::unload(false));
    assert!(UnitSystem::ensure_initialized().is_err());

    assert!(UnitSystem::unload(true));
    let units = UnitSystem::new().unwrap();
    assert_eq!(UnitSystem::initialization_count(), 1);
    assert!((units.get_converter("m", "cm").unwrap().convert(1.0) - 100.0).abs() < 1e-9);
    assert!(!units.are_convertible("furlong", "m"));

    // Reload with a custom database after another forced unload
    let good = temp_file_with(EXTRA_UNITS_YAML, "yaml");
    UnitSystem::configure(UnitSystemConfig::default().with_database(good.path()));

    assert!(UnitSystem::unload(true));
    assert!(!UnitSystem::is_initialized());

    let units = UnitSystem::new().unwrap();
    assert_eq!(UnitSystem::initialization_count(), 2);
    let (scale, offset) = units.convert("fur", "m").unwrap();
    assert!((scale - 201.168).abs() < 1e-9);
    assert_eq!(offset, 0.0);
    assert!(units.are_convertible("furlong/fortnight", "m/s"));
}

//! Process-wide unit system.
//!
//! The registry is built lazily on first use and guarded by one mutex.
//! Parsing, compatibility checks and evaluation of registry-backed
//! converters all go through that mutex; linear converters never touch it.
//! A failed initialization is sticky until [`UnitSystem::unload`] is forced.

use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use tracing::{debug, error, info, warn};

use crate::config::UnitSystemConfig;
use crate::converter::UnitsConverter;
use crate::error::{Result, UnitsError};
use crate::registry::UnitRegistry;
use crate::unit::Unit;

/// Reference unit for [`UnitSystem::is_time`].
pub const TIME_REFERENCE: &str = "seconds since 1970-01-01 00:00:00";

#[derive(Default)]
pub(crate) struct RegistryState {
    registry: Option<UnitRegistry>,
    failure: Option<UnitsError>,
    config: Option<UnitSystemConfig>,
    initializations: usize,
}

impl RegistryState {
    fn ensure(&mut self) -> Result<&UnitRegistry> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if self.registry.is_none() {
            let config = self.config.clone().unwrap_or_else(UnitSystemConfig::from_env);
            let built = match &config.database_path {
                Some(path) => UnitRegistry::with_database(path),
                None => UnitRegistry::builtin(),
            };
            match built {
                Ok(registry) => {
                    self.initializations += 1;
                    info!(
                        units = registry.len(),
                        database = ?config.database_path,
                        "Unit system initialized"
                    );
                    self.registry = Some(registry);
                }
                Err(err) => {
                    error!(error = %err, "Unit system initialization failed");
                    self.failure = Some(err.clone());
                    return Err(err);
                }
            }
        }
        self.registry
            .as_ref()
            .ok_or_else(|| UnitsError::system_init("registry unavailable"))
    }
}

static STATE: Lazy<Mutex<RegistryState>> = Lazy::new(|| Mutex::new(RegistryState::default()));

fn lock_state() -> MutexGuard<'static, RegistryState> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Lock held while a registry-backed converter evaluates a value.
pub(crate) fn evaluator_lock() -> MutexGuard<'static, RegistryState> {
    lock_state()
}

fn with_registry<T>(f: impl FnOnce(&UnitRegistry) -> Result<T>) -> Result<T> {
    let mut state = lock_state();
    let registry = state.ensure()?;
    f(registry)
}

/// Handle to the process-wide unit system.
///
/// The handle carries no state of its own; every instance talks to the same
/// registry.
#[derive(Debug, Clone, Copy)]
pub struct UnitSystem {
    _private: (),
}

impl UnitSystem {
    /// Get a handle, initializing the registry if needed.
    pub fn new() -> Result<Self> {
        Self::ensure_initialized()?;
        Ok(Self { _private: () })
    }

    /// Initialize the registry if it is not loaded yet.
    pub fn ensure_initialized() -> Result<()> {
        lock_state().ensure().map(|_| ())
    }

    /// Set the configuration used by the next initialization.
    ///
    /// Has no effect on an already loaded registry until it is unloaded.
    pub fn configure(config: UnitSystemConfig) {
        let mut state = lock_state();
        if state.registry.is_some() {
            warn!("Unit system already initialized; configuration applies after unload");
        }
        state.config = Some(config);
    }

    /// Free the registry. Only acts when `force` is set; returns whether it did.
    ///
    /// Also clears a sticky initialization failure, so the next use retries.
    pub fn unload(force: bool) -> bool {
        if !force {
            return false;
        }
        let mut state = lock_state();
        state.registry = None;
        state.failure = None;
        info!("Unit system unloaded");
        true
    }

    /// Check whether the registry is currently loaded.
    pub fn is_initialized() -> bool {
        lock_state().registry.is_some()
    }

    /// Number of successful initializations in this process.
    pub fn initialization_count() -> usize {
        lock_state().initializations
    }

    /// Parse a unit string.
    pub fn parse(&self, unit: &str) -> Result<Unit> {
        with_registry(|registry| registry.parse(unit))
    }

    /// Get a converter from `from` to `to`.
    ///
    /// Identical strings yield the identity converter without consulting
    /// the registry, so unknown but self-consistent units still work.
    pub fn get_converter(&self, from: &str, to: &str) -> Result<UnitsConverter> {
        debug!(from = %from, to = %to, "getConverter");
        if from == to {
            return Ok(UnitsConverter::identity());
        }

        let (from_unit, to_unit) = with_registry(|registry| {
            let from_unit = registry.parse(from)?;
            let to_unit = registry.parse(to)?;
            Ok((from_unit, to_unit))
        })?;

        if !from_unit.is_convertible_to(&to_unit) {
            return Err(UnitsError::incompatible(from, to));
        }

        Ok(UnitsConverter::from_registry(move |x| {
            to_unit.from_base(from_unit.to_base(x))
        }))
    }

    /// Check whether two units are convertible. Never fails: parse and
    /// registry errors are logged and reported as `false`.
    pub fn are_convertible(&self, unit1: &str, unit2: &str) -> bool {
        debug!(unit1 = %unit1, unit2 = %unit2, "test convertibility");
        let result = with_registry(|registry| {
            let a = registry.parse(unit1)?;
            let b = registry.parse(unit2)?;
            Ok(a.is_convertible_to(&b))
        });
        match result {
            Ok(convertible) => convertible,
            Err(err) => {
                warn!(error = %err, "Unit convertibility check failed");
                false
            }
        }
    }

    /// Check whether `unit` is a time unit (convertible to seconds since the epoch).
    pub fn is_time(&self, unit: &str) -> bool {
        self.are_convertible(unit, TIME_REFERENCE)
    }

    /// The `(scale, offset)` of a linear conversion from `from` to `to`.
    pub fn convert(&self, from: &str, to: &str) -> Result<(f64, f64)> {
        debug!(from = %from, to = %to, "convert");
        self.get_converter(from, to)?.scale_offset()
    }
}

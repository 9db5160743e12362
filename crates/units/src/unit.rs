//! Parsed unit values.
//!
//! A [`Unit`] maps a value expressed in that unit onto the coherent SI
//! base ("base value"). Linear units use `base = factor * x + offset`,
//! logarithmic units use `base = reference * radix^(scale * x)`.

use std::fmt;

/// Number of SI base dimensions tracked per unit.
pub const BASE_DIMENSIONS: usize = 7;

/// Symbols of the SI base dimensions, in storage order.
pub const BASE_SYMBOLS: [&str; BASE_DIMENSIONS] = ["m", "kg", "s", "A", "K", "mol", "cd"];

/// Index of the time dimension in [`Dimensions`].
pub const TIME_INDEX: usize = 2;

/// Exponents of the SI base dimensions (length, mass, time, current,
/// temperature, amount, luminous intensity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimensions(pub [i8; BASE_DIMENSIONS]);

impl Dimensions {
    /// The dimensionless exponent vector.
    pub const NONE: Dimensions = Dimensions([0; BASE_DIMENSIONS]);

    /// A single base dimension raised to the first power.
    pub fn base(index: usize) -> Self {
        let mut exps = [0; BASE_DIMENSIONS];
        exps[index] = 1;
        Self(exps)
    }

    /// Check whether all exponents are zero.
    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|e| *e == 0)
    }

    /// Check whether this is exactly the time dimension.
    pub fn is_time(&self) -> bool {
        *self == Self::base(TIME_INDEX)
    }

    /// Sum of exponents, or `None` when one leaves the `i8` range.
    fn combine(&self, other: &Self) -> Option<Self> {
        let mut exps = self.0;
        for (e, o) in exps.iter_mut().zip(other.0.iter()) {
            *e = e.checked_add(*o)?;
        }
        Some(Self(exps))
    }

    fn scaled(&self, power: i8) -> Option<Self> {
        let mut exps = self.0;
        for e in exps.iter_mut() {
            *e = e.checked_mul(power)?;
        }
        Some(Self(exps))
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut first = true;
        for (symbol, exp) in BASE_SYMBOLS.iter().zip(self.0.iter()) {
            if *exp == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if *exp == 1 {
                write!(f, "{}", symbol)?;
            } else {
                write!(f, "{}{}", symbol, exp)?;
            }
        }
        Ok(())
    }
}

/// How values of a unit map onto the base value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// `base = factor * x + offset`
    Linear { factor: f64, offset: f64 },
    /// `base = reference * radix^(scale * x)`
    Log {
        radix: f64,
        scale: f64,
        reference: f64,
    },
}

/// A parsed physical unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    dimensions: Dimensions,
    scale: Scale,
}

impl Unit {
    /// The dimensionless unit `1`.
    pub fn one() -> Self {
        Self::number(1.0)
    }

    /// A pure number (dimensionless scale factor).
    pub fn number(value: f64) -> Self {
        Self {
            dimensions: Dimensions::NONE,
            scale: Scale::Linear {
                factor: value,
                offset: 0.0,
            },
        }
    }

    /// A base unit of the given dimension index.
    pub fn base(index: usize) -> Self {
        Self {
            dimensions: Dimensions::base(index),
            scale: Scale::Linear {
                factor: 1.0,
                offset: 0.0,
            },
        }
    }

    /// Dimension exponents of this unit.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The value-to-base mapping of this unit.
    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Check whether the unit is a plain number without offset.
    pub fn is_number(&self) -> bool {
        self.dimensions.is_dimensionless()
            && matches!(self.scale, Scale::Linear { offset, .. } if offset == 0.0)
    }

    /// Check whether the unit is logarithmic.
    pub fn is_logarithmic(&self) -> bool {
        matches!(self.scale, Scale::Log { .. })
    }

    /// Check whether a dimension-preserving conversion exists.
    pub fn is_convertible_to(&self, other: &Unit) -> bool {
        self.dimensions == other.dimensions
    }

    /// Convert a value of this unit to the base value.
    #[inline]
    pub fn to_base(&self, x: f64) -> f64 {
        match self.scale {
            Scale::Linear { factor, offset } => factor * x + offset,
            Scale::Log {
                radix,
                scale,
                reference,
            } => reference * radix.powf(scale * x),
        }
    }

    /// Convert a base value to a value of this unit.
    #[inline]
    pub fn from_base(&self, base: f64) -> f64 {
        match self.scale {
            Scale::Linear { factor, offset } => (base - offset) / factor,
            Scale::Log {
                radix,
                scale,
                reference,
            } => (base / reference).ln() / radix.ln() / scale,
        }
    }

    /// Multiply the unit by a number: one new unit equals `k` old units.
    pub fn scaled(&self, k: f64) -> Self {
        let scale = match self.scale {
            Scale::Linear { factor, offset } => Scale::Linear {
                factor: factor * k,
                offset,
            },
            Scale::Log {
                radix,
                scale,
                reference,
            } => Scale::Log {
                radix,
                scale: scale * k,
                reference,
            },
        };
        Self {
            dimensions: self.dimensions,
            scale,
        }
    }

    /// Product of two units. Origins of offset units are dropped.
    pub fn multiply(&self, other: &Unit) -> Result<Self, String> {
        if let Some(k) = self.as_number() {
            return Ok(other.scaled(k));
        }
        if let Some(k) = other.as_number() {
            return Ok(self.scaled(k));
        }
        match (self.scale, other.scale) {
            (Scale::Linear { factor: a, .. }, Scale::Linear { factor: b, .. }) => Ok(Self {
                dimensions: self
                    .dimensions
                    .combine(&other.dimensions)
                    .ok_or_else(|| "exponent out of range".to_string())?,
                scale: Scale::Linear {
                    factor: a * b,
                    offset: 0.0,
                },
            }),
            _ => Err("logarithmic units cannot be multiplied".to_string()),
        }
    }

    /// Quotient of two units.
    pub fn divide(&self, other: &Unit) -> Result<Self, String> {
        if let Some(k) = other.as_number() {
            if k == 0.0 {
                return Err("division by zero".to_string());
            }
            return Ok(self.scaled(1.0 / k));
        }
        self.multiply(&other.pow(-1)?)
    }

    /// Raise the unit to an integer power.
    pub fn pow(&self, power: i32) -> Result<Self, String> {
        if power == 1 {
            return Ok(*self);
        }
        let power = i8::try_from(power).map_err(|_| format!("exponent {} out of range", power))?;
        match self.scale {
            Scale::Linear { factor, .. } => Ok(Self {
                dimensions: self
                    .dimensions
                    .scaled(power)
                    .ok_or_else(|| "exponent out of range".to_string())?,
                scale: Scale::Linear {
                    factor: factor.powi(power as i32),
                    offset: 0.0,
                },
            }),
            Scale::Log { .. } => Err("logarithmic units cannot be raised to a power".to_string()),
        }
    }

    /// Move the origin: a value `x` of the new unit equals `x + origin` of this unit.
    pub fn shifted(&self, origin: f64) -> Result<Self, String> {
        match self.scale {
            Scale::Linear { factor, offset } => Ok(Self {
                dimensions: self.dimensions,
                scale: Scale::Linear {
                    factor,
                    offset: factor * origin + offset,
                },
            }),
            Scale::Log { .. } => Err("logarithmic units cannot be shifted".to_string()),
        }
    }

    /// Anchor a time unit at an absolute epoch, given in base seconds.
    pub fn since_epoch(&self, epoch_seconds: f64) -> Result<Self, String> {
        if !self.dimensions.is_time() {
            return Err(format!(
                "timestamp origin requires a time unit, got dimensions '{}'",
                self.dimensions
            ));
        }
        match self.scale {
            Scale::Linear { factor, offset } => Ok(Self {
                dimensions: self.dimensions,
                scale: Scale::Linear {
                    factor,
                    offset: offset + epoch_seconds,
                },
            }),
            Scale::Log { .. } => Err("logarithmic units cannot be shifted".to_string()),
        }
    }

    /// Logarithmic unit relative to `reference`, e.g. `lg(re 1 mW)`.
    pub fn logarithmic(radix: f64, reference: &Unit) -> Result<Self, String> {
        match reference.scale {
            Scale::Linear { factor, offset } if offset == 0.0 && factor > 0.0 => Ok(Self {
                dimensions: reference.dimensions,
                scale: Scale::Log {
                    radix,
                    scale: 1.0,
                    reference: factor,
                },
            }),
            _ => Err("logarithm reference must be a positive linear unit".to_string()),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self.scale {
            Scale::Linear { factor, offset } if offset == 0.0 && self.dimensions.is_dimensionless() => {
                Some(factor)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_roundtrip() {
        let km = Unit::base(0).scaled(1000.0);
        assert!((km.to_base(2.5) - 2500.0).abs() < 1e-12);
        assert!((km.from_base(2500.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_shift_keeps_factor() {
        let celsius = Unit::base(4).shifted(273.15).unwrap();
        assert!((celsius.to_base(0.0) - 273.15).abs() < 1e-12);
        assert!((celsius.to_base(100.0) - 373.15).abs() < 1e-12);
    }

    #[test]
    fn test_multiply_drops_origin() {
        let celsius = Unit::base(4).shifted(273.15).unwrap();
        let per_second = Unit::base(2).pow(-1).unwrap();
        let rate = celsius.multiply(&per_second).unwrap();
        assert_eq!(rate.scale(), Scale::Linear { factor: 1.0, offset: 0.0 });
        assert_eq!(rate.dimensions().0, [0, 0, -1, 0, 1, 0, 0]);
    }

    #[test]
    fn test_number_scales_log_unit() {
        let bel = Unit::logarithmic(10.0, &Unit::one()).unwrap();
        let decibel = Unit::number(0.1).multiply(&bel).unwrap();
        assert!((decibel.to_base(10.0) - 10.0).abs() < 1e-12);
        assert!((decibel.from_base(100.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_log_unit_rejects_power() {
        let bel = Unit::logarithmic(10.0, &Unit::one()).unwrap();
        assert!(bel.pow(2).is_err());
        assert!(bel.multiply(&Unit::base(0)).is_err());
    }

    #[test]
    fn test_since_epoch_requires_time() {
        assert!(Unit::base(0).since_epoch(10.0).is_err());
        let s = Unit::base(TIME_INDEX).since_epoch(10.0).unwrap();
        assert!((s.to_base(1.0) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let m100 = Unit::base(0).pow(100).unwrap();
        assert!(m100.multiply(&m100).is_err());
        assert!(m100.pow(2).is_err());
        assert!(m100.pow(-1).is_ok());
        assert!(Unit::base(0).pow(300).is_err());
    }

    #[test]
    fn test_dimensions_display() {
        let accel = Unit::base(0).divide(&Unit::base(2).pow(2).unwrap()).unwrap();
        assert_eq!(accel.dimensions().to_string(), "m s-2");
        assert_eq!(Dimensions::NONE.to_string(), "1");
    }
}

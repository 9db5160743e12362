//! Unit registry: named units, prefixes and the optional unit database.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, UnitsError};
use crate::parser::{parse_unit, NameLookup};
use crate::unit::Unit;

/// SI prefixes: long form, symbol(s), factor.
const PREFIXES: &[(&str, &[&str], f64)] = &[
    ("yotta", &["Y"], 1e24),
    ("zetta", &["Z"], 1e21),
    ("exa", &["E"], 1e18),
    ("peta", &["P"], 1e15),
    ("tera", &["T"], 1e12),
    ("giga", &["G"], 1e9),
    ("mega", &["M"], 1e6),
    ("kilo", &["k"], 1e3),
    ("hecto", &["h"], 1e2),
    ("deka", &["da"], 1e1),
    ("deca", &[], 1e1),
    ("deci", &["d"], 1e-1),
    ("centi", &["c"], 1e-2),
    ("milli", &["m"], 1e-3),
    ("micro", &["u", "µ", "μ"], 1e-6),
    ("nano", &["n"], 1e-9),
    ("pico", &["p"], 1e-12),
    ("femto", &["f"], 1e-15),
    ("atto", &["a"], 1e-18),
    ("zepto", &["z"], 1e-21),
    ("yocto", &["y"], 1e-24),
];

/// SI base units and their long names, in dimension order.
const BASE_UNITS: [(&str, &str); 7] = [
    ("m", "meter"),
    ("kg", "kilogram"),
    ("s", "second"),
    ("A", "ampere"),
    ("K", "kelvin"),
    ("mol", "mole"),
    ("cd", "candela"),
];

/// Built-in definitions, evaluated in order.
const DEFINITIONS: &[(&str, &str)] = &[
    // dimensionless
    ("radian", "1"),
    ("steradian", "1"),
    ("percent", "0.01"),
    ("ppm", "1e-6"),
    ("ppb", "1e-9"),
    ("ppv", "1"),
    // derived SI
    ("gram", "0.001 kg"),
    ("hertz", "1/s"),
    ("newton", "kg m s-2"),
    ("pascal", "newton/m2"),
    ("joule", "newton m"),
    ("watt", "joule/s"),
    ("coulomb", "ampere s"),
    ("volt", "watt/ampere"),
    ("ohm", "volt/ampere"),
    ("siemens", "ampere/volt"),
    ("farad", "coulomb/volt"),
    ("weber", "volt s"),
    ("tesla", "weber/m2"),
    ("henry", "weber/ampere"),
    ("becquerel", "1/s"),
    ("gray", "joule/kg"),
    ("sievert", "joule/kg"),
    ("katal", "mol/s"),
    ("lumen", "cd steradian"),
    ("lux", "lumen/m2"),
    // temperature
    ("degree_Celsius", "K @ 273.15"),
    ("degree_Rankine", "K/1.8"),
    ("degree_Fahrenheit", "degree_Rankine @ 459.67"),
    // time
    ("minute", "60 s"),
    ("hour", "60 minute"),
    ("day", "24 hour"),
    ("week", "7 day"),
    ("common_year", "365 day"),
    ("leap_year", "366 day"),
    ("year", "3.15569259747e7 s"),
    ("month", "year/12"),
    // angle
    ("degree", "0.017453292519943295 radian"),
    ("arcminute", "degree/60"),
    ("arcsecond", "arcminute/60"),
    // length, area, volume
    ("inch", "0.0254 m"),
    ("foot", "12 inch"),
    ("yard", "3 foot"),
    ("mile", "5280 foot"),
    ("nautical_mile", "1852 m"),
    ("hectare", "1e4 m2"),
    ("liter", "0.001 m3"),
    // speed
    ("knot", "nautical_mile/hour"),
    // pressure, energy
    ("bar", "1e5 pascal"),
    ("atmosphere", "101325 pascal"),
    ("torr", "atmosphere/760"),
    ("millimeter_Hg", "133.322387415 pascal"),
    ("calorie", "4.1868 joule"),
    ("erg", "1e-7 joule"),
    ("dyne", "1e-5 newton"),
    // logarithmic
    ("bel", "lg(re 1)"),
    ("decibel", "0.1 bel"),
    ("dBZ", "0.1 lg(re 1 mm6 m-3)"),
    ("dBm", "0.1 lg(re 1 mW)"),
];

/// Alternative spellings: (alias, canonical name).
const ALIASES: &[(&str, &str)] = &[
    ("metre", "meter"),
    ("rad", "radian"),
    ("sr", "steradian"),
    ("%", "percent"),
    ("g", "gram"),
    ("Hz", "hertz"),
    ("N", "newton"),
    ("Pa", "pascal"),
    ("J", "joule"),
    ("W", "watt"),
    ("C", "coulomb"),
    ("V", "volt"),
    ("S", "siemens"),
    ("F", "farad"),
    ("Wb", "weber"),
    ("T", "tesla"),
    ("H", "henry"),
    ("Bq", "becquerel"),
    ("Gy", "gray"),
    ("Sv", "sievert"),
    ("kat", "katal"),
    ("lm", "lumen"),
    ("lx", "lux"),
    ("celsius", "degree_Celsius"),
    ("degC", "degree_Celsius"),
    ("deg_C", "degree_Celsius"),
    ("°C", "degree_Celsius"),
    ("degrees_Celsius", "degree_Celsius"),
    ("degR", "degree_Rankine"),
    ("fahrenheit", "degree_Fahrenheit"),
    ("degF", "degree_Fahrenheit"),
    ("deg_F", "degree_Fahrenheit"),
    ("°F", "degree_Fahrenheit"),
    ("degrees_Fahrenheit", "degree_Fahrenheit"),
    ("degK", "K"),
    ("deg_K", "K"),
    ("sec", "second"),
    ("min", "minute"),
    ("h", "hour"),
    ("hr", "hour"),
    ("d", "day"),
    ("yr", "year"),
    ("deg", "degree"),
    ("°", "degree"),
    ("arc_degree", "degree"),
    ("angular_degree", "degree"),
    ("degree_north", "degree"),
    ("degree_east", "degree"),
    ("degree_N", "degree"),
    ("degree_E", "degree"),
    ("degreeN", "degree"),
    ("degreeE", "degree"),
    ("degrees_north", "degree"),
    ("degrees_east", "degree"),
    ("degrees_N", "degree"),
    ("degrees_E", "degree"),
    ("degree_true", "degree"),
    ("degrees_true", "degree"),
    ("in", "inch"),
    ("ft", "foot"),
    ("feet", "foot"),
    ("inches", "inch"),
    ("yd", "yard"),
    ("mi", "mile"),
    ("ha", "hectare"),
    ("litre", "liter"),
    ("L", "liter"),
    ("l", "liter"),
    ("kt", "knot"),
    ("kn", "knot"),
    ("atm", "atmosphere"),
    ("mmHg", "millimeter_Hg"),
    ("cal", "calorie"),
    ("B", "bel"),
    ("dB", "decibel"),
];

/// A unit database file merged on top of the built-in vocabulary.
///
/// Accepts YAML (or JSON, chosen by the `.json` extension):
///
/// ```yaml
/// units:
///   - name: furlong
///     definition: "201.168 m"
///     aliases: [fur]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitDatabase {
    #[serde(default)]
    pub units: Vec<UnitDefinition>,
}

/// A single named unit definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub name: String,
    pub definition: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl UnitDatabase {
    /// Read a database file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            UnitsError::system_init(format!("cannot read unit database {}: {}", path.display(), e))
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            serde_json::from_str(&text).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&text).map_err(|e| e.to_string())
        };
        parsed.map_err(|e| {
            UnitsError::system_init(format!("invalid unit database {}: {}", path.display(), e))
        })
    }
}

/// Registry of named units.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: HashMap<String, Unit>,
}

impl UnitRegistry {
    /// Build the registry with the built-in vocabulary.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self {
            units: HashMap::new(),
        };

        for (index, (symbol, name)) in BASE_UNITS.iter().enumerate() {
            registry.units.insert(symbol.to_string(), Unit::base(index));
            registry.units.insert(name.to_string(), Unit::base(index));
        }

        // aliases of a unit are usable by the definitions after it
        for (name, definition) in DEFINITIONS {
            registry
                .define(name, definition)
                .map_err(|e| UnitsError::system_init(format!("built-in unit '{}': {}", name, e)))?;
            for (alias, _) in ALIASES.iter().filter(|(_, target)| target == name) {
                registry.alias(alias, name)?;
            }
        }

        for (alias, name) in ALIASES {
            registry
                .alias(alias, name)
                .map_err(|e| UnitsError::system_init(format!("built-in alias '{}': {}", alias, e)))?;
        }

        debug!(units = registry.units.len(), "Built-in unit registry ready");
        Ok(registry)
    }

    /// Build the registry and merge a database file on top.
    pub fn with_database(path: &Path) -> Result<Self> {
        let mut registry = Self::builtin()?;
        let database = UnitDatabase::load(path)?;
        registry.merge(&database)?;
        info!(
            path = %path.display(),
            definitions = database.units.len(),
            "Loaded unit database"
        );
        Ok(registry)
    }

    /// Merge database definitions; any bad entry fails the whole merge.
    pub fn merge(&mut self, database: &UnitDatabase) -> Result<()> {
        for def in &database.units {
            self.define(&def.name, &def.definition)
                .map_err(|e| UnitsError::system_init(format!("unit '{}': {}", def.name, e)))?;
            for alias in &def.aliases {
                self.alias(alias, &def.name)
                    .map_err(|e| UnitsError::system_init(format!("alias '{}': {}", alias, e)))?;
            }
        }
        Ok(())
    }

    /// Define (or redefine) a named unit from a unit expression.
    pub fn define(&mut self, name: &str, definition: &str) -> Result<()> {
        let unit = parse_unit(definition, self)?;
        self.units.insert(name.to_string(), unit);
        Ok(())
    }

    /// Register another spelling for an existing unit.
    pub fn alias(&mut self, alias: &str, name: &str) -> Result<()> {
        let unit = self
            .units
            .get(name)
            .copied()
            .ok_or_else(|| UnitsError::parse(name, "alias target is not defined"))?;
        self.units.insert(alias.to_string(), unit);
        Ok(())
    }

    /// Parse a unit expression.
    pub fn parse(&self, text: &str) -> Result<Unit> {
        parse_unit(text, self)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if the registry has no names.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn exact(&self, name: &str) -> Option<Unit> {
        self.units.get(name).copied()
    }

    fn singular(&self, name: &str) -> Option<Unit> {
        if name.chars().count() < 3 {
            return None;
        }
        name.strip_suffix("es")
            .and_then(|stem| self.exact(stem))
            .or_else(|| name.strip_suffix('s').and_then(|stem| self.exact(stem)))
    }

    fn prefixed(&self, name: &str, resolve: impl Fn(&str) -> Option<Unit>) -> Option<Unit> {
        for (long, symbols, factor) in PREFIXES {
            let candidates = std::iter::once(*long).chain(symbols.iter().copied());
            for prefix in candidates {
                if let Some(rest) = name.strip_prefix(prefix) {
                    if rest.is_empty() {
                        continue;
                    }
                    if let Some(unit) = resolve(rest).filter(|u| !u.is_logarithmic()) {
                        return Some(unit.scaled(*factor));
                    }
                }
            }
        }
        None
    }
}

impl NameLookup for UnitRegistry {
    /// Resolution order: exact, prefix + exact, plural, prefix + plural.
    fn lookup(&self, name: &str) -> Option<Unit> {
        self.exact(name)
            .or_else(|| self.prefixed(name, |rest| self.exact(rest)))
            .or_else(|| self.singular(name))
            .or_else(|| self.prefixed(name, |rest| self.singular(rest)))
    }
}

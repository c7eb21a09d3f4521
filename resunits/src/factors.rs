//! Conversion constant tables and the canned Metric/Field systems
//!
//! Each table holds, per canonical dimension, the factor converting a value
//! in that system's unit to SI.

use serde::{Deserialize, Serialize};
use resunits_core::Dimension;
use crate::UnitSystem;

/// Name of the dimensionless entry present in every canned system
pub const DIMENSIONLESS: &str = "1";

/// Name of the NaN sentinel present in every canned system
pub const CONTEXT_DEPENDENT: &str = "ContextDependent";

// SI definitions of the units used by the tables below.
mod si {
    pub const MILLI: f64 = 1.0e-3;
    pub const CENTI: f64 = 1.0e-2;
    pub const KILO: f64 = 1.0e3;

    pub const METER: f64 = 1.0;
    pub const INCH: f64 = 0.0254;
    pub const FEET: f64 = 0.3048;

    pub const SECOND: f64 = 1.0;
    pub const DAY: f64 = 86400.0 * SECOND;

    pub const KILOGRAM: f64 = 1.0;
    pub const POUND: f64 = 0.45359237;

    pub const CUBIC_METER: f64 = METER * METER * METER;
    pub const CUBIC_FEET: f64 = FEET * FEET * FEET;
    /// Stock tank barrel (42 US gallons)
    pub const STB: f64 = 0.158987294928;

    pub const GRAVITY: f64 = 9.80665;
    pub const POUND_FORCE: f64 = POUND * GRAVITY;
    pub const BAR: f64 = 1.0e5;
    pub const PSI: f64 = POUND_FORCE / (INCH * INCH);

    pub const DARCY: f64 = 9.869233e-13;
    pub const POISE: f64 = 0.1;
}

/// SI factors for the canonical dimensions of one unit system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConversionTable {
    pub pressure: f64,
    pub length: f64,
    pub time: f64,
    pub mass: f64,
    pub permeability: f64,
    pub gas_dissolution_factor: f64,
    pub oil_dissolution_factor: f64,
    pub liquid_volume: f64,
    pub gas_volume: f64,
    pub density: f64,
    pub polymer_density: f64,
    pub viscosity: f64,
    pub timestep: f64,
}

/// Metric: bar, metre, day, kilogram, millidarcy, sm³, kg/m³, cP
pub const METRIC: ConversionTable = ConversionTable {
    pressure: si::BAR,
    length: si::METER,
    time: si::DAY,
    mass: si::KILOGRAM,
    permeability: si::MILLI * si::DARCY,
    gas_dissolution_factor: si::CUBIC_METER / si::CUBIC_METER,
    oil_dissolution_factor: si::CUBIC_METER / si::CUBIC_METER,
    liquid_volume: si::CUBIC_METER,
    gas_volume: si::CUBIC_METER,
    density: si::KILOGRAM / si::CUBIC_METER,
    polymer_density: si::KILOGRAM / si::CUBIC_METER,
    viscosity: si::CENTI * si::POISE,
    timestep: si::DAY,
};

/// Field: psi, foot, day, pound, millidarcy, Mscf/stb, stb, lb/ft³, cP
pub const FIELD: ConversionTable = ConversionTable {
    pressure: si::PSI,
    length: si::FEET,
    time: si::DAY,
    mass: si::POUND,
    permeability: si::MILLI * si::DARCY,
    gas_dissolution_factor: si::KILO * si::CUBIC_FEET / si::STB,
    oil_dissolution_factor: si::STB / (si::KILO * si::CUBIC_FEET),
    liquid_volume: si::STB,
    gas_volume: si::KILO * si::CUBIC_FEET,
    density: si::POUND / si::CUBIC_FEET,
    polymer_density: si::POUND / si::STB,
    viscosity: si::CENTI * si::POISE,
    timestep: si::DAY,
};

impl ConversionTable {
    /// Dimension names paired with their factor, in registration order
    pub fn entries(&self) -> [(&'static str, f64); 13] {
        [
            ("Pressure", self.pressure),
            ("Length", self.length),
            ("Time", self.time),
            ("Mass", self.mass),
            ("Permeability", self.permeability),
            ("GasDissolutionFactor", self.gas_dissolution_factor),
            ("OilDissolutionFactor", self.oil_dissolution_factor),
            ("LiquidVolume", self.liquid_volume),
            ("GasVolume", self.gas_volume),
            ("Density", self.density),
            ("PolymerDensity", self.polymer_density),
            ("Viscosity", self.viscosity),
            ("Timestep", self.timestep),
        ]
    }
}

impl UnitSystem {
    /// Build a populated system from a conversion table.
    ///
    /// Registers "1", every table entry, and `ContextDependent` with a NaN factor.
    pub fn from_table(name: impl Into<String>, table: &ConversionTable) -> Self {
        let mut system = UnitSystem::new(name);
        system.add_dimension(Dimension::new(DIMENSIONLESS, 1.0));
        for (dimension, si_scaling) in table.entries() {
            system.add_dimension(Dimension::new(dimension, si_scaling));
        }
        system.add_dimension(Dimension::new(CONTEXT_DEPENDENT, f64::NAN));
        system
    }

    pub fn new_metric() -> Self {
        Self::from_table("Metric", &METRIC)
    }

    pub fn new_field() -> Self {
        Self::from_table("Field", &FIELD)
    }
}

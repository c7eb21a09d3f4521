//! Resunits - Named Unit Systems
//!
//! A `UnitSystem` is a registry of dimensions (Pressure, Length, Time, ...)
//! bound to their scaling factor relative to SI. Dimensions can be combined
//! with expressions such as "Mass/Length*Time":
//! - `*` multiplies factors (any number of times)
//! - `/` divides the product on its left by the product on its right (at most once)
//!
//! Two canned systems are provided:
//! - Metric (bar, metre, day, kilogram, ...)
//! - Field (psi, foot, day, pound, stb, Mscf, ...)

mod system;
mod parse;
mod factors;

pub use system::UnitSystem;
pub use factors::{ConversionTable, METRIC, FIELD, CONTEXT_DEPENDENT, DIMENSIONLESS};
pub use resunits_core::{Dimension, UnitError, Result};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_systems() {
        let metric = UnitSystem::new_metric();
        let field = UnitSystem::new_field();

        assert_eq!(metric.name(), "Metric");
        assert_eq!(field.name(), "Field");
        assert_eq!(metric.len(), field.len());
        assert_ne!(metric, field);
    }

    #[test]
    fn test_expression_round_trip_through_registry() {
        let mut field = UnitSystem::new_field();
        let velocity = field.get_new_dimension("Length/Time").unwrap();

        assert_eq!(velocity.name(), "Length/Time");
        assert!((velocity.si_scaling() - 0.3048 / 86400.0).abs() < 1e-18);
        assert!(field.has_dimension("Length/Time"));
    }
}

//! Named dimensions with an SI scaling factor
//!
//! A `Dimension` binds a physical-quantity name (e.g. "Pressure") to the
//! factor that converts a value in the owning unit system to SI. Composite
//! dimensions are built from expressions like "Mass/Length*Time" and are
//! named after that expression verbatim.

use std::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A named physical-quantity axis with a scale factor relative to SI.
///
/// Immutable once constructed. The factor may be NaN, which marks a
/// "context dependent" dimension whose scale is only known at point of use.
#[derive(Debug, Clone)]
pub struct Dimension {
    name: String,
    si_scaling: f64,
}

impl Dimension {
    /// Create an atomic dimension
    pub fn new(name: impl Into<String>, si_scaling: f64) -> Self {
        Dimension {
            name: name.into(),
            si_scaling,
        }
    }

    /// Create a composite dimension from an expression and its precomputed factor
    pub fn new_composite(expression: impl Into<String>, si_scaling: f64) -> Self {
        Dimension {
            name: expression.into(),
            si_scaling,
        }
    }

    /// Check whether `name` is acceptable for an atomic dimension.
    ///
    /// Atomic names are non-empty and made of ASCII letters, or the digit `1`
    /// (the dimensionless entry). Operators never appear in atomic names.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic() || c == '1')
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn si_scaling(&self) -> f64 {
        self.si_scaling
    }

    /// True for the NaN sentinel
    pub fn is_context_dependent(&self) -> bool {
        self.si_scaling.is_nan()
    }

    /// Whether this dimension yields a meaningful factor when combined with others
    pub fn is_compositable(&self) -> bool {
        !self.is_context_dependent()
    }

    /// Structural comparison: same name, and same factor or both NaN
    pub fn equal(&self, other: &Dimension) -> bool {
        if self.name != other.name {
            return false;
        }
        self.si_scaling == other.si_scaling
            || (self.si_scaling.is_nan() && other.si_scaling.is_nan())
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.si_scaling)
    }
}

// JSON has no NaN, so the context-dependent factor travels as null.
#[derive(Serialize, Deserialize)]
struct DimensionRepr {
    name: String,
    si_scaling: Option<f64>,
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DimensionRepr {
            name: self.name.clone(),
            si_scaling: (!self.si_scaling.is_nan()).then_some(self.si_scaling),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = DimensionRepr::deserialize(deserializer)?;
        Ok(Dimension {
            name: repr.name,
            si_scaling: repr.si_scaling.unwrap_or(f64::NAN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let d = Dimension::new("Length", 0.3048);
        assert_eq!(d.name(), "Length");
        assert_eq!(d.si_scaling(), 0.3048);
        assert!(!d.is_context_dependent());
        assert!(d.is_compositable());
    }

    #[test]
    fn test_valid_names() {
        assert!(Dimension::is_valid_name("Pressure"));
        assert!(Dimension::is_valid_name("1"));
        assert!(!Dimension::is_valid_name(""));
        assert!(!Dimension::is_valid_name("Length/Time"));
        assert!(!Dimension::is_valid_name("Mass*Length"));
        assert!(!Dimension::is_valid_name("Gas Volume"));
    }

    #[test]
    fn test_equal() {
        let a = Dimension::new("Length", 0.3048);
        assert!(a.equal(&Dimension::new("Length", 0.3048)));
        assert!(!a.equal(&Dimension::new("Length", 1.0)));
        assert!(!a.equal(&Dimension::new("Time", 0.3048)));
    }

    #[test]
    fn test_nan_equal() {
        let a = Dimension::new("ContextDependent", f64::NAN);
        let b = Dimension::new("ContextDependent", f64::NAN);
        assert!(a.is_context_dependent());
        assert!(!a.is_compositable());
        assert_eq!(a, b);
        assert_ne!(a, Dimension::new("ContextDependent", 1.0));
    }

    #[test]
    fn test_composite_keeps_expression() {
        let d = Dimension::new_composite("Mass/Length*Time", 2.5);
        assert_eq!(d.name(), "Mass/Length*Time");
        assert_eq!(d.si_scaling(), 2.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Dimension::new("Time", 86400.0)), "Time (86400)");
    }

    #[test]
    fn test_serde_nan_as_null() {
        let d = Dimension::new("ContextDependent", f64::NAN);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"name":"ContextDependent","si_scaling":null}"#);

        let back: Dimension = serde_json::from_str(&json).unwrap();
        assert!(back.is_context_dependent());
        assert_eq!(back, d);
    }

    #[test]
    fn test_serde_value() {
        let back: Dimension = serde_json::from_str(r#"{"name":"Mass","si_scaling":0.45359237}"#).unwrap();
        assert_eq!(back, Dimension::new("Mass", 0.45359237));
    }
}

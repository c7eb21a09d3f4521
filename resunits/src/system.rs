//! Unit system registry
//!
//! Maps dimension names to shared, immutable `Dimension` values. Every key
//! equals the `name()` of the dimension stored under it.

use std::collections::HashMap;
use std::sync::Arc;
use resunits_core::{Dimension, Result, UnitError};
use tracing::{debug, trace};

/// A named registry of dimensions
#[derive(Debug, Clone)]
pub struct UnitSystem {
    name: String,
    dimensions: HashMap<String, Arc<Dimension>>,
}

impl UnitSystem {
    /// Create an empty unit system
    pub fn new(name: impl Into<String>) -> Self {
        UnitSystem {
            name: name.into(),
            dimensions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    /// Look up a registered dimension by exact name
    pub fn get_dimension(&self, name: &str) -> Result<Arc<Dimension>> {
        self.dimensions
            .get(name)
            .cloned()
            .ok_or_else(|| UnitError::UnknownDimension(name.to_string()))
    }

    /// Insert a dimension, replacing any entry with the same name
    pub fn add_dimension(&mut self, dimension: Dimension) {
        let key = dimension.name().to_string();
        if let Some(previous) = self.dimensions.insert(key, Arc::new(dimension)) {
            trace!(system = %self.name, dimension = %previous.name(), "replaced dimension");
        }
    }

    /// Register an atomic dimension from its name and SI factor
    pub fn add_dimension_with(&mut self, name: &str, si_scaling: f64) -> Result<()> {
        if !Dimension::is_valid_name(name) {
            return Err(UnitError::InvalidName(name.to_string()));
        }
        self.add_dimension(Dimension::new(name, si_scaling));
        Ok(())
    }

    /// Get a dimension by name, parsing and registering the expression on first use.
    ///
    /// The composite is stored under the full expression string, so a second
    /// call with the same expression returns the cached entry without parsing.
    /// Nothing is registered when parsing fails.
    pub fn get_new_dimension(&mut self, expression: &str) -> Result<Arc<Dimension>> {
        if !self.has_dimension(expression) {
            let dimension = self.parse(expression)?;
            debug!(
                system = %self.name,
                expression,
                si_scaling = dimension.si_scaling(),
                "registered composite dimension"
            );
            self.add_dimension(dimension);
        }
        self.get_dimension(expression)
    }

    /// All registered names, sorted
    pub fn dimension_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dimensions.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over registered dimensions in no particular order
    pub fn dimensions(&self) -> impl Iterator<Item = &Arc<Dimension>> {
        self.dimensions.values()
    }

    /// Structural comparison of the two registries.
    ///
    /// The system names are not compared. Entry counts must match and every
    /// entry must have an equal counterpart under the same name, which makes
    /// the relation symmetric.
    pub fn equal(&self, other: &UnitSystem) -> bool {
        if self.dimensions.len() != other.dimensions.len() {
            return false;
        }
        self.dimensions.iter().all(|(name, dim)| {
            other
                .dimensions
                .get(name)
                .is_some_and(|other_dim| dim.equal(other_dim))
        })
    }
}

impl PartialEq for UnitSystem {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

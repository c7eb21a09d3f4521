//! Resunits Core - Fundamental types
//!
//! This crate provides the core types used throughout resunits:
//! - `Dimension`: A named physical-quantity axis with an SI scaling factor
//! - `UnitError`: Structured errors with machine-readable codes

mod dimension;
mod error;

pub use dimension::Dimension;
pub use error::{UnitError, Result, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Dimension, UnitError};
    pub use crate::error::codes;
}

//! Structured errors for dimension lookup and expression parsing
//!
//! Every error carries a machine-readable code and a short suggestion so
//! callers (and the stdio server) can report failures without string matching.

use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const UNKNOWN_DIMENSION: &str = "UNKNOWN_DIMENSION";
    pub const MALFORMED_EXPRESSION: &str = "MALFORMED_EXPRESSION";
    pub const INVALID_NAME: &str = "INVALID_NAME";
}

/// Error type for unit system operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("Dimension: {0} not recognized")]
    UnknownDimension(String),

    #[error("Malformed dimension expression '{expression}': found {divisions} division signs, at most one division sign allowed")]
    MalformedExpression { expression: String, divisions: usize },

    #[error("Invalid dimension name: '{0}'")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, UnitError>;

impl UnitError {
    pub fn code(&self) -> &'static str {
        match self {
            UnitError::UnknownDimension(_) => codes::UNKNOWN_DIMENSION,
            UnitError::MalformedExpression { .. } => codes::MALFORMED_EXPRESSION,
            UnitError::InvalidName(_) => codes::INVALID_NAME,
        }
    }

    /// Hint for fixing the error
    pub fn suggestion(&self) -> String {
        match self {
            UnitError::UnknownDimension(name) => {
                format!("Register '{}' before referencing it in an expression", name)
            }
            UnitError::MalformedExpression { .. } => {
                "Rewrite the expression as 'A*B/C*D' with a single '/'".to_string()
            }
            UnitError::InvalidName(_) => {
                "Atomic dimension names may only contain letters or '1'".to_string()
            }
        }
    }
}

//! Dimension expression parsing - expressions like "Mass/Length*Time"
//!
//! Grammar:
//! - factor     = name ('*' name)*
//! - expression = factor ('/' factor)?
//!
//! Atomic names must already be registered. Names are matched verbatim,
//! whitespace included.

use resunits_core::{Dimension, Result, UnitError};
use tracing::debug;
use crate::UnitSystem;

const DIVIDE: char = '/';
const MULTIPLY: char = '*';

impl UnitSystem {
    /// Parse an expression into a transient composite dimension.
    ///
    /// The composite is named after the full expression. The registry is not
    /// modified; use `get_new_dimension` to cache the result.
    pub fn parse(&self, expression: &str) -> Result<Dimension> {
        let divisions = expression.matches(DIVIDE).count();

        match divisions {
            0 => self.parse_factor(expression),
            1 => {
                let (dividend, divisor) = expression
                    .split_once(DIVIDE)
                    .ok_or_else(|| UnitError::MalformedExpression {
                        expression: expression.to_string(),
                        divisions,
                    })?;

                let dividend = self.parse_factor(dividend)?;
                let divisor = self.parse_factor(divisor)?;
                let si_scaling = dividend.si_scaling() / divisor.si_scaling();

                debug!(system = %self.name(), expression, si_scaling, "parsed quotient");
                Ok(Dimension::new_composite(expression, si_scaling))
            }
            _ => Err(UnitError::MalformedExpression {
                expression: expression.to_string(),
                divisions,
            }),
        }
    }

    /// Parse a product of registered names like "Mass*Length"
    pub fn parse_factor(&self, expression: &str) -> Result<Dimension> {
        let si_scaling = expression
            .split(MULTIPLY)
            .try_fold(1.0, |acc, name| {
                self.get_dimension(name).map(|dim| acc * dim.si_scaling())
            })?;

        Ok(Dimension::new_composite(expression, si_scaling))
    }
}

//! The per-cell condition grammar.
//!
//! A condition cell is `['!'] ('~' | ('>'|'<') operand | operand)` applied to
//! the resolved value of the row's subject coordinate:
//!
//! - `~` matches regardless of the resolved value.
//! - `>operand` / `<operand` compare numerically; both sides must parse as
//!   numbers or evaluation fails.
//! - a bare operand is exact, case-sensitive string equality.
//! - a leading `!` inverts the result of the body.
//!
//! Operands are coordinate text themselves, so a plain literal compares as
//! itself while `request::player` compares against the request payload.

use std::fmt;

use crate::context::ComputationContext;
use crate::core::coordinate::Coordinate;
use crate::error::{EngineError, Result};
use crate::trace::TraceKind;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Comparison {
    /// Wildcard: holds for any resolved value.
    Any,
    Greater(Coordinate),
    Less(Coordinate),
    Equals(Coordinate),
}

/// One condition cell bound to its subject coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    subject: Coordinate,
    comparison: Comparison,
    negated: bool,
}

impl Condition {
    /// Parse a condition cell against the given subject.
    pub fn parse(subject: Coordinate, cell: &str) -> Self {
        let (negated, body) = match cell.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, cell),
        };
        let comparison = if body == "~" {
            Comparison::Any
        } else if let Some(operand) = body.strip_prefix('>') {
            Comparison::Greater(Coordinate::from_text(operand))
        } else if let Some(operand) = body.strip_prefix('<') {
            Comparison::Less(Coordinate::from_text(operand))
        } else {
            Comparison::Equals(Coordinate::from_text(body))
        };
        Self {
            subject,
            comparison,
            negated,
        }
    }

    /// Evaluate against the context, recording a trace event.
    ///
    /// Resolution failures and non-numeric ordered comparisons abort the
    /// evaluation; they are never recovered here.
    pub fn evaluate(&self, context: &ComputationContext) -> Result<bool> {
        let holds = match &self.comparison {
            Comparison::Any => true,
            Comparison::Equals(operand) => {
                self.subject.resolve(context)? == operand.resolve(context)?
            }
            Comparison::Greater(operand) => {
                let (left, right) = self.numeric_sides(operand, context)?;
                left > right
            }
            Comparison::Less(operand) => {
                let (left, right) = self.numeric_sides(operand, context)?;
                left < right
            }
        };
        let result = holds != self.negated;
        context.log(TraceKind::Condition, format!("{self} => {result}"));
        Ok(result)
    }

    /// The subject's current value, for failure reporting.
    pub fn actual_value(&self, context: &ComputationContext) -> Result<String> {
        self.subject.resolve(context)
    }

    /// Resolve both sides of an ordered comparison as numbers.
    fn numeric_sides(
        &self,
        operand: &Coordinate,
        context: &ComputationContext,
    ) -> Result<(f64, f64)> {
        let left = self.subject.resolve(context)?;
        let right = operand.resolve(context)?;
        let non_numeric = || EngineError::NonNumeric {
            left: left.clone(),
            right: right.clone(),
        };
        let left_number = left.trim().parse().map_err(|_| non_numeric())?;
        let right_number = right.trim().parse().map_err(|_| non_numeric())?;
        Ok((left_number, right_number))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = match &self.comparison {
            Comparison::Any => format!("{} ~", self.subject),
            Comparison::Greater(operand) => format!("{} > {}", self.subject, operand),
            Comparison::Less(operand) => format!("{} < {}", self.subject, operand),
            Comparison::Equals(operand) => format!("{} = {}", self.subject, operand),
        };
        if self.negated {
            write!(f, "not ({body})")
        } else {
            write!(f, "{body}")
        }
    }
}

//! Addresses of runtime state fragments.

use std::fmt;

use crate::context::ComputationContext;
use crate::error::Result;

/// Well-known locator name for literal values.
pub const CONSTANT: &str = "constant";

/// Well-known locator name for the incoming request payload.
pub const REQUEST: &str = "request";

/// The address of one piece of runtime state: `locator::fragment`.
///
/// Text without the `::` separator addresses the constant locator, with the
/// text itself as the fragment — so a plain literal resolves to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    locator: String,
    fragment: String,
}

impl Coordinate {
    pub fn new(locator: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            fragment: fragment.into(),
        }
    }

    /// Parse coordinate text: `locator::fragment`, or a constant literal.
    pub fn from_text(text: &str) -> Self {
        match text.split_once("::") {
            Some((locator, fragment)) => Self::new(locator, fragment),
            None => Self::new(CONSTANT, text),
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// True if this coordinate reads from the incoming request payload.
    pub fn is_request(&self) -> bool {
        self.locator == REQUEST
    }

    /// Resolve this coordinate to its current string value.
    pub fn resolve(&self, context: &ComputationContext) -> Result<String> {
        context.value_for(self)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.locator == CONSTANT {
            write!(f, "{}", self.fragment)
        } else {
            write!(f, "{}::{}", self.locator, self.fragment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locator_and_fragment() {
        let coordinate = Coordinate::from_text("data::is-stored");
        assert_eq!(coordinate.locator(), "data");
        assert_eq!(coordinate.fragment(), "is-stored");
    }

    #[test]
    fn plain_text_is_a_constant() {
        let coordinate = Coordinate::from_text("42");
        assert_eq!(coordinate.locator(), CONSTANT);
        assert_eq!(coordinate.fragment(), "42");
    }

    #[test]
    fn empty_fragment_is_preserved() {
        let coordinate = Coordinate::from_text("request::");
        assert_eq!(coordinate.locator(), REQUEST);
        assert_eq!(coordinate.fragment(), "");
    }

    #[test]
    fn displays_without_constant_prefix() {
        assert_eq!(Coordinate::from_text("market::shop").to_string(), "market::shop");
        assert_eq!(Coordinate::from_text("Eugene").to_string(), "Eugene");
    }
}

//! The single failure kind surfaced to callers.

/// Errors raised while loading table sources or evaluating decisions.
///
/// Every variant carries a human-readable message; callers that only relay
/// errors can treat the whole enum as one opaque failure kind.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed table source, detected at load time.
    #[error("malformed source: {0}")]
    Configuration(String),

    /// A logical state source name with no registered locator.
    #[error("Locator '{0}' not found in computation context")]
    UnknownLocator(String),

    /// A fragment name the locator cannot resolve.
    #[error("fragment '{fragment}' not found in '{locator}'")]
    UnknownFragment { locator: String, fragment: String },

    /// A decision-table name with no loaded table.
    #[error("table '{0}' not found in computation context")]
    UnknownTable(String),

    /// More than one rule of a table matched; the table is malformed.
    #[error("Multiple rules are satisfied in table '{0}'")]
    MultipleRules(String),

    /// An ordered comparison over values that do not parse as numbers.
    #[error("cannot compare '{left}' and '{right}' as numbers")]
    NonNumeric { left: String, right: String },

    /// An assignment aimed at a locator that does not accept writes.
    #[error("assignment target '{0}' is read-only")]
    ReadOnly(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

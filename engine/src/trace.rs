//! Computation trace events.
//!
//! Every evaluation records what it checked and what it concluded into the
//! context's trace sink. The trace is observational: tests and diagnostics
//! may read it, but no evaluation result may depend on it.

use serde::{Deserialize, Serialize};

/// What kind of step produced a trace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    /// One condition cell was evaluated.
    Condition,
    /// One rule was checked against the context.
    Rule,
    /// One table produced an outcome mapping.
    Table,
    /// One assignment wrote into a state source.
    Assignment,
}

/// A single recorded evaluation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub kind: TraceKind,
    pub message: String,
}

impl TraceEvent {
    pub fn new(kind: TraceKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

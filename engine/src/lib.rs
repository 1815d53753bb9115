//! Decision-table evaluation engine.
//!
//! This crate turns tabular rule definitions into evaluated decisions: given
//! a set of tables (conditions, outcomes, state-mutating assignments) and a
//! pool of named state sources, it determines which rule currently holds and
//! produces either an outcome mapping or a performed state transition. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (conditions, rules, table
//!   matching). No I/O, fully testable in isolation.
//! - **[`source`]**: Parsing of tagged, delimited table text into the core
//!   model. Consumes pre-read lines; file discovery belongs to the caller.
//! - **[`state`]** / **[`context`]**: The mutable side — named state sources
//!   behind the [`state::Locator`] capability, assembled into a per-evaluation
//!   [`context::ComputationContext`].
//!
//! The facade module ([`facade`]) ties the three together for callers that
//! just want an outcome for a table name.

pub mod context;
pub mod core;
pub mod error;
pub mod facade;
pub mod source;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod trace;

pub use crate::error::{EngineError, Result};

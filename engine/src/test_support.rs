//! Test-only helpers for building fixture tables, states, and contexts.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::context::ComputationContext;
use crate::core::table::DecisionTables;
use crate::source::SourceLines;
use crate::state::StoredState;
use crate::state::locators::InMemoryLocator;

/// The sample table from the end-to-end scenarios: one greeting rule plus a
/// declared else column carrying its own outcomes.
pub const SAMPLE_TABLE: &[&str] = &[
    "HDR;sample-table;hello;fallback",
    "CND;data::is-stored;true",
    "CND;market::shop;2",
    "CND;currentPlayer::name;Eugene",
    "OUT;outcome;true;else",
    "OUT;text;hello world;no rule satisfied",
];

/// A deliberately malformed table: both rules hold for `data.value = 1`.
pub const MULTIPLE_RULES_TABLE: &[&str] = &[
    "HDR;multiple-rules;low;high",
    "CND;data::value;>0;<2",
    "OUT;outcome;first;second",
];

/// Parse named fixture tables with the default `;` delimiter.
pub fn tables_from(sources: &[(&str, &[&str])]) -> DecisionTables {
    let tables = sources
        .iter()
        .map(|(name, lines)| {
            SourceLines::from_lines(name, lines, ";")
                .expect("fixture source")
                .as_decision_table()
                .expect("fixture table")
        })
        .collect();
    DecisionTables::new(tables).expect("fixture tables")
}

/// A state of in-memory sources from `(source, fragments)` pairs.
pub fn memory_state(entries: &[(&str, &[(&str, Value)])]) -> StoredState {
    let mut state = StoredState::default();
    for (name, fragments) in entries {
        let values = fragments
            .iter()
            .map(|(fragment, value)| (fragment.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>();
        state.register(*name, Rc::new(InMemoryLocator::new(values)));
    }
    state
}

/// The three-source state used by the sample-table scenarios.
pub fn sample_state(is_stored: Value, shop: Value, player: &str) -> StoredState {
    memory_state(&[
        ("data", &[("is-stored", is_stored)]),
        ("market", &[("shop", shop)]),
        ("currentPlayer", &[("name", Value::String(player.to_string()))]),
    ])
}

/// A context over the given state and tables.
pub fn context_for(state: &StoredState, tables: DecisionTables) -> ComputationContext {
    ComputationContext::new(state, Rc::new(tables))
}

/// A context with no state sources and no tables; constants still resolve.
pub fn empty_context() -> ComputationContext {
    context_for(&StoredState::default(), DecisionTables::default())
}

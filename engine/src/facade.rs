//! Caller-facing entry point for computing decisions.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::context::ComputationContext;
use crate::core::table::DecisionTables;
use crate::error::Result;
use crate::state::StoredState;
use crate::state::locators::RequestLocator;

/// Loaded tables bound to a state, answering one decision per call.
///
/// Each call assembles a fresh [`ComputationContext`], so evaluations never
/// share caches or traces; the bound state is the only thing that persists
/// between calls.
#[derive(Debug, Clone)]
pub struct DecisionFacade {
    tables: Rc<DecisionTables>,
    state: StoredState,
}

impl DecisionFacade {
    pub fn new(tables: DecisionTables, state: StoredState) -> Self {
        Self {
            tables: Rc::new(tables),
            state,
        }
    }

    /// The same tables bound to a different state.
    pub fn with_state(&self, state: StoredState) -> Self {
        Self {
            tables: Rc::clone(&self.tables),
            state,
        }
    }

    pub fn tables(&self) -> &DecisionTables {
        &self.tables
    }

    /// A handle to the loaded tables, for collaborators that evaluate them
    /// against their own contexts.
    pub fn shared_tables(&self) -> Rc<DecisionTables> {
        Rc::clone(&self.tables)
    }

    pub fn state(&self) -> &StoredState {
        &self.state
    }

    /// Compute the named table's outcome with an empty request payload.
    pub fn decision_for(&self, table: &str) -> Result<BTreeMap<String, String>> {
        self.decision_for_with_request(table, RequestLocator::empty())
    }

    /// Compute the named table's outcome with an incoming request payload.
    pub fn decision_for_with_request(
        &self,
        table: &str,
        request: RequestLocator,
    ) -> Result<BTreeMap<String, String>> {
        self.evaluation_context_with_request(request)
            .decision_for(table)
    }

    /// A fresh context over the bound state, for callers that drive rules
    /// directly (self-tests, commands).
    pub fn evaluation_context(&self) -> ComputationContext {
        self.evaluation_context_with_request(RequestLocator::empty())
    }

    pub fn evaluation_context_with_request(&self, request: RequestLocator) -> ComputationContext {
        ComputationContext::with_request(&self.state, Rc::clone(&self.tables), request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        MULTIPLE_RULES_TABLE, SAMPLE_TABLE, memory_state, sample_state, tables_from,
    };
    use serde_json::json;

    fn sample_facade(state: StoredState) -> DecisionFacade {
        DecisionFacade::new(tables_from(&[("sample-table", SAMPLE_TABLE)]), state)
    }

    #[test]
    fn computes_the_whole_table() {
        let facade = sample_facade(sample_state(json!("true"), json!(2), "Eugene"));
        let outcome = facade.decision_for("sample-table").expect("decide");
        assert_eq!(outcome.get("outcome"), Some(&"true".to_string()));
        assert_eq!(outcome.get("text"), Some(&"hello world".to_string()));
    }

    #[test]
    fn falls_back_to_the_else_rule_when_nothing_matches() {
        let facade = sample_facade(sample_state(json!(false), json!(3), "Eugene"));
        let outcome = facade.decision_for("sample-table").expect("decide");
        assert_eq!(outcome.get("outcome"), Some(&"else".to_string()));
        assert_eq!(outcome.get("text"), Some(&"no rule satisfied".to_string()));
    }

    #[test]
    fn fails_when_several_rules_are_satisfied() {
        let facade = DecisionFacade::new(
            tables_from(&[("multiple-rules", MULTIPLE_RULES_TABLE)]),
            memory_state(&[("data", &[("value", json!(1))])]),
        );
        let err = facade.decision_for("multiple-rules").expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("Multiple rules are satisfied"), "got: {message}");
        assert!(message.contains("multiple-rules"), "got: {message}");
    }

    #[test]
    fn computes_a_table_linked_to_another() {
        let tables = tables_from(&[
            (
                "hello-world",
                &[
                    "CND;data::is-stored;true",
                    "OUT;outcome;Hello;World",
                ][..],
            ),
            (
                "target",
                &[
                    "CND;hello-world::outcome;Hello;World",
                    "OUT;outcome;true;false",
                ][..],
            ),
        ]);
        let state = memory_state(&[("data", &[("is-stored", json!("true"))])]);
        let facade = DecisionFacade::new(tables, state);
        let outcome = facade.decision_for("target").expect("decide");
        assert_eq!(outcome.get("outcome"), Some(&"true".to_string()));
    }

    #[test]
    fn unchanged_state_yields_identical_outcomes() {
        let facade = sample_facade(sample_state(json!("true"), json!(2), "Eugene"));
        let first = facade.decision_for("sample-table").expect("decide");
        let second = facade.decision_for("sample-table").expect("decide");
        assert_eq!(first, second);
    }

    #[test]
    fn rebinding_state_leaves_the_original_untouched() {
        let facade = sample_facade(sample_state(json!("true"), json!(2), "Eugene"));
        let rebound = facade.with_state(sample_state(json!(false), json!(3), "Eugene"));
        assert_eq!(
            rebound.decision_for("sample-table").expect("decide")["outcome"],
            "else"
        );
        assert_eq!(
            facade.decision_for("sample-table").expect("decide")["outcome"],
            "true"
        );
    }
}

//! The execution seam for named transitions.
//!
//! The engine decides; something else executes. This module owns that
//! boundary: a backend receives the command name, the resolved request
//! payload, and the live state, and its semantics are opaque to the rest of
//! the checker.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{Context, Result};
use engine::context::ComputationContext;
use engine::core::table::DecisionTables;
use engine::state::StoredState;
use engine::state::locators::RequestLocator;
use tracing::debug;

/// Executes a named command against the live state.
pub trait CommandBackend {
    fn perform(
        &self,
        name: &str,
        request: &BTreeMap<String, String>,
        state: &StoredState,
    ) -> Result<()>;
}

/// A backend where commands are decision tables themselves: performing a
/// transition evaluates the like-named table with the request payload
/// registered and runs the winning rule's assignments.
pub struct TableCommands {
    tables: Rc<DecisionTables>,
}

impl TableCommands {
    pub fn new(tables: Rc<DecisionTables>) -> Self {
        Self { tables }
    }
}

impl CommandBackend for TableCommands {
    fn perform(
        &self,
        name: &str,
        request: &BTreeMap<String, String>,
        state: &StoredState,
    ) -> Result<()> {
        debug!(command = name, args = request.len(), "performing transition");
        let request = RequestLocator::from_args(request.clone());
        let context = ComputationContext::with_request(state, Rc::clone(&self.tables), request);
        context
            .perform(name)
            .with_context(|| format!("perform '{name}'"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::test_support::{memory_state, tables_from};
    use serde_json::json;

    const CLAIM_ITEM: &[&str] = &[
        "HDR;claim-item;claim",
        "CND;data::owner;nobody",
        "ASG;data::owner;request::user",
        "OUT;outcome;claimed",
    ];

    #[test]
    fn performing_a_transition_mutates_the_live_state() {
        let state = memory_state(&[("data", &[("owner", json!("nobody"))])]);
        let tables = Rc::new(tables_from(&[("claim-item", CLAIM_ITEM)]));
        let backend = TableCommands::new(tables);

        let request = BTreeMap::from([("user".to_string(), "Eugene".to_string())]);
        backend.perform("claim-item", &request, &state).expect("perform");

        assert_eq!(state.export()["data"]["owner"], json!("Eugene"));
    }

    #[test]
    fn unknown_commands_are_reported() {
        let state = memory_state(&[]);
        let backend = TableCommands::new(Rc::new(tables_from(&[])));
        let err = backend
            .perform("missing", &BTreeMap::new(), &state)
            .expect_err("must fail");
        assert!(format!("{err:#}").contains("table 'missing' not found"));
    }
}

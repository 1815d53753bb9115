//! One bound instance of a decision-table computation.
//!
//! [`Computation`] is the boundary object callers talk to: decisions against
//! the bound state (or an explicit one), transitions forwarded to the command
//! backend, and state inspection/rebinding through the plain nested mapping.

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;
use engine::core::coordinate::Coordinate;
use engine::facade::DecisionFacade;
use engine::state::{StateMapping, StoredState};

use crate::commands::CommandBackend;

/// A named transition with its request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub name: String,
    pub request: BTreeMap<String, String>,
}

/// Decision tables bound to a state and a command backend.
pub struct Computation {
    decisions: DecisionFacade,
    commands: Rc<dyn CommandBackend>,
}

impl Computation {
    pub fn new(decisions: DecisionFacade, commands: Rc<dyn CommandBackend>) -> Self {
        Self {
            decisions,
            commands,
        }
    }

    pub fn decisions(&self) -> &DecisionFacade {
        &self.decisions
    }

    /// Compute the decision for a table against the bound state.
    pub fn decide_for(&self, table: &str) -> engine::Result<BTreeMap<String, String>> {
        self.decisions.decision_for(table)
    }

    /// Compute the decision for a table against an explicit state.
    pub fn decide_for_in(
        &self,
        table: &str,
        state: &StoredState,
    ) -> engine::Result<BTreeMap<String, String>> {
        self.decisions.with_state(state.clone()).decision_for(table)
    }

    /// Forward a transition to the command backend. This is the live-state
    /// mutation boundary.
    pub fn perform(&self, transition: &Transition) -> Result<()> {
        self.commands
            .perform(&transition.name, &transition.request, self.decisions.state())
    }

    pub fn has_state_for(&self, source: &str) -> bool {
        self.decisions.state().has_locator(source)
    }

    /// Resolve the requested fragments of one state source.
    pub fn state_for(
        &self,
        source: &str,
        fragments: &[String],
    ) -> engine::Result<BTreeMap<String, String>> {
        // Surface an unknown source before resolving anything.
        self.decisions.state().locator_for(source)?;
        let context = self.decisions.evaluation_context();
        fragments
            .iter()
            .map(|fragment| {
                let value = Coordinate::new(source, fragment.clone()).resolve(&context)?;
                Ok((fragment.clone(), value))
            })
            .collect()
    }

    /// The same tables and backend bound to a caller-supplied snapshot.
    pub fn with_state(&self, mapping: StateMapping) -> Self {
        Self {
            decisions: self.decisions.with_state(StoredState::from_mapping(mapping)),
            commands: Rc::clone(&self.commands),
        }
    }

    /// Export the bound state for serialization.
    pub fn stored_state(&self) -> StateMapping {
        self.decisions.state().export()
    }
}

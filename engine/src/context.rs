//! The per-evaluation container wiring state sources to the decision model.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::core::coordinate::{CONSTANT, Coordinate, REQUEST};
use crate::core::table::DecisionTables;
use crate::error::{EngineError, Result};
use crate::state::locators::{ConstantLocator, RequestLocator, TableLocator};
use crate::state::{Locator, StoredState};
use crate::trace::{TraceEvent, TraceKind};

/// A short-lived registry of locators plus a computation trace sink.
///
/// One context serves one evaluation request. The registry is assembled
/// explicitly at construction: the stored state's sources, the constant
/// locator, one table locator per loaded table, and (optionally) the
/// incoming request. Contexts are not safe to share across concurrent
/// evaluations — assignment execution mutates locator-backed storage in
/// place.
pub struct ComputationContext {
    locators: BTreeMap<String, Rc<dyn Locator>>,
    tables: Rc<DecisionTables>,
    outcomes: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    computing: RefCell<Vec<String>>,
    trace: RefCell<Vec<TraceEvent>>,
}

impl ComputationContext {
    pub fn new(state: &StoredState, tables: Rc<DecisionTables>) -> Self {
        let mut locators: BTreeMap<String, Rc<dyn Locator>> = state
            .locators()
            .map(|(name, locator)| (name.clone(), Rc::clone(locator)))
            .collect();
        locators
            .entry(CONSTANT.to_string())
            .or_insert_with(|| Rc::new(ConstantLocator));
        for table in tables.iter() {
            locators
                .entry(table.name().to_string())
                .or_insert_with(|| Rc::new(TableLocator::new(table.name())));
        }
        Self {
            locators,
            tables,
            outcomes: RefCell::new(BTreeMap::new()),
            computing: RefCell::new(Vec::new()),
            trace: RefCell::new(Vec::new()),
        }
    }

    /// A context carrying an incoming request payload under `request`.
    pub fn with_request(
        state: &StoredState,
        tables: Rc<DecisionTables>,
        request: RequestLocator,
    ) -> Self {
        let mut context = Self::new(state, tables);
        context.register_locator(REQUEST, Rc::new(request));
        context
    }

    /// Register (or replace) a locator under a logical source name.
    pub fn register_locator(&mut self, name: impl Into<String>, locator: Rc<dyn Locator>) {
        self.locators.insert(name.into(), locator);
    }

    pub fn locator_for(&self, name: &str) -> Result<Rc<dyn Locator>> {
        self.locators
            .get(name)
            .map(Rc::clone)
            .ok_or_else(|| EngineError::UnknownLocator(name.to_string()))
    }

    /// Resolve a coordinate to its current string value.
    pub fn value_for(&self, coordinate: &Coordinate) -> Result<String> {
        let locator = self.locator_for(coordinate.locator())?;
        locator
            .fragment_by(coordinate.fragment(), self)
            .map_err(|err| at_locator(err, coordinate.locator()))
    }

    /// Write a value through the coordinate's locator.
    pub fn assign(&self, coordinate: &Coordinate, value: &str) -> Result<()> {
        let locator = self.locator_for(coordinate.locator())?;
        locator
            .assign(coordinate.fragment(), value)
            .map_err(|err| match err {
                EngineError::ReadOnly(_) => EngineError::ReadOnly(coordinate.to_string()),
                other => at_locator(other, coordinate.locator()),
            })
    }

    /// Compute (or recall) the named table's outcome mapping.
    ///
    /// Outcomes are cached per context, so nested references to the same
    /// table resolve once. A table that is already being computed further up
    /// this call chain means the table definitions form a cycle.
    pub fn decision_for(&self, table: &str) -> Result<BTreeMap<String, String>> {
        if let Some(cached) = self.outcomes.borrow().get(table) {
            return Ok(cached.clone());
        }
        if self.computing.borrow().iter().any(|name| name == table) {
            let mut path = self.computing.borrow().join(" -> ");
            path.push_str(&format!(" -> {table}"));
            return Err(EngineError::Configuration(format!(
                "cyclic table dependency: {path}"
            )));
        }
        debug!(table, "computing decision");
        self.computing.borrow_mut().push(table.to_string());
        let result = self
            .tables
            .table_for(table)
            .and_then(|found| found.outcome(self));
        self.computing.borrow_mut().pop();
        let outcome = result?;
        self.outcomes
            .borrow_mut()
            .insert(table.to_string(), outcome.clone());
        Ok(outcome)
    }

    /// Drop cached table outcomes so the next resolution recomputes them.
    /// Matters after assignments have changed upstream state.
    pub fn reload_tables(&self) {
        self.outcomes.borrow_mut().clear();
    }

    /// Execute the named table as a command against this context.
    pub fn perform(&self, command: &str) -> Result<()> {
        debug!(command, "performing command");
        self.tables.table_for(command)?.perform(self)
    }

    /// A sibling context over a reset-to-default deep copy of every source.
    ///
    /// This is the self-test isolation boundary: the copy shares nothing
    /// mutable with this context, so replaying a rule's mutation never
    /// touches live data.
    pub fn empty_state_copy(&self) -> Self {
        Self {
            locators: self
                .locators
                .iter()
                .map(|(name, locator)| (name.clone(), locator.empty_copy()))
                .collect(),
            tables: Rc::clone(&self.tables),
            outcomes: RefCell::new(BTreeMap::new()),
            computing: RefCell::new(Vec::new()),
            trace: RefCell::new(Vec::new()),
        }
    }

    /// Record a trace event. Observational only: results never depend on it.
    pub fn log(&self, kind: TraceKind, message: impl Into<String>) {
        self.trace.borrow_mut().push(TraceEvent::new(kind, message));
    }

    /// The trace recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.trace.borrow().clone()
    }
}

/// Attach the registration name to fragment misses raised by locators that
/// do not know the name they were registered under.
fn at_locator(err: EngineError, name: &str) -> EngineError {
    match err {
        EngineError::UnknownFragment { locator, fragment } if locator.is_empty() => {
            EngineError::UnknownFragment {
                locator: name.to_string(),
                fragment,
            }
        }
        other => other,
    }
}

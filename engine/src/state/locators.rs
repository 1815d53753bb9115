//! The built-in locator variants.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;

use crate::context::ComputationContext;
use crate::core::condition::Condition;
use crate::error::{EngineError, Result};
use crate::state::{DEFAULT_VALUE, Locator};

/// A fragment miss whose locator name is filled in by the context, which
/// knows the registration name the locator itself does not.
fn missing_fragment(fragment: &str) -> EngineError {
    EngineError::UnknownFragment {
        locator: String::new(),
        fragment: fragment.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => DEFAULT_VALUE.to_string(),
        other => other.to_string(),
    }
}

/// A writable map of fragment values. Values keep their JSON representation
/// in storage and become strings at the resolution boundary.
#[derive(Debug, Default)]
pub struct InMemoryLocator {
    values: RefCell<BTreeMap<String, Value>>,
}

impl InMemoryLocator {
    pub fn new(values: BTreeMap<String, Value>) -> Self {
        Self {
            values: RefCell::new(values),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl Locator for InMemoryLocator {
    fn fragment_by(&self, fragment: &str, _context: &ComputationContext) -> Result<String> {
        self.values
            .borrow()
            .get(fragment)
            .map(value_text)
            .ok_or_else(|| missing_fragment(fragment))
    }

    fn assign(&self, fragment: &str, value: &str) -> Result<()> {
        self.values
            .borrow_mut()
            .insert(fragment.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    fn snapshot(&self) -> Rc<dyn Locator> {
        Rc::new(Self::new(self.values.borrow().clone()))
    }

    fn empty_copy(&self) -> Rc<dyn Locator> {
        let reset = self
            .values
            .borrow()
            .keys()
            .map(|key| (key.clone(), Value::String(DEFAULT_VALUE.to_string())))
            .collect();
        Rc::new(Self::new(reset))
    }

    fn export(&self) -> Option<BTreeMap<String, Value>> {
        Some(self.values.borrow().clone())
    }
}

/// The incoming request payload, keyed by argument name.
///
/// Registered per evaluation under the `request` name; not part of the
/// durable state export.
#[derive(Debug, Default)]
pub struct RequestLocator {
    inner: InMemoryLocator,
}

impl RequestLocator {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_args(args: BTreeMap<String, String>) -> Self {
        let values = args
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        Self {
            inner: InMemoryLocator::new(values),
        }
    }
}

impl Locator for RequestLocator {
    fn fragment_by(&self, fragment: &str, context: &ComputationContext) -> Result<String> {
        self.inner.fragment_by(fragment, context)
    }

    fn assign(&self, fragment: &str, value: &str) -> Result<()> {
        self.inner.assign(fragment, value)
    }

    fn snapshot(&self) -> Rc<dyn Locator> {
        Rc::new(Self {
            inner: InMemoryLocator::new(self.inner.values.borrow().clone()),
        })
    }

    fn empty_copy(&self) -> Rc<dyn Locator> {
        let reset = self
            .inner
            .values
            .borrow()
            .keys()
            .map(|key| (key.clone(), Value::String(DEFAULT_VALUE.to_string())))
            .collect();
        Rc::new(Self {
            inner: InMemoryLocator::new(reset),
        })
    }
}

/// Resolves every fragment to the fragment text itself, so plain literals in
/// coordinates evaluate to their own value.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantLocator;

impl Locator for ConstantLocator {
    fn fragment_by(&self, fragment: &str, _context: &ComputationContext) -> Result<String> {
        Ok(fragment.to_string())
    }

    fn snapshot(&self) -> Rc<dyn Locator> {
        Rc::new(Self)
    }

    fn empty_copy(&self) -> Rc<dyn Locator> {
        Rc::new(Self)
    }
}

/// Fronts another decision table: resolving a fragment computes the table's
/// outcome (through the context, sharing its cache) and projects one field.
#[derive(Debug, Clone)]
pub struct TableLocator {
    table: String,
}

impl TableLocator {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl Locator for TableLocator {
    fn fragment_by(&self, fragment: &str, context: &ComputationContext) -> Result<String> {
        let outcome = context.decision_for(&self.table)?;
        outcome
            .get(fragment)
            .cloned()
            .ok_or_else(|| EngineError::UnknownFragment {
                locator: self.table.clone(),
                fragment: fragment.to_string(),
            })
    }

    fn snapshot(&self) -> Rc<dyn Locator> {
        Rc::new(self.clone())
    }

    fn empty_copy(&self) -> Rc<dyn Locator> {
        Rc::new(self.clone())
    }
}

/// A registry of named conditions resolved on demand.
///
/// Evaluation results are cached per instance, which keeps repeated
/// resolution of the same fragment idempotent within one evaluation.
#[derive(Debug, Default)]
pub struct ConditionsLocator {
    conditions: BTreeMap<String, Condition>,
    results: RefCell<BTreeMap<String, String>>,
}

impl ConditionsLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a named condition, consuming and returning self for chaining.
    pub fn with(mut self, name: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(name.into(), condition);
        self
    }
}

impl Locator for ConditionsLocator {
    fn fragment_by(&self, fragment: &str, context: &ComputationContext) -> Result<String> {
        if let Some(result) = self.results.borrow().get(fragment) {
            return Ok(result.clone());
        }
        let condition = self
            .conditions
            .get(fragment)
            .ok_or_else(|| missing_fragment(fragment))?;
        let result = condition.evaluate(context)?.to_string();
        self.results
            .borrow_mut()
            .insert(fragment.to_string(), result.clone());
        Ok(result)
    }

    fn snapshot(&self) -> Rc<dyn Locator> {
        Rc::new(Self {
            conditions: self.conditions.clone(),
            results: RefCell::new(self.results.borrow().clone()),
        })
    }

    fn empty_copy(&self) -> Rc<dyn Locator> {
        Rc::new(Self {
            conditions: self.conditions.clone(),
            results: RefCell::new(BTreeMap::new()),
        })
    }
}

//! Named state sources behind a polymorphic resolution capability.

pub mod locators;

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::context::ComputationContext;
use crate::error::{EngineError, Result};
use crate::state::locators::InMemoryLocator;

/// Value fragments are reset to when state is copied for a self-test.
pub const DEFAULT_VALUE: &str = "undefined";

/// A plain nested mapping of the whole state, for serialization and interop.
pub type StateMapping = BTreeMap<String, BTreeMap<String, Value>>;

/// A resolver of fragments from one logical state source.
///
/// Locators are capability objects: resolving may consult the context again
/// (a locator fronting another decision table computes that table's outcome),
/// and resolution must be idempotent — evaluation order is not observable
/// beyond trace logging.
pub trait Locator {
    /// Resolve a fragment to its current string value.
    ///
    /// Values are strings at this boundary regardless of their stored
    /// representation.
    fn fragment_by(&self, fragment: &str, context: &ComputationContext) -> Result<String>;

    /// Write a fragment value. Rejected unless the source overrides it; the
    /// context rewrites the error to name the full coordinate.
    fn assign(&self, fragment: &str, value: &str) -> Result<()> {
        let _ = value;
        Err(EngineError::ReadOnly(fragment.to_string()))
    }

    /// A structurally independent deep copy.
    fn snapshot(&self) -> Rc<dyn Locator>;

    /// A deep copy with every fragment reset to [`DEFAULT_VALUE`].
    fn empty_copy(&self) -> Rc<dyn Locator>;

    /// The source's data as a plain mapping, if it holds durable data.
    fn export(&self) -> Option<BTreeMap<String, Value>> {
        None
    }
}

impl fmt::Debug for dyn Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<locator>")
    }
}

/// The durable registry of logical source names to their locators.
///
/// Cloning shares the underlying sources (a context and its owner see the
/// same mutations); [`StoredState::snapshot`] is the independent deep copy.
#[derive(Clone, Default)]
pub struct StoredState {
    locators: BTreeMap<String, Rc<dyn Locator>>,
}

impl StoredState {
    pub fn new(locators: BTreeMap<String, Rc<dyn Locator>>) -> Self {
        Self { locators }
    }

    /// Build in-memory sources from a plain nested mapping.
    pub fn from_mapping(mapping: StateMapping) -> Self {
        let locators = mapping
            .into_iter()
            .map(|(name, values)| {
                let locator: Rc<dyn Locator> = Rc::new(InMemoryLocator::new(values));
                (name, locator)
            })
            .collect();
        Self { locators }
    }

    pub fn register(&mut self, name: impl Into<String>, locator: Rc<dyn Locator>) {
        self.locators.insert(name.into(), locator);
    }

    pub fn has_locator(&self, name: &str) -> bool {
        self.locators.contains_key(name)
    }

    pub fn locator_for(&self, name: &str) -> Result<Rc<dyn Locator>> {
        self.locators
            .get(name)
            .map(Rc::clone)
            .ok_or_else(|| EngineError::UnknownLocator(name.to_string()))
    }

    pub fn locators(&self) -> impl Iterator<Item = (&String, &Rc<dyn Locator>)> {
        self.locators.iter()
    }

    /// Deep-copy every source; mutations on the copy never reach the
    /// original.
    pub fn snapshot(&self) -> Self {
        Self {
            locators: self
                .locators
                .iter()
                .map(|(name, locator)| (name.clone(), locator.snapshot()))
                .collect(),
        }
    }

    /// Deep-copy every source with all fragments reset to the default.
    pub fn empty_copy(&self) -> Self {
        Self {
            locators: self
                .locators
                .iter()
                .map(|(name, locator)| (name.clone(), locator.empty_copy()))
                .collect(),
        }
    }

    /// Export all durable sources as a plain nested mapping.
    pub fn export(&self) -> StateMapping {
        self.locators
            .iter()
            .filter_map(|(name, locator)| Some((name.clone(), locator.export()?)))
            .collect()
    }
}

impl fmt::Debug for StoredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredState")
            .field("locators", &self.locators.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! A single rule: one column of a decision table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::context::ComputationContext;
use crate::core::condition::Condition;
use crate::core::coordinate::Coordinate;
use crate::core::fragment::{FragmentKind, RuleFragment};
use crate::error::Result;
use crate::trace::TraceKind;

/// Outcome name carrying the command to run during a self-test.
pub const EXECUTE_OUTCOME: &str = "execute";

/// One assignment cell: write the resolved value into the target coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    target: Coordinate,
    value: Coordinate,
}

impl Assignment {
    pub fn new(target: &str, value: &str) -> Self {
        Self {
            target: Coordinate::from_text(target),
            value: Coordinate::from_text(value),
        }
    }

    /// Resolve the value side and write it into the target locator.
    pub fn perform_in(&self, context: &ComputationContext) -> Result<()> {
        let value = self.value.resolve(context)?;
        context.assign(&self.target, &value)?;
        context.log(
            TraceKind::Assignment,
            format!("{} <- {value}", self.target),
        );
        Ok(())
    }

    /// Request fragments the value side depends on.
    pub fn command_args(&self) -> Vec<String> {
        if self.value.is_request() {
            vec![self.value.fragment().to_string()]
        } else {
            Vec::new()
        }
    }
}

/// A self-test diagnostic: one condition that did not hold after the rule's
/// own mutation was replayed. Data for the caller to report on, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Human-readable description of the failed condition.
    pub condition: String,
    /// The subject's actually resolved value.
    pub actual: String,
}

/// A named rule: conditions, outcomes, and assignments sliced from one table
/// column. Immutable once built; evaluation never mutates the rule itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    conditions: Vec<Condition>,
    outcomes: Vec<(String, String)>,
    assignments: Vec<Assignment>,
}

impl Rule {
    /// Build a rule from its fragments, preserving declaration order within
    /// each group. Header fragments only contribute to naming and are handled
    /// by the source layer.
    pub fn new(name: impl Into<String>, fragments: Vec<RuleFragment>) -> Self {
        let mut conditions = Vec::new();
        let mut outcomes = Vec::new();
        let mut assignments = Vec::new();
        for fragment in fragments {
            match fragment.kind {
                FragmentKind::Hdr => {}
                FragmentKind::Cnd => conditions.push(Condition::parse(
                    Coordinate::from_text(&fragment.name),
                    &fragment.value,
                )),
                FragmentKind::Out => outcomes.push((fragment.name, fragment.value)),
                FragmentKind::Asg => {
                    assignments.push(Assignment::new(&fragment.name, &fragment.value));
                }
            }
        }
        Self {
            name: name.into(),
            conditions,
            outcomes,
            assignments,
        }
    }

    /// The synthesized fallback for a table without a declared else column.
    pub fn else_rule(table: &str) -> Self {
        Self::new(
            format!("{table}::else"),
            vec![RuleFragment::new(FragmentKind::Out, "outcome", "else")],
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff every condition holds. Conditions are checked in declaration
    /// order; the first resolution failure aborts the check.
    pub fn check(&self, context: &ComputationContext) -> Result<bool> {
        let mut result = true;
        for condition in &self.conditions {
            if !condition.evaluate(context)? {
                result = false;
                break;
            }
        }
        context.log(TraceKind::Rule, format!("{} => {result}", self.name));
        Ok(result)
    }

    /// The outcome mapping: literal values only, no operator grammar.
    pub fn outcome(&self) -> BTreeMap<String, String> {
        self.outcomes
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Run every assignment against the context. This is the only place the
    /// engine writes into backing state.
    pub fn perform(&self, context: &ComputationContext) -> Result<()> {
        for assignment in &self.assignments {
            assignment.perform_in(context)?;
        }
        Ok(())
    }

    /// True iff the rule mutates state, i.e. it describes a command rather
    /// than a pure decision.
    pub fn describes_command(&self) -> bool {
        !self.assignments.is_empty()
    }

    /// Request fragments referenced by the rule's assignment values.
    pub fn command_args(&self) -> Vec<String> {
        self.assignments
            .iter()
            .flat_map(Assignment::command_args)
            .collect()
    }

    /// A column without conditions acts as its table's else-rule.
    pub fn has_conditions(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Replay this rule's mutation on an isolated state copy and re-check its
    /// own conditions.
    ///
    /// Runs all assignments against a reset-to-default clone of the context's
    /// state, then the command named by the `execute` outcome (if any), then
    /// drops cached table outcomes and re-evaluates every declared condition.
    /// Returns one [`CheckFailure`] per condition that does not hold; an empty
    /// list means the rule behaves exactly as its conditions specify.
    pub fn test(&self, context: &ComputationContext) -> Result<Vec<CheckFailure>> {
        let copy = context.empty_state_copy();
        self.perform(&copy)?;
        if let Some((_, command)) = self
            .outcomes
            .iter()
            .find(|(name, _)| name == EXECUTE_OUTCOME)
        {
            copy.perform(command)?;
        }
        copy.reload_tables();
        let mut failures = Vec::new();
        for condition in &self.conditions {
            if !condition.evaluate(&copy)? {
                failures.push(CheckFailure {
                    condition: condition.to_string(),
                    actual: condition.actual_value(&copy)?,
                });
            }
        }
        Ok(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context_for, memory_state, tables_from};
    use serde_json::json;

    fn fragment(kind: FragmentKind, name: &str, value: &str) -> RuleFragment {
        RuleFragment::new(kind, name, value)
    }

    fn stored_rule() -> Rule {
        Rule::new(
            "sample::hello",
            vec![
                fragment(FragmentKind::Cnd, "data::is-stored", "true"),
                fragment(FragmentKind::Out, "outcome", "true"),
                fragment(FragmentKind::Out, "text", "hello world"),
            ],
        )
    }

    #[test]
    fn check_holds_when_all_conditions_hold() {
        let state = memory_state(&[("data", &[("is-stored", json!("true"))])]);
        let context = context_for(&state, tables_from(&[]));
        assert!(stored_rule().check(&context).expect("check"));
    }

    #[test]
    fn check_fails_when_any_condition_fails() {
        let state = memory_state(&[("data", &[("is-stored", json!(false))])]);
        let context = context_for(&state, tables_from(&[]));
        assert!(!stored_rule().check(&context).expect("check"));
    }

    #[test]
    fn outcome_maps_names_to_literals() {
        let outcome = stored_rule().outcome();
        assert_eq!(outcome.get("outcome"), Some(&"true".to_string()));
        assert_eq!(outcome.get("text"), Some(&"hello world".to_string()));
    }

    #[test]
    fn else_rule_has_the_single_else_outcome() {
        let rule = Rule::else_rule("sample");
        assert_eq!(rule.name(), "sample::else");
        assert!(!rule.has_conditions());
        assert_eq!(rule.outcome().get("outcome"), Some(&"else".to_string()));
    }

    #[test]
    fn describes_command_iff_assignments_present() {
        assert!(!stored_rule().describes_command());
        let command = Rule::new(
            "sample::store",
            vec![fragment(FragmentKind::Asg, "data::is-stored", "true")],
        );
        assert!(command.describes_command());
    }

    #[test]
    fn perform_writes_resolved_values_into_state() {
        let state = memory_state(&[("data", &[("is-stored", json!(false))])]);
        let context = context_for(&state, tables_from(&[]));
        let command = Rule::new(
            "sample::store",
            vec![fragment(FragmentKind::Asg, "data::is-stored", "true")],
        );
        command.perform(&context).expect("perform");
        let value = Coordinate::from_text("data::is-stored")
            .resolve(&context)
            .expect("resolve");
        assert_eq!(value, "true");
    }

    #[test]
    fn command_args_collects_request_fragments() {
        let command = Rule::new(
            "sample::store",
            vec![
                fragment(FragmentKind::Asg, "data::owner", "request::user"),
                fragment(FragmentKind::Asg, "data::is-stored", "true"),
            ],
        );
        assert_eq!(command.command_args(), vec!["user".to_string()]);
    }

    #[test]
    fn test_passes_when_assignments_establish_conditions() {
        let state = memory_state(&[("data", &[("is-stored", json!(false))])]);
        let context = context_for(&state, tables_from(&[]));
        let rule = Rule::new(
            "sample::store",
            vec![
                fragment(FragmentKind::Cnd, "data::is-stored", "true"),
                fragment(FragmentKind::Asg, "data::is-stored", "true"),
                fragment(FragmentKind::Out, "outcome", "stored"),
            ],
        );
        assert_eq!(rule.test(&context).expect("test"), Vec::new());
    }

    #[test]
    fn test_reports_each_condition_that_does_not_hold() {
        let state = memory_state(&[("data", &[("is-stored", json!(false))])]);
        let context = context_for(&state, tables_from(&[]));
        let rule = Rule::new(
            "sample::store",
            vec![
                fragment(FragmentKind::Cnd, "data::is-stored", "true"),
                fragment(FragmentKind::Asg, "data::is-stored", "false"),
                fragment(FragmentKind::Out, "outcome", "stored"),
            ],
        );
        let failures = rule.test(&context).expect("test");
        assert_eq!(
            failures,
            vec![CheckFailure {
                condition: "data::is-stored = true".to_string(),
                actual: "false".to_string(),
            }]
        );
    }

    #[test]
    fn test_runs_the_declared_execute_command() {
        let state = memory_state(&[(
            "data",
            &[("is-stored", json!("x")), ("mode", json!("y"))],
        )]);
        let tables = tables_from(&[(
            "reset-mode",
            &["CND;data::is-stored;~", "ASG;data::mode;cleared", "OUT;outcome;done"],
        )]);
        let context = context_for(&state, tables);
        let rule = Rule::new(
            "sample::prepare",
            vec![
                fragment(FragmentKind::Cnd, "data::is-stored", "true"),
                fragment(FragmentKind::Cnd, "data::mode", "cleared"),
                fragment(FragmentKind::Asg, "data::is-stored", "true"),
                fragment(FragmentKind::Out, "outcome", "ready"),
                fragment(FragmentKind::Out, "execute", "reset-mode"),
            ],
        );
        assert_eq!(rule.test(&context).expect("test"), Vec::new());
    }

    #[test]
    fn test_never_touches_the_live_state() {
        let state = memory_state(&[("data", &[("is-stored", json!("live"))])]);
        let context = context_for(&state, tables_from(&[]));
        let rule = Rule::new(
            "sample::store",
            vec![
                fragment(FragmentKind::Cnd, "data::is-stored", "true"),
                fragment(FragmentKind::Asg, "data::is-stored", "true"),
            ],
        );
        rule.test(&context).expect("test");
        let value = Coordinate::from_text("data::is-stored")
            .resolve(&context)
            .expect("resolve");
        assert_eq!(value, "live");
    }
}

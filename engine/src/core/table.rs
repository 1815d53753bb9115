//! Decision tables and the table collection used for nested lookups.

use std::collections::BTreeMap;

use crate::context::ComputationContext;
use crate::core::rule::Rule;
use crate::error::{EngineError, Result};
use crate::trace::TraceKind;

/// An ordered set of rules designed to be mutually exclusive, terminated by
/// an else-rule that matches when nothing else does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTable {
    name: String,
    rules: Vec<Rule>,
    else_rule: Rule,
}

impl DecisionTable {
    /// Build a table from its declared rules. Without an explicit else-rule
    /// the fallback is synthesized with the single outcome `outcome = else`.
    pub fn new(name: impl Into<String>, rules: Vec<Rule>, else_rule: Option<Rule>) -> Self {
        let name = name.into();
        let else_rule = else_rule.unwrap_or_else(|| Rule::else_rule(&name));
        Self {
            name,
            rules,
            else_rule,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared (non-else) rules, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Compute the outcome mapping for the current state.
    ///
    /// Checks every declared rule: exactly one match yields that rule's
    /// outcome, zero matches yield the else-rule's outcome, and more than one
    /// match is a hard error — the table is malformed, and no priority or
    /// declaration order resolves it.
    pub fn outcome(&self, context: &ComputationContext) -> Result<BTreeMap<String, String>> {
        let rule = self.satisfied_rule(context)?.unwrap_or(&self.else_rule);
        let outcome = rule.outcome();
        context.log(
            TraceKind::Table,
            format!("{} => {}", self.name, rule.name()),
        );
        Ok(outcome)
    }

    /// Execute the table as a command: run the matching rule's assignments.
    ///
    /// Matching semantics are identical to [`DecisionTable::outcome`]; with
    /// zero matches the else-rule is performed, which is a no-op unless the
    /// table declares assignments on its else column.
    pub fn perform(&self, context: &ComputationContext) -> Result<()> {
        let rule = self.satisfied_rule(context)?.unwrap_or(&self.else_rule);
        rule.perform(context)
    }

    /// Check all declared rules and enforce the at-most-one-match invariant.
    fn satisfied_rule(&self, context: &ComputationContext) -> Result<Option<&Rule>> {
        let mut satisfied = Vec::new();
        for rule in &self.rules {
            if rule.check(context)? {
                satisfied.push(rule);
            }
        }
        match satisfied.len() {
            0 => Ok(None),
            1 => Ok(Some(satisfied[0])),
            _ => Err(EngineError::MultipleRules(self.name.clone())),
        }
    }
}

/// All loaded tables, looked up by name for nested composition and commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecisionTables {
    tables: Vec<DecisionTable>,
}

impl DecisionTables {
    /// Collect tables, rejecting duplicate names at load time.
    pub fn new(tables: Vec<DecisionTable>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for table in &tables {
            if !seen.insert(table.name()) {
                return Err(EngineError::Configuration(format!(
                    "duplicate table name '{}'",
                    table.name()
                )));
            }
        }
        Ok(Self { tables })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|table| table.name() == name)
    }

    pub fn table_for(&self, name: &str) -> Result<&DecisionTable> {
        self.tables
            .iter()
            .find(|table| table.name() == name)
            .ok_or_else(|| EngineError::UnknownTable(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecisionTable> {
        self.tables.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(DecisionTable::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fragment::{FragmentKind, RuleFragment};
    use crate::test_support::{context_for, memory_state, tables_from};
    use serde_json::json;

    fn rule(name: &str, condition_value: &str, outcome: &str) -> Rule {
        Rule::new(
            name,
            vec![
                RuleFragment::new(FragmentKind::Cnd, "data::value", condition_value),
                RuleFragment::new(FragmentKind::Out, "outcome", outcome),
            ],
        )
    }

    fn context_with_value(value: serde_json::Value) -> ComputationContext {
        let state = memory_state(&[("data", &[("value", value)])]);
        context_for(&state, tables_from(&[]))
    }

    #[test]
    fn single_match_returns_that_rules_outcome() {
        let table = DecisionTable::new(
            "sample",
            vec![rule("sample::low", "<5", "low"), rule("sample::high", ">5", "high")],
            None,
        );
        let context = context_with_value(json!(7));
        let outcome = table.outcome(&context).expect("outcome");
        assert_eq!(outcome.get("outcome"), Some(&"high".to_string()));
    }

    #[test]
    fn zero_matches_falls_back_to_the_else_rule() {
        let table = DecisionTable::new(
            "sample",
            vec![rule("sample::low", "<5", "low")],
            None,
        );
        let context = context_with_value(json!(9));
        let outcome = table.outcome(&context).expect("outcome");
        assert_eq!(outcome.get("outcome"), Some(&"else".to_string()));
    }

    #[test]
    fn declared_else_rule_wins_over_the_synthesized_one() {
        let else_rule = Rule::new(
            "sample::fallback",
            vec![
                RuleFragment::new(FragmentKind::Out, "outcome", "else"),
                RuleFragment::new(FragmentKind::Out, "text", "no rule satisfied"),
            ],
        );
        let table = DecisionTable::new(
            "sample",
            vec![rule("sample::low", "<5", "low")],
            Some(else_rule),
        );
        let context = context_with_value(json!(9));
        let outcome = table.outcome(&context).expect("outcome");
        assert_eq!(outcome.get("outcome"), Some(&"else".to_string()));
        assert_eq!(outcome.get("text"), Some(&"no rule satisfied".to_string()));
    }

    #[test]
    fn several_matches_fail_with_the_table_name() {
        let table = DecisionTable::new(
            "multiple-rules",
            vec![rule("multiple-rules::a", ">0", "first"), rule("multiple-rules::b", "<2", "second")],
            None,
        );
        let context = context_with_value(json!(1));
        let err = table.outcome(&context).expect_err("must fail");
        let message = err.to_string();
        assert!(message.contains("Multiple rules are satisfied"), "got: {message}");
        assert!(message.contains("multiple-rules"), "got: {message}");
    }

    #[test]
    fn duplicate_table_names_are_rejected() {
        let first = DecisionTable::new("sample", Vec::new(), None);
        let second = DecisionTable::new("sample", Vec::new(), None);
        let err = DecisionTables::new(vec![first, second]).expect_err("must fail");
        assert!(err.to_string().contains("duplicate table name 'sample'"));
    }

    #[test]
    fn unknown_table_lookup_fails() {
        let tables = DecisionTables::default();
        let err = tables.table_for("missing").expect_err("must fail");
        assert!(err.to_string().contains("table 'missing' not found"));
    }
}

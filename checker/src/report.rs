//! Self-test execution and reporting.
//!
//! Every state-mutating rule carries its own executable specification: replay
//! its assignments on an isolated state copy and its conditions must hold.
//! This module runs that check across all loaded tables and aggregates the
//! failures for the caller to print or assert on.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use engine::core::rule::CheckFailure;
use serde::Serialize;

use crate::computation::Computation;

/// One rule's self-test result. An empty failure list means the rule behaves
/// exactly as its own conditions specify.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RuleReport {
    pub table: String,
    pub rule: String,
    /// Request fragments the rule's assignments depend on.
    pub args: Vec<String>,
    pub failures: Vec<CheckFailure>,
}

impl RuleReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregated self-test run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TestReport {
    pub started_at: String,
    pub finished_at: String,
    pub checked: usize,
    pub passed: usize,
    pub rules: Vec<RuleReport>,
}

impl TestReport {
    pub fn failed(&self) -> usize {
        self.checked - self.passed
    }
}

/// Run the self-test of every command-describing rule.
///
/// Each rule gets a fresh context; the isolation copy inside `test` keeps the
/// bound state untouched no matter what the rules assign.
pub fn run_self_tests(computation: &Computation) -> Result<TestReport> {
    let started_at = timestamp();
    let mut rules = Vec::new();
    for table in computation.decisions().tables().iter() {
        for rule in table.rules() {
            if !rule.describes_command() {
                continue;
            }
            let context = computation.decisions().evaluation_context();
            let failures = rule
                .test(&context)
                .with_context(|| format!("self-test {}", rule.name()))?;
            rules.push(RuleReport {
                table: table.name().to_string(),
                rule: rule.name().to_string(),
                args: rule.command_args(),
                failures,
            });
        }
    }
    let passed = rules.iter().filter(|rule| rule.passed()).count();
    Ok(TestReport {
        started_at,
        finished_at: timestamp(),
        checked: rules.len(),
        passed,
        rules,
    })
}

/// Render the report as stable, line-oriented text.
pub fn render(report: &TestReport) -> String {
    let mut out = String::new();
    for rule in &report.rules {
        let result = if rule.passed() { "pass" } else { "fail" };
        out.push_str(&format!("test: rule={} result={result}\n", rule.rule));
        for failure in &rule.failures {
            out.push_str(&format!(
                "test:   expected {} but was '{}'\n",
                failure.condition, failure.actual
            ));
        }
    }
    out.push_str(&format!(
        "test: checked={} passed={} failed={}\n",
        report.checked,
        report.passed,
        report.failed()
    ));
    out
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

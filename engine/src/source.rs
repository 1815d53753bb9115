//! Parsing of tagged, delimited table text into the decision model.
//!
//! Tables are stored transposed: each source row is one subject (a condition,
//! outcome, or assignment), and each column across the rows is one rule. A
//! row is `<TAG><delim><name><delim><v1><delim><v2>...` with
//! `TAG ∈ {HDR, CND, OUT, ASG}`; lines with any other first field are
//! skipped, which tolerates blank lines and comments.
//!
//! Row groups may differ in width: a column that exists only in the `OUT`
//! group has no conditions and therefore acts as the table's own else-rule.
//! Within one group, all rows must have the same width — an uneven group is
//! a configuration error at load time, never silently truncated.

use crate::core::fragment::{FragmentKind, RuleFragment};
use crate::core::rule::Rule;
use crate::core::table::DecisionTable;
use crate::error::{EngineError, Result};

const GROUP_ORDER: [FragmentKind; 4] = [
    FragmentKind::Hdr,
    FragmentKind::Cnd,
    FragmentKind::Out,
    FragmentKind::Asg,
];

/// One table's source rows, grouped by tag into rectangular grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLines {
    name: String,
    groups: Vec<(FragmentKind, Vec<Vec<String>>)>,
}

impl SourceLines {
    /// Group raw lines by tag, splitting records on the delimiter.
    ///
    /// `name` identifies the source (typically the file stem) and doubles as
    /// the table name when no `HDR` row is present.
    pub fn from_lines<S: AsRef<str>>(name: &str, lines: &[S], delimiter: &str) -> Result<Self> {
        let mut groups = Vec::new();
        for kind in GROUP_ORDER {
            let prefix = format!("{}{delimiter}", kind.tag());
            let mut rows: Vec<Vec<String>> = Vec::new();
            for line in lines {
                let Some(record) = line.as_ref().strip_prefix(&prefix) else {
                    continue;
                };
                let row: Vec<String> = record.split(delimiter).map(str::to_string).collect();
                if let Some(first) = rows.first()
                    && first.len() != row.len()
                {
                    return Err(EngineError::Configuration(format!(
                        "uneven row widths in table '{name}': {} row {} has {} fields, expected {}",
                        kind.tag(),
                        rows.len() + 1,
                        row.len(),
                        first.len()
                    )));
                }
                rows.push(row);
            }
            groups.push((kind, rows));
        }
        Ok(Self {
            name: name.to_string(),
            groups,
        })
    }

    /// The source name this table was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rule columns: the widest group minus the subject column.
    fn rule_columns(&self) -> usize {
        self.groups
            .iter()
            .filter_map(|(_, rows)| rows.first())
            .map(|row| row.len().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    /// Slice one rule column out of every group, preserving group order.
    /// Rows narrower than the column contribute nothing.
    fn fragments_for(&self, column: usize) -> Vec<RuleFragment> {
        let mut fragments = Vec::new();
        for (kind, rows) in &self.groups {
            for row in rows {
                if let Some(value) = row.get(column) {
                    fragments.push(RuleFragment::new(*kind, row[0].clone(), value.clone()));
                }
            }
        }
        fragments
    }

    /// The table name: the `HDR` subject when present, the source name
    /// otherwise.
    fn table_name(&self) -> &str {
        self.header_row()
            .and_then(|row| row.first())
            .map_or(&self.name, String::as_str)
    }

    fn header_row(&self) -> Option<&Vec<String>> {
        self.groups
            .iter()
            .find(|(kind, _)| *kind == FragmentKind::Hdr)
            .and_then(|(_, rows)| rows.first())
    }

    /// Assemble the decision table: one rule per column, with a condition-less
    /// column acting as the declared else-rule.
    pub fn as_decision_table(&self) -> Result<DecisionTable> {
        let columns = self.rule_columns();
        if columns == 0 {
            return Err(EngineError::Configuration(format!(
                "table '{}' defines no rules",
                self.name
            )));
        }
        let mut declared = Vec::new();
        let mut else_rule: Option<Rule> = None;
        for column in 1..=columns {
            let rule = Rule::new(self.rule_name(column), self.fragments_for(column));
            if rule.has_conditions() {
                declared.push(rule);
            } else if else_rule.is_some() {
                return Err(EngineError::Configuration(format!(
                    "table '{}' declares more than one condition-less column",
                    self.table_name()
                )));
            } else {
                else_rule = Some(rule);
            }
        }
        Ok(DecisionTable::new(self.table_name(), declared, else_rule))
    }

    /// `table::label` from the header, or a synthesized deterministic label.
    fn rule_name(&self, column: usize) -> String {
        match self.header_row().and_then(|row| row.get(column)) {
            Some(label) => format!("{}::{label}", self.table_name()),
            None => format!("{}::rule_{:02}", self.table_name(), column - 1),
        }
    }
}

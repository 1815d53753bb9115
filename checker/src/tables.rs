//! Reading decision-table sources from a directory.
//!
//! The engine consumes pre-read lines; everything file-shaped lives here.
//! One file is one table, named by its file stem unless a header row says
//! otherwise.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use engine::core::table::{DecisionTable, DecisionTables};
use engine::source::SourceLines;
use tracing::debug;

/// Load every `*.{extension}` file in the directory as a decision table.
///
/// Files are processed in name order so load-time errors and duplicate
/// detection are deterministic regardless of directory iteration order.
pub fn load_tables(dir: &Path, extension: &str, delimiter: &str) -> Result<DecisionTables> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(extension) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut tables: Vec<DecisionTable> = Vec::new();
    for path in paths {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let contents =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let lines: Vec<&str> = contents.lines().collect();
        let table = SourceLines::from_lines(stem, &lines, delimiter)
            .and_then(|source| source.as_decision_table())
            .with_context(|| format!("load table {}", path.display()))?;
        debug!(table = table.name(), path = %path.display(), "table loaded");
        tables.push(table);
    }
    Ok(DecisionTables::new(tables)?)
}

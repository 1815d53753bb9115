//! Stored-state persistence as a plain nested JSON mapping.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use engine::state::StateMapping;
use tracing::debug;

/// Load the nested state mapping from disk.
///
/// A missing file is an empty state: the checker may be pointed at a fresh
/// working directory before any transition has run.
pub fn load_state(path: &Path) -> Result<StateMapping> {
    if !path.exists() {
        return Ok(StateMapping::new());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("read state {}", path.display()))?;
    let state: StateMapping = serde_json::from_str(&contents)
        .with_context(|| format!("parse state {}", path.display()))?;
    debug!(path = %path.display(), sources = state.len(), "state loaded");
    Ok(state)
}

/// Atomically write the state mapping to disk (temp file + rename).
pub fn write_state(path: &Path, state: &StateMapping) -> Result<()> {
    debug!(path = %path.display(), sources = state.len(), "writing state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &buf)
        .with_context(|| format!("write temp state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace state {}", path.display()))?;
    Ok(())
}

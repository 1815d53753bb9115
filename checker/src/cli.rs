//! CLI command implementations.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use engine::facade::DecisionFacade;
use engine::state::StoredState;
use tracing::info;

use crate::commands::TableCommands;
use crate::computation::{Computation, Transition};
use crate::config::{CheckerConfig, load_config};
use crate::report;
use crate::state_store::{load_state, write_state};
use crate::tables::load_tables;

/// List the loaded decision tables.
pub fn list_tables(config_path: &Path) -> Result<()> {
    let (_, computation) = computation_from(config_path)?;
    for name in computation.decisions().tables().names() {
        println!("{name}");
    }
    Ok(())
}

/// Compute and print one table's outcome.
pub fn decide(config_path: &Path, table: &str) -> Result<()> {
    let (_, computation) = computation_from(config_path)?;
    let outcome = computation
        .decide_for(table)
        .with_context(|| format!("decide '{table}'"))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Run every command rule's self-test and fail if any rule misbehaves.
pub fn run_self_tests(config_path: &Path) -> Result<()> {
    let (_, computation) = computation_from(config_path)?;
    let report = report::run_self_tests(&computation)?;
    print!("{}", report::render(&report));
    if report.failed() > 0 {
        bail!("{} of {} rule self-tests failed", report.failed(), report.checked);
    }
    Ok(())
}

/// Execute a transition and persist the mutated state.
pub fn perform(config_path: &Path, name: &str, args: &[String]) -> Result<()> {
    let (config, computation) = computation_from(config_path)?;
    let transition = Transition {
        name: name.to_string(),
        request: parse_args(args)?,
    };
    computation.perform(&transition)?;
    write_state(&config.state_path, &computation.stored_state())?;
    info!(command = name, "transition performed");
    println!("performed: {name}");
    Ok(())
}

/// Print the whole stored state, or selected fragments of one source.
pub fn show_state(config_path: &Path, source: Option<&str>, fragments: &[String]) -> Result<()> {
    let (_, computation) = computation_from(config_path)?;
    match source {
        None => println!(
            "{}",
            serde_json::to_string_pretty(&computation.stored_state())?
        ),
        Some(source) => {
            let actual = computation
                .state_for(source, fragments)
                .with_context(|| format!("resolve state of '{source}'"))?;
            println!("{}", serde_json::to_string_pretty(&actual)?);
        }
    }
    Ok(())
}

fn computation_from(config_path: &Path) -> Result<(CheckerConfig, Computation)> {
    let config = load_config(config_path)?;
    let tables = load_tables(&config.tables_dir, &config.extension, &config.delimiter)?;
    let state = StoredState::from_mapping(load_state(&config.state_path)?);
    let decisions = DecisionFacade::new(tables, state);
    let commands = Rc::new(TableCommands::new(decisions.shared_tables()));
    Ok((config, Computation::new(decisions, commands)))
}

fn parse_args(args: &[String]) -> Result<BTreeMap<String, String>> {
    let mut request = BTreeMap::new();
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("request argument '{arg}' is not KEY=VALUE");
        };
        request.insert(key.to_string(), value.to_string());
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_arguments() {
        let args = vec!["user=Eugene".to_string(), "shop=2".to_string()];
        let request = parse_args(&args).expect("parse");
        assert_eq!(request.get("user"), Some(&"Eugene".to_string()));
        assert_eq!(request.get("shop"), Some(&"2".to_string()));
    }

    #[test]
    fn rejects_malformed_arguments() {
        let err = parse_args(&["no-separator".to_string()]).expect_err("must fail");
        assert!(err.to_string().contains("KEY=VALUE"));
    }

    #[test]
    fn builds_a_computation_from_a_config_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tables_dir = temp.path().join("tables");
        std::fs::create_dir_all(&tables_dir).expect("mkdir");
        std::fs::write(
            tables_dir.join("greeting.csv"),
            "CND;data::is-stored;true\nOUT;outcome;Hello\n",
        )
        .expect("write table");
        std::fs::write(
            temp.path().join("state.json"),
            "{\"data\": {\"is-stored\": \"true\"}}\n",
        )
        .expect("write state");
        std::fs::write(
            temp.path().join("checker.toml"),
            format!(
                "tables_dir = {:?}\nstate_path = {:?}\n",
                tables_dir,
                temp.path().join("state.json")
            ),
        )
        .expect("write config");

        let (config, computation) =
            computation_from(&temp.path().join("checker.toml")).expect("build");
        assert_eq!(config.extension, "csv");
        let outcome = computation.decide_for("greeting").expect("decide");
        assert_eq!(outcome["outcome"], "Hello");
    }
}

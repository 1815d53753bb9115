mod cli;
mod commands;
mod computation;
mod config;
mod logging;
mod report;
mod state_store;
mod tables;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "checker", version, about = "Logic checker for decision tables")]
struct Cli {
    /// Path to the checker configuration file.
    #[arg(long, default_value = "checker.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the loaded decision tables.
    List,
    /// Compute a table's outcome against the stored state.
    Decide { table: String },
    /// Run the self-test of every state-mutating rule.
    Test,
    /// Execute a named transition and persist the resulting state.
    Perform {
        name: String,
        /// Request arguments as key=value pairs.
        #[arg(long = "arg", value_name = "KEY=VALUE")]
        args: Vec<String>,
    },
    /// Print the stored state, or selected fragments of one source.
    State {
        /// Limit output to this state source.
        #[arg(long)]
        source: Option<String>,
        /// Fragment names to resolve (comma-separated).
        #[arg(long, value_delimiter = ',')]
        fragments: Vec<String>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::List => cli::list_tables(&cli.config),
        Command::Decide { table } => cli::decide(&cli.config, &table),
        Command::Test => cli::run_self_tests(&cli.config),
        Command::Perform { name, args } => cli::perform(&cli.config, &name, &args),
        Command::State { source, fragments } => {
            cli::show_state(&cli.config, source.as_deref(), &fragments)
        }
    }
}

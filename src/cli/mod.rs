//! Command-line interface definitions.

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ranq", version, about = "Q-learning supplier ranking engine")]
pub struct Cli {
    /// Explicit config file (overrides discovery).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Data root directory (default: $RANQ_ROOT, nearest .ranq/, or the
    /// platform data dir).
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Supplier catalog JSON file (default: <root>/suppliers.json).
    #[arg(long, global = true, value_name = "PATH")]
    pub suppliers: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    pub robot: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate and persist today's supplier rankings.
    Rank,

    /// Warm up the Q-table without ranking side effects.
    Train {
        /// Number of training iterations.
        #[arg(long, default_value_t = 100)]
        iterations: u32,

        /// Restrict training to these supplier ids (default: all active).
        #[arg(id = "train_suppliers", long = "supplier", value_name = "ID")]
        suppliers: Vec<i64>,
    },

    /// Show the greedy policy for observed states.
    Policy {
        /// Show only this supplier's current state.
        #[arg(long)]
        supplier: Option<i64>,
    },

    /// Greedy best action for a state key (e.g. Q5_D4_P3_S2).
    BestAction {
        /// Canonical state key.
        state: String,
    },

    /// Q-table inspection and maintenance.
    Qtable {
        #[command(subcommand)]
        command: QtableCommands,
    },

    /// List observed states in the registry.
    States,
}

#[derive(Debug, Subcommand)]
pub enum QtableCommands {
    /// Export Q-table entries as JSON.
    Export {
        /// Restrict to one state key.
        #[arg(long)]
        state: Option<String>,
    },

    /// Zero all Q-values and update counts (rows are preserved).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_train_with_suppliers() {
        let cli = Cli::parse_from([
            "ranq", "train", "--iterations", "50", "--supplier", "1", "--supplier", "2",
        ]);
        match cli.command {
            Commands::Train {
                iterations,
                suppliers,
            } => {
                assert_eq!(iterations, 50);
                assert_eq!(suppliers, vec![1, 2]);
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn parses_qtable_export_filter() {
        let cli = Cli::parse_from(["ranq", "qtable", "export", "--state", "Q1_D1_P1_S1"]);
        match cli.command {
            Commands::Qtable {
                command: QtableCommands::Export { state },
            } => assert_eq!(state.as_deref(), Some("Q1_D1_P1_S1")),
            _ => panic!("expected qtable export"),
        }
    }
}

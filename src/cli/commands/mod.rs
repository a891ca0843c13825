//! Subcommand implementations.

mod policy;
mod qtable;
mod rank;
mod states;
mod train;

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Rank => rank::run(ctx),
        Commands::Train {
            iterations,
            suppliers,
        } => train::run(ctx, *iterations, suppliers),
        Commands::Policy { supplier } => policy::run(ctx, *supplier),
        Commands::BestAction { state } => policy::run_best_action(ctx, state),
        Commands::Qtable { command } => qtable::run(ctx, command),
        Commands::States => states::run(ctx),
    }
}

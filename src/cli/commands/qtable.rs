//! `ranq qtable` - Q-table export and reset.

use crate::app::AppContext;
use crate::cli::QtableCommands;
use crate::error::{RanqError, Result};
use crate::state::StateKey;

pub fn run(ctx: &AppContext, command: &QtableCommands) -> Result<()> {
    match command {
        QtableCommands::Export { state } => export(ctx, state.as_deref()),
        QtableCommands::Reset { yes } => reset(ctx, *yes),
    }
}

fn export(ctx: &AppContext, state_raw: Option<&str>) -> Result<()> {
    let filter = state_raw.map(StateKey::parse).transpose()?;
    let engine = ctx.engine()?;
    let rows = engine.export_q_table(filter);

    if ctx.robot_mode {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("Q-table is empty.");
        return Ok(());
    }
    println!(
        "{:<14} {:<30} {:>10} {:>8}",
        "State", "Action", "Q-value", "Updates"
    );
    for row in &rows {
        println!(
            "{:<14} {:<30} {:>10.4} {:>8}",
            row.state.to_string(),
            row.action.name(),
            row.q_value,
            row.update_count
        );
    }
    Ok(())
}

fn reset(ctx: &AppContext, yes: bool) -> Result<()> {
    if !yes {
        return Err(RanqError::Config(
            "refusing to reset the q-table without --yes".to_string(),
        ));
    }
    let engine = ctx.engine()?;
    engine.reset_q_table();
    ctx.flush(&engine)?;

    if ctx.robot_mode {
        println!("{}", serde_json::json!({ "reset": true }));
    } else {
        println!("Q-table reset: all values and update counts zeroed.");
    }
    Ok(())
}

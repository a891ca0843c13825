//! `ranq policy` and `ranq best-action` - inspect the learned policy.

use serde_json::json;

use crate::app::AppContext;
use crate::error::Result;
use crate::state::StateKey;

pub fn run(ctx: &AppContext, supplier: Option<i64>) -> Result<()> {
    let engine = ctx.engine()?;
    let policy = engine.policy(supplier)?;

    if ctx.robot_mode {
        let entries: Vec<_> = policy
            .iter()
            .map(|(state, action)| json!({ "state": state, "action": action }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if policy.is_empty() {
        println!("No states observed yet; run `ranq rank` or `ranq train` first.");
        return Ok(());
    }
    for (state, action) in &policy {
        println!("{state:<14} -> {action}");
    }
    Ok(())
}

pub fn run_best_action(ctx: &AppContext, state_raw: &str) -> Result<()> {
    let state = StateKey::parse(state_raw)?;
    let engine = ctx.engine()?;
    let action = engine.best_action(state);

    if ctx.robot_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "state": state,
                "action": action,
                "description": action.description(),
            }))?
        );
        return Ok(());
    }

    println!("{state} -> {action}");
    println!("  {}", action.description());
    Ok(())
}

//! `ranq states` - list observed states.

use crate::app::AppContext;
use crate::error::Result;
use crate::state::STATE_SPACE_SIZE;

pub fn run(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let states = engine.registry().snapshot();

    if ctx.robot_mode {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("No states observed yet (of {STATE_SPACE_SIZE} possible).");
        return Ok(());
    }
    for state in &states {
        println!("{:<14} {}", state.key.to_string(), state.description);
    }
    println!(
        "\n{} of {} possible states observed.",
        states.len(),
        STATE_SPACE_SIZE
    );
    Ok(())
}

//! `ranq rank` - generate and persist today's rankings.

use serde_json::json;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let rankings = engine.generate_rankings()?;
    ctx.flush(&engine)?;

    if ctx.robot_mode {
        println!("{}", serde_json::to_string_pretty(&json!({
            "ranked": rankings.len(),
            "rankings": rankings,
        }))?);
        return Ok(());
    }

    if rankings.is_empty() {
        println!("No suppliers ranked.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:>7}  {:<12} {}",
        "Rank", "Supplier", "Score", "State", "Notes"
    );
    for r in &rankings {
        println!(
            "{:>4}  {:<24} {:>7.2}  {:<12} {}",
            r.rank, r.supplier_name, r.overall_score, r.state_key.to_string(), r.notes
        );
    }
    println!("\nRanked {} supplier(s).", rankings.len());
    Ok(())
}

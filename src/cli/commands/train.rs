//! `ranq train` - Q-table warm-up.

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, iterations: u32, suppliers: &[i64]) -> Result<()> {
    let engine = ctx.engine()?;
    let supplier_ids = if suppliers.is_empty() {
        None
    } else {
        Some(suppliers.to_vec())
    };
    let stats = engine.train_batch(iterations, supplier_ids)?;
    ctx.flush(&engine)?;

    if ctx.robot_mode {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Training complete.");
    println!("  iterations:      {}", stats.iterations);
    println!("  suppliers:       {}", stats.suppliers_trained);
    println!("  q-value updates: {}", stats.total_updates);
    if stats.total_updates > 0 {
        println!("  avg reward:      {:.3}", stats.avg_reward);
        println!("  reward range:    [{:.3}, {:.3}]", stats.min_reward, stats.max_reward);
    }
    Ok(())
}

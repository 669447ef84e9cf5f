//! Settled snapshot of the field.

use std::path::Path;

use clap::Args;
use serde_json::json;
use tracing::error;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Ticks to run before reading the state
    #[arg(long, default_value = "8")]
    pub settle_ticks: u32,
}

/// Execute the status command. Returns the process exit code.
pub async fn handle_status(args: StatusArgs, config_path: Option<&Path>) -> i32 {
    let mut engine = match super::build_engine(config_path) {
        Some(engine) => engine,
        None => return 1,
    };

    // Let the noise model produce a representative state.
    for _ in 0..args.settle_ticks.max(1) {
        engine.tick(None);
    }

    let state = engine.field_state();
    let balance = engine.balance_report();
    let payload = json!({
        "state": state,
        "balance": balance,
        "tick_count": engine.tick_count(),
        "transitioning": engine.is_transitioning(),
    });
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            error!("failed to encode status: {}", e);
            1
        }
    }
}

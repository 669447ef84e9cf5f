//! Noise sweep command.

use std::path::Path;

use clap::Args;
use tracing::{error, info};

use coherence_field_core::NoiseConfig;

/// Arguments for the sweep command.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Comma-separated jitter levels to sweep instead of the built-in grid;
    /// each candidate keeps the configured ratio split
    #[arg(long, value_delimiter = ',')]
    pub base_levels: Option<Vec<f32>>,
}

/// Execute the sweep command. Returns the process exit code.
pub async fn handle_sweep(args: SweepArgs, config_path: Option<&Path>) -> i32 {
    let mut engine = match super::build_engine(config_path) {
        Some(engine) => engine,
        None => return 1,
    };
    super::cancel_on_ctrl_c(&engine);

    let candidates = args.base_levels.map(|levels| {
        let base = engine.config().noise;
        levels
            .into_iter()
            .map(|base_level| NoiseConfig { base_level, ..base })
            .collect::<Vec<_>>()
    });

    match engine.request_noise_optimization(candidates).await {
        Ok(outcome) => {
            info!(
                "winner base_level={} return_time={:?}",
                outcome.best.base_level, outcome.return_time
            );
            match serde_json::to_string_pretty(&outcome) {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    error!("failed to encode outcome: {}", e);
                    1
                }
            }
        }
        Err(e) => {
            error!("sweep failed: {}", e);
            1
        }
    }
}

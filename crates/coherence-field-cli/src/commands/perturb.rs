//! One-shot perturbation measurement.

use std::path::Path;

use clap::Args;
use tracing::{error, info, warn};

use coherence_field_core::STABILITY_ATTRACTOR;

/// Arguments for the perturb command.
#[derive(Args, Debug)]
pub struct PerturbArgs {
    /// Coherence value to displace the field to
    #[arg(long)]
    pub target: f32,

    /// Ticks to settle the field before displacing it
    #[arg(long, default_value = "5")]
    pub settle_ticks: u32,
}

/// Execute the perturb command. Returns the process exit code.
pub async fn handle_perturb(args: PerturbArgs, config_path: Option<&Path>) -> i32 {
    let mut engine = match super::build_engine(config_path) {
        Some(engine) => engine,
        None => return 1,
    };
    super::cancel_on_ctrl_c(&engine);

    // Start the measurement from a known steady state.
    for _ in 0..args.settle_ticks {
        engine.tick(Some(STABILITY_ATTRACTOR));
    }

    match engine.request_perturbation(args.target).await {
        Ok(run) => {
            match run.return_time_cycles {
                Some(cycles) => info!("field returned in {} cycles", cycles),
                None => warn!("field did not return within budget"),
            }
            match serde_json::to_string_pretty(&run) {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    error!("failed to encode run: {}", e);
                    1
                }
            }
        }
        Err(e) => {
            error!("perturbation failed: {}", e);
            1
        }
    }
}

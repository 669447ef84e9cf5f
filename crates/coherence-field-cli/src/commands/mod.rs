//! CLI command handlers.
//!
//! Each handler builds its own engine, does its work, and returns a process
//! exit code: 0 on success, 1 on any error. Handlers print results as JSON
//! on stdout and log everything else on stderr.

pub mod perturb;
pub mod run;
pub mod status;
pub mod sweep;

use std::path::Path;

use tracing::error;

use coherence_field_core::{EngineConfig, FieldEngine};

/// Load configuration from an explicit file or the layered default chain,
/// then build the engine. Logs and returns `None` on any failure.
pub(crate) fn build_engine(config_path: Option<&Path>) -> Option<FieldEngine> {
    let config = match config_path {
        Some(path) => EngineConfig::from_file(path),
        None => EngineConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("failed to load configuration: {}", e);
            return None;
        }
    };
    match FieldEngine::new(config) {
        Ok(engine) => Some(engine),
        Err(e) => {
            error!("failed to build engine: {}", e);
            None
        }
    }
}

/// Wire ctrl-c to the engine's cooperative cancel flag so long-running
/// harness operations abandon cleanly.
pub(crate) fn cancel_on_ctrl_c(engine: &FieldEngine) {
    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling");
            cancel.cancel();
        }
    });
}

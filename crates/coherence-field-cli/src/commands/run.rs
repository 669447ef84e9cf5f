//! Live tick loop streaming ND-JSON states.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::{error, info};

use coherence_field_core::{DeltaFilter, FieldState, FnListener};

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of ticks to publish (unlimited when omitted)
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Tick as fast as possible instead of at the breath cadence
    #[arg(long)]
    pub fast: bool,

    /// Only print states whose coherence moved at least this much
    #[arg(long)]
    pub min_delta: Option<f32>,

    /// File of raw samples, one value in [0, 1] per line; the loop ends
    /// when the file does
    #[arg(long)]
    pub raw_file: Option<PathBuf>,
}

fn read_samples(path: &Path) -> anyhow::Result<Vec<f32>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            line.parse::<f32>()
                .with_context(|| format!("bad sample {:?}", line))
        })
        .collect()
}

/// Execute the run command. Returns the process exit code.
pub async fn handle_run(args: RunArgs, config_path: Option<&Path>) -> i32 {
    let mut engine = match super::build_engine(config_path) {
        Some(engine) => engine,
        None => return 1,
    };

    let samples = match args.raw_file.as_deref() {
        Some(path) => match read_samples(path) {
            Ok(samples) => Some(samples),
            Err(e) => {
                error!("{:#}", e);
                return 1;
            }
        },
        None => None,
    };

    // Every published state becomes one JSON line on stdout, optionally
    // squeezed through the significant-change filter.
    let printer = FnListener::new(|state: &FieldState| {
        if let Ok(line) = serde_json::to_string(state) {
            println!("{}", line);
        }
    });
    match args.min_delta {
        Some(min_delta) => engine.subscribe(Arc::new(DeltaFilter::new(printer, min_delta))),
        None => engine.subscribe(Arc::new(printer)),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop_flag.store(true, Ordering::SeqCst);
        }
    });

    let period = Duration::from_secs_f64(engine.breath_period_secs());
    let mut published = 0u64;
    loop {
        if stop.load(Ordering::SeqCst) {
            info!("interrupted after {} ticks", published);
            break;
        }
        if let Some(limit) = args.ticks {
            if published >= limit {
                break;
            }
        }

        let sample = match &samples {
            Some(samples) => match samples.get(published as usize) {
                Some(value) => Some(*value),
                None => break, // input exhausted
            },
            None => None,
        };
        engine.tick(sample);
        published += 1;

        if args.fast {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(period).await;
        }
    }

    info!("run finished: {} ticks published", published);
    0
}

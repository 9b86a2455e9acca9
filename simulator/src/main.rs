use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use log::{info, warn};
use mazecore::queue::TeamQueue;
use mazecore::telemetry::RunMetrics;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use store::JsonTeamStore;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::competition::{AutoOperator, Competition, ConsoleOperator, Operator, RunObserver};
use workflow::config::{AdvanceMode, CompetitionConfig, FeedConfig};
use workflow::runner::{RunControl, Runner};

mod generator;
mod gui_bridge;
mod store;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Maze competition referee: scores robot runs team by team")]
struct Args {
    /// Load the competition config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Team store JSON file (overrides the config)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Wait for the operator before each team
    #[arg(long, default_value_t = false)]
    manual: bool,
    /// Skip the unscored warm-up run
    #[arg(long, default_value_t = false)]
    no_warm_up: bool,
    /// Serve the overlay bridge and keep polling the store for new uploads
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Score the next team only
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Seed for the synthetic feed
    #[arg(long)]
    seed: Option<u64>,
    /// Replay a recorded trace instead of the synthetic feed
    #[arg(long)]
    trace: Option<PathBuf>,
    /// Pace the synthetic feed at its frame rate
    #[arg(long, default_value_t = false)]
    realtime: bool,
}

impl Args {
    fn apply(&self, config: &mut CompetitionConfig) {
        if let Some(store) = &self.store {
            config.store_path = store.clone();
        }
        if self.manual {
            config.advance = AdvanceMode::Manual;
        }
        if self.serve {
            config.poll_for_uploads = true;
        }
        if self.no_warm_up {
            config.warm_up_run = false;
        }
        if let Some(path) = &self.trace {
            config.feed = FeedConfig::Trace { path: path.clone() };
        }
        match &mut config.feed {
            FeedConfig::Synthetic(feed) => {
                if let Some(seed) = self.seed {
                    feed.seed = seed;
                }
                if self.realtime {
                    feed.realtime = true;
                }
            }
            FeedConfig::Trace { .. } => {
                if self.seed.is_some() || self.realtime {
                    warn!("--seed and --realtime only apply to the synthetic feed");
                }
            }
        }
    }
}

fn spawn_shutdown_listener(control: Arc<RunControl>) {
    thread::spawn(move || {
        let runtime = match TokioBuilder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("Ctrl+C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async {
            if signal::ctrl_c().await.is_ok() {
                println!("[GUI] Ctrl+C received, stopping after the current frame.");
                control.request_shutdown();
            }
        });
    });
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CompetitionConfig::load(path)?,
        None => CompetitionConfig::default(),
    };
    args.apply(&mut config);

    let metrics = Arc::new(RunMetrics::new());
    let control = Arc::new(RunControl::default());
    let runner = Runner::new(config.roi, metrics.clone(), control.clone());
    let store = JsonTeamStore::new(config.store_path.clone());
    info!("team store: {}", store.path().display());

    let gui_bridge = GuiBridge::new(metrics.clone(), control.clone());
    if args.serve {
        gui_bridge.serve(gui_bind_address());
    }
    spawn_shutdown_listener(control.clone());

    let mut operator: Box<dyn Operator> = match config.advance {
        AdvanceMode::Automatic => Box::new(AutoOperator),
        AdvanceMode::Manual => Box::new(ConsoleOperator),
    };
    let mut queue = TeamQueue::new();
    let mut competition = Competition::new(config, runner, &store, &gui_bridge, control.clone());
    let summary = competition
        .run(&mut queue, operator.as_mut(), args.once)
        .context("competition run failed")?;

    println!(
        "Competition finished -> runs {}, scored {}, unsaved scores {}",
        summary.runs,
        summary.scored.len(),
        summary.persistence_failures
    );
    for score in &summary.scored {
        println!(
            "  {}: exploration {} + time {} = {}",
            score.team_name, score.exploration_score, score.time_score, score.final_score
        );
    }
    if !summary.interrupted.is_empty() {
        println!("  interrupted: {}", summary.interrupted.join(", "));
    }
    let snapshot = metrics.snapshot();
    info!(
        "frames {}, detections mapped {}, dropped {}, errors {}",
        snapshot.frames_processed,
        snapshot.detections_mapped,
        snapshot.detections_dropped,
        snapshot.errors
    );

    if args.serve && !control.is_shutdown() {
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

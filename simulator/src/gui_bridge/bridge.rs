use crate::gui_bridge::model::BridgeModel;
use crate::workflow::competition::{RunObserver, RunOutcome};
use crate::workflow::runner::RunControl;
use log::{error, info};
use mazecore::session::{OverlayModel, RunSession};
use mazecore::telemetry::RunMetrics;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

type SharedModel = Arc<RwLock<BridgeModel>>;

/// Bridge that hosts the overlay HTTP endpoint and accepts operator requests.
pub struct GuiBridge {
    state: SharedModel,
    metrics: Arc<RunMetrics>,
    control: Arc<RunControl>,
}

impl GuiBridge {
    pub fn new(metrics: Arc<RunMetrics>, control: Arc<RunControl>) -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeModel::default())),
            metrics,
            control,
        }
    }

    /// Starts the HTTP server on its own thread and runtime.
    pub fn serve(&self, address: SocketAddr) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let metrics = self.metrics.clone();
        let stop_control = self.control.clone();
        let skip_control = self.control.clone();

        let overlay_route = warp::path("overlay")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&guard.overlay)
            });

        let scores_route = warp::path("scores")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: SharedModel| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&guard.scores)
            });

        let status_route = warp::path("status")
            .and(warp::get())
            .and(state_filter)
            .map(|state: SharedModel| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&json!({ "status": guard.status }))
            });

        let metrics_route = warp::path("metrics")
            .and(warp::get())
            .map(move || warp::reply::json(&metrics.snapshot()));

        let stop_route = warp::path("stop").and(warp::post()).map(move || {
            stop_control.request_stop();
            println!("[GUI] Stop requested for the active run.");
            warp::reply::with_status(
                warp::reply::json(&json!({"status": "stopping"})),
                StatusCode::ACCEPTED,
            )
        });

        let skip_route = warp::path("skip-gate").and(warp::post()).map(move || {
            skip_control.request_gate_skip();
            println!("[GUI] Movement gate skip requested.");
            warp::reply::with_status(
                warp::reply::json(&json!({"status": "skipping gate"})),
                StatusCode::ACCEPTED,
            )
        });

        thread::spawn(move || {
            let routes = overlay_route
                .or(scores_route)
                .or(status_route)
                .or(metrics_route)
                .or(stop_route)
                .or(skip_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            info!("overlay bridge listening on http://{}", address);
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });
    }

    pub fn publish(&self, overlay: OverlayModel) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.overlay = Some(overlay);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> BridgeModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RunObserver for GuiBridge {
    fn on_frame(&self, session: &RunSession) {
        self.publish(OverlayModel::from_session(session));
    }

    fn on_finished(&self, outcome: &RunOutcome) {
        let Some(score) = outcome.report.committed.clone() else {
            return;
        };
        println!(
            "[GUI] {} -> exploration {}, time {}, final {}",
            score.team_name, score.exploration_score, score.time_score, score.final_score
        );
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.record_score(score);
    }

    fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.status = message.to_string();
    }
}

use mazecore::frame::{FrameSource, FrameSourceError};
use mazecore::prelude::{SessionConfig, SessionError};
use mazecore::scoring::RegionOfInterest;
use mazecore::session::{RunSession, SessionReport, SessionStatus};
use mazecore::telemetry::RunMetrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("frame source failed during run for {}", .report.team_name)]
    FrameSource {
        report: Box<SessionReport>,
        #[source]
        source: FrameSourceError,
    },
}

/// Operator requests, checked by the runner between ticks.
#[derive(Debug, Default)]
pub struct RunControl {
    run: AtomicBool,
    shutdown: AtomicBool,
    gate_skip: AtomicBool,
}

impl RunControl {
    /// Stops the active run only.
    pub fn request_stop(&self) {
        self.run.store(true, Ordering::SeqCst);
    }

    /// Stops the active run and the competition loop.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.run.store(true, Ordering::SeqCst);
    }

    /// Starts the clock of a run still waiting for movement.
    pub fn request_gate_skip(&self) {
        self.gate_skip.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn take_stop(&self) -> bool {
        self.run.swap(false, Ordering::SeqCst)
    }

    fn take_gate_skip(&self) -> bool {
        self.gate_skip.swap(false, Ordering::SeqCst)
    }

    fn clear_pending(&self) {
        self.run.store(false, Ordering::SeqCst);
        self.gate_skip.store(false, Ordering::SeqCst);
    }
}

/// Drives one session at a time through the synchronous tick loop.
#[derive(Clone)]
pub struct Runner {
    roi: RegionOfInterest,
    metrics: Arc<RunMetrics>,
    control: Arc<RunControl>,
}

impl Runner {
    pub fn new(roi: RegionOfInterest, metrics: Arc<RunMetrics>, control: Arc<RunControl>) -> Self {
        Self {
            roi,
            metrics,
            control,
        }
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    pub fn execute(
        &self,
        team_name: &str,
        config: SessionConfig,
        feed: &mut dyn FrameSource,
        on_frame: &mut dyn FnMut(&RunSession),
    ) -> Result<SessionReport, RunError> {
        let mut session = RunSession::new(team_name, self.roi, config)?;
        if !self.control.is_shutdown() {
            self.control.clear_pending();
        }

        let mut started = false;
        while !session.status().is_terminal() {
            if self.control.take_stop() {
                session.stop()?;
                break;
            }

            let frame = match feed.next_frame() {
                Ok(frame) => frame,
                Err(source) => {
                    self.metrics.record_error();
                    session.abort_frame_source()?;
                    let report = session.into_report()?;
                    return Err(RunError::FrameSource {
                        report: Box::new(report),
                        source,
                    });
                }
            };

            if !started {
                session.start(frame.timestamp)?;
                started = true;
            }
            if session.status() == SessionStatus::AwaitingMovement
                && self.control.take_gate_skip()
            {
                session.skip_gate(frame.timestamp)?;
            }

            let outcome = session.tick(&frame)?;
            self.metrics.record_tick(&outcome);
            on_frame(&session);
        }

        Ok(session.into_report()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::feed::{SyntheticFeed, SyntheticFeedConfig};
    use crate::generator::trace::TraceFeed;
    use mazecore::frame::{Detection, FrameInput, Point};
    use mazecore::session::StopReason;

    fn roi() -> RegionOfInterest {
        RegionOfInterest::new(0, 0, 80, 80)
    }

    fn runner() -> (Runner, Arc<RunMetrics>, Arc<RunControl>) {
        let metrics = Arc::new(RunMetrics::new());
        let stop = Arc::new(RunControl::default());
        (Runner::new(roi(), metrics.clone(), stop.clone()), metrics, stop)
    }

    fn short_config() -> SessionConfig {
        SessionConfig {
            run_duration_secs: 90.0,
            ..Default::default()
        }
    }

    #[test]
    fn runner_scores_synthetic_run_to_expiry() {
        let (runner, metrics, _) = runner();
        let mut feed = SyntheticFeed::new(
            SyntheticFeedConfig {
                seed: 3,
                lead_in_frames: 0,
                ..Default::default()
            },
            roi(),
        );
        let mut frames = 0;
        let report = runner
            .execute("Team A", short_config(), &mut feed, &mut |_| frames += 1)
            .unwrap();

        assert_eq!(report.status, SessionStatus::Expired);
        let committed = report.committed.unwrap();
        assert!(committed.exploration_score > 0);
        // 90s run: (90 - 60) / 5 = 6 decay steps.
        assert_eq!(committed.time_score, 525.0);
        assert_eq!(metrics.snapshot().sessions_committed, 1);
        assert_eq!(metrics.snapshot().frames_processed, frames);
    }

    #[test]
    fn runner_waits_for_movement_when_gated() {
        let (runner, _, _) = runner();
        let config = SessionConfig {
            gate_on_movement: true,
            ..short_config()
        };
        let mut feed = SyntheticFeed::new(
            SyntheticFeedConfig {
                seed: 11,
                fps: 10.0,
                lead_in_frames: 100,
                dropout: 0.0,
                ..Default::default()
            },
            roi(),
        );
        let mut first_running_elapsed = None;
        let report = runner
            .execute("Gated", config, &mut feed, &mut |session| {
                if session.status() == SessionStatus::Running && first_running_elapsed.is_none() {
                    first_running_elapsed = session.start_timestamp();
                }
            })
            .unwrap();
        assert_eq!(report.status, SessionStatus::Expired);
        // The marker sits still for 10s, so the clock cannot start before then.
        assert!(first_running_elapsed.unwrap() >= 10.0);
    }

    #[test]
    fn gate_skip_starts_the_clock_without_movement() {
        let (runner, _, control) = runner();
        let config = SessionConfig {
            gate_on_movement: true,
            ..short_config()
        };
        let mut feed = SyntheticFeed::new(
            SyntheticFeedConfig {
                fps: 10.0,
                lead_in_frames: 10_000,
                dropout: 0.0,
                ..Default::default()
            },
            roi(),
        );
        let mut ticks = 0;
        let mut started_at = None;
        let report = runner
            .execute("Skipped", config, &mut feed, &mut |session| {
                ticks += 1;
                if ticks == 5 {
                    control.request_gate_skip();
                }
                if started_at.is_none() {
                    started_at = session.start_timestamp();
                }
            })
            .unwrap();
        assert_eq!(report.status, SessionStatus::Expired);
        // Ticks 1..=5 land at 0.0..=0.4s; the skip applies on the sixth frame.
        assert_eq!(started_at, Some(0.5));
    }

    #[test]
    fn lost_frames_abort_the_run() {
        let (runner, metrics, _) = runner();
        let mut feed = TraceFeed::new(vec![
            FrameInput::new(0.0, vec![Detection::square(1, Point::new(5.0, 5.0), 4.0)]),
            FrameInput::new(1.0, vec![Detection::square(1, Point::new(15.0, 5.0), 4.0)]),
        ]);
        match runner.execute("Team B", short_config(), &mut feed, &mut |_| {}) {
            Err(RunError::FrameSource { report, source }) => {
                assert_eq!(
                    report.status,
                    SessionStatus::Stopped(StopReason::FrameSourceLost)
                );
                assert!(report.committed.is_none());
                assert_eq!(report.visited_cells.len(), 2);
                assert!(matches!(source, FrameSourceError::Exhausted(2)));
            }
            other => panic!("expected frame source failure, got {other:?}"),
        }
        assert_eq!(metrics.snapshot().errors, 1);
    }

    #[test]
    fn stop_request_cancels_between_ticks() {
        let (runner, _, stop) = runner();
        let mut feed = SyntheticFeed::new(SyntheticFeedConfig::default(), roi());
        let mut ticks = 0;
        let report = runner
            .execute("Team C", short_config(), &mut feed, &mut |_| {
                ticks += 1;
                if ticks == 20 {
                    stop.request_stop();
                }
            })
            .unwrap();
        assert_eq!(report.status, SessionStatus::Stopped(StopReason::Cancelled));
        assert!(report.committed.is_none());
        assert_eq!(ticks, 20);
    }

    #[test]
    fn stale_stop_request_does_not_cancel_next_run() {
        let (runner, _, stop) = runner();
        stop.request_stop();
        let mut feed = SyntheticFeed::new(SyntheticFeedConfig::default(), roi());
        let report = runner
            .execute("Team D", SessionConfig::warm_up(), &mut feed, &mut |_| {})
            .unwrap();
        assert_eq!(report.status, SessionStatus::Expired);
    }
}

use crate::session::{SessionEvent, TickOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters shared between the tick loop and whoever reports on it.
pub struct RunMetrics {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_processed: usize,
    pub detections_mapped: usize,
    pub detections_dropped: usize,
    pub gate_rebaselines: usize,
    pub sessions_committed: usize,
    pub errors: usize,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_tick(&self, outcome: &TickOutcome) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames_processed += 1;
            metrics.detections_mapped += outcome.mapped_detections;
            metrics.detections_dropped += outcome.dropped_detections;
            for event in &outcome.events {
                match event {
                    SessionEvent::GateRebaselined => metrics.gate_rebaselines += 1,
                    SessionEvent::ScoreCommitted(_) => metrics.sessions_committed += 1,
                    _ => {}
                }
            }
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FinalScore, SessionStatus};

    #[test]
    fn tick_outcomes_accumulate() {
        let metrics = RunMetrics::new();
        metrics.record_tick(&TickOutcome {
            status: SessionStatus::AwaitingMovement,
            elapsed: 0.0,
            time_left: 300.0,
            mapped_detections: 0,
            dropped_detections: 0,
            events: vec![SessionEvent::GateRebaselined],
        });
        metrics.record_tick(&TickOutcome {
            status: SessionStatus::Expired,
            elapsed: 300.0,
            time_left: 0.0,
            mapped_detections: 2,
            dropped_detections: 1,
            events: vec![
                SessionEvent::Expired,
                SessionEvent::ScoreCommitted(FinalScore {
                    team_name: "A".into(),
                    exploration_score: 4,
                    time_score: 0.0,
                    final_score: 4.0,
                }),
            ],
        });
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_processed, 2);
        assert_eq!(snapshot.detections_mapped, 2);
        assert_eq!(snapshot.detections_dropped, 1);
        assert_eq!(snapshot.gate_rebaselines, 1);
        assert_eq!(snapshot.sessions_committed, 1);
        assert_eq!(snapshot.errors, 1);
    }
}

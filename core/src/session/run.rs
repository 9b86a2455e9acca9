use crate::frame::detection::{Detection, FrameInput};
use crate::prelude::{SessionConfig, SessionError, SessionResult};
use crate::scoring::{
    CellCoordinate, GridMapper, RegionOfInterest, ScoreCalculator, ScoreState, VisitationTracker,
};
use crate::session::gate::{GateVerdict, MovementGate};
use crate::session::report::{
    FinalScore, SessionEvent, SessionReport, SessionStatus, StopReason, TickOutcome,
};
use crate::telemetry::log::RunLogger;

/// One team's timed run, from the start gate to the committed score.
///
/// The host owns the session for the whole run and drives it with one
/// [`RunSession::tick`] per video frame. Timestamps are seconds on a
/// monotonic clock chosen by the host; the session never reads a clock.
pub struct RunSession {
    team_name: String,
    config: SessionConfig,
    mapper: GridMapper,
    calculator: ScoreCalculator,
    gate: MovementGate,
    tracker: VisitationTracker,
    scores: ScoreState,
    status: SessionStatus,
    start_timestamp: Option<f64>,
    last_timestamp: Option<f64>,
    elapsed: f64,
    last_detections: Vec<Detection>,
    committed: Option<FinalScore>,
    logger: RunLogger,
}

impl RunSession {
    pub fn new(
        team_name: impl Into<String>,
        roi: RegionOfInterest,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        config.validate()?;
        let mapper = GridMapper::new(roi)?;
        let team_name = team_name.into();
        let calculator = ScoreCalculator::new(config.scoring.clone());
        let scores = calculator.initial_state();
        let logger = RunLogger::new(&team_name);

        Ok(Self {
            team_name,
            config,
            mapper,
            calculator,
            gate: MovementGate::new(),
            tracker: VisitationTracker::new(),
            scores,
            status: SessionStatus::Pending,
            start_timestamp: None,
            last_timestamp: None,
            elapsed: 0.0,
            last_detections: Vec::new(),
            committed: None,
            logger,
        })
    }

    pub fn start(&mut self, now: f64) -> SessionResult<SessionStatus> {
        self.require(SessionStatus::Pending, "start")?;
        self.advance_clock(now)?;

        if self.config.gate_on_movement {
            self.gate.reset();
            self.status = SessionStatus::AwaitingMovement;
            self.logger.record("waiting for robot movement");
        } else {
            self.begin_run(now);
        }
        Ok(self.status)
    }

    /// Ends the movement gate without waiting for motion.
    pub fn skip_gate(&mut self, now: f64) -> SessionResult<SessionStatus> {
        self.require(SessionStatus::AwaitingMovement, "skip the movement gate")?;
        self.advance_clock(now)?;
        self.logger.warn("movement gate skipped by operator");
        self.begin_run(now);
        Ok(self.status)
    }

    pub fn tick(&mut self, frame: &FrameInput) -> SessionResult<TickOutcome> {
        match self.status {
            SessionStatus::AwaitingMovement => {
                self.advance_clock(frame.timestamp)?;
                Ok(self.tick_gate(frame))
            }
            SessionStatus::Running => {
                self.advance_clock(frame.timestamp)?;
                self.tick_running(frame)
            }
            status => Err(SessionError::InvalidState {
                operation: "tick",
                status,
            }),
        }
    }

    /// Cancels the run. A cancelled run never commits a score.
    pub fn stop(&mut self) -> SessionResult<SessionStatus> {
        self.terminate(StopReason::Cancelled, "stop")
    }

    /// Ends the run because the host lost its frames.
    pub fn abort_frame_source(&mut self) -> SessionResult<SessionStatus> {
        self.terminate(StopReason::FrameSourceLost, "abort")
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mapper(&self) -> &GridMapper {
        &self.mapper
    }

    pub fn scores(&self) -> ScoreState {
        self.scores
    }

    pub fn visited_cells(&self) -> Vec<CellCoordinate> {
        self.tracker.cells()
    }

    pub fn visited_count(&self) -> usize {
        self.tracker.visited_count()
    }

    pub fn start_timestamp(&self) -> Option<f64> {
        self.start_timestamp
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn time_left(&self) -> f64 {
        (self.config.run_duration_secs - self.elapsed).max(0.0)
    }

    /// Detections from the most recent frame, for drawing marker boxes.
    pub fn last_detections(&self) -> &[Detection] {
        &self.last_detections
    }

    pub fn committed(&self) -> Option<&FinalScore> {
        self.committed.as_ref()
    }

    /// Consumes the session. Anything short of a terminal state is reported
    /// as an unexpected termination, with the partial report attached.
    pub fn into_report(self) -> SessionResult<SessionReport> {
        let report = SessionReport {
            visited_cells: self.tracker.cells(),
            team_name: self.team_name,
            status: self.status,
            elapsed: self.elapsed,
            exploration_score: self.scores.exploration_score,
            time_score: self.scores.time_score,
            committed: self.committed,
        };

        if report.status.is_terminal() {
            Ok(report)
        } else {
            Err(SessionError::UnexpectedTermination(Box::new(report)))
        }
    }

    fn tick_gate(&mut self, frame: &FrameInput) -> TickOutcome {
        self.last_detections = frame.detections.clone();
        let mut events = Vec::new();

        match self.gate.observe(&frame.detections) {
            GateVerdict::Waiting => {}
            GateVerdict::Rebaselined => {
                self.logger.detail(&format!(
                    "marker count changed to {}, re-baselining start positions",
                    frame.detections.len()
                ));
                events.push(SessionEvent::GateRebaselined);
            }
            GateVerdict::Moved { marker_id } => {
                self.logger
                    .record(&format!("marker {} moved, starting timer", marker_id));
                events.push(SessionEvent::MovementDetected { marker_id });
                self.begin_run(frame.timestamp);
            }
        }

        self.outcome(0, 0, events)
    }

    fn tick_running(&mut self, frame: &FrameInput) -> SessionResult<TickOutcome> {
        let start = self.start_timestamp.ok_or(SessionError::InvalidState {
            operation: "tick without a start time",
            status: self.status,
        })?;
        let elapsed = frame.timestamp - start;
        let duration = self.config.run_duration_secs;

        if elapsed >= duration {
            return Ok(self.expire(duration));
        }

        self.elapsed = elapsed;
        self.last_detections = frame.detections.clone();

        let cells: Vec<CellCoordinate> = frame
            .detections
            .iter()
            .filter_map(|detection| self.mapper.map_to_cell(detection.center).cell())
            .collect();
        let mapped = cells.len();
        let dropped = frame.detections.len() - mapped;

        let mut events = Vec::new();
        for cell in self.tracker.record_cells(cells) {
            self.logger
                .record(&format!("visited cell ({}, {})", cell.col, cell.row));
            events.push(SessionEvent::CellVisited(cell));
        }

        self.scores.exploration_score = self
            .calculator
            .exploration_score(self.tracker.visited_count());
        self.scores = self.calculator.time_score(elapsed, self.scores);

        Ok(self.outcome(mapped, dropped, events))
    }

    fn expire(&mut self, duration: f64) -> TickOutcome {
        self.elapsed = duration;
        self.scores = self.calculator.time_score(duration, self.scores);
        self.status = SessionStatus::Expired;
        self.logger.record(&format!(
            "time's up: exploration {} time {:.1}",
            self.scores.exploration_score, self.scores.time_score
        ));

        let mut events = vec![SessionEvent::Expired];
        if self.config.commit_score {
            let score = FinalScore {
                team_name: self.team_name.clone(),
                exploration_score: self.scores.exploration_score,
                time_score: self.scores.time_score,
                final_score: self.scores.final_score(),
            };
            self.logger
                .record(&format!("final score {:.1}", score.final_score));
            self.committed = Some(score.clone());
            events.push(SessionEvent::ScoreCommitted(score));
        }

        self.outcome(0, 0, events)
    }

    fn begin_run(&mut self, now: f64) {
        self.start_timestamp = Some(now);
        self.scores = self.calculator.initial_state();
        self.tracker.clear();
        self.elapsed = 0.0;
        self.status = SessionStatus::Running;
        self.logger.record(&format!(
            "run started, {:.0}s on the clock",
            self.config.run_duration_secs
        ));
    }

    fn terminate(
        &mut self,
        reason: StopReason,
        operation: &'static str,
    ) -> SessionResult<SessionStatus> {
        if self.status.is_terminal() {
            return Err(SessionError::InvalidState {
                operation,
                status: self.status,
            });
        }
        self.status = SessionStatus::Stopped(reason);
        self.logger
            .warn(&format!("run {} after {:.1}s, no score committed", self.status, self.elapsed));
        Ok(self.status)
    }

    fn require(&self, expected: SessionStatus, operation: &'static str) -> SessionResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                status: self.status,
            })
        }
    }

    fn advance_clock(&mut self, now: f64) -> SessionResult<()> {
        if !now.is_finite() {
            return Err(SessionError::NonFiniteTimestamp(now));
        }
        if let Some(previous) = self.last_timestamp {
            if !(now >= previous) {
                return Err(SessionError::ClockWentBackwards {
                    previous,
                    current: now,
                });
            }
        }
        self.last_timestamp = Some(now);
        Ok(())
    }

    fn outcome(&self, mapped: usize, dropped: usize, events: Vec<SessionEvent>) -> TickOutcome {
        TickOutcome {
            status: self.status,
            elapsed: self.elapsed,
            time_left: self.time_left(),
            mapped_detections: mapped,
            dropped_detections: dropped,
            events,
        }
    }
}

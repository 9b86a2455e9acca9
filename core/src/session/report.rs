use crate::scoring::CellCoordinate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The operator or host cancelled the run.
    Cancelled,
    /// The camera or detector stopped delivering frames.
    FrameSourceLost,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    AwaitingMovement,
    Running,
    Expired,
    Stopped(StopReason),
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Expired | SessionStatus::Stopped(_))
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Pending => write!(f, "pending"),
            SessionStatus::AwaitingMovement => write!(f, "awaiting movement"),
            SessionStatus::Running => write!(f, "running"),
            SessionStatus::Expired => write!(f, "expired"),
            SessionStatus::Stopped(StopReason::Cancelled) => write!(f, "stopped (cancelled)"),
            SessionStatus::Stopped(StopReason::FrameSourceLost) => {
                write!(f, "stopped (frame source lost)")
            }
        }
    }
}

/// Score committed once when a scored run expires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinalScore {
    pub team_name: String,
    pub exploration_score: u32,
    pub time_score: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MovementDetected { marker_id: u32 },
    GateRebaselined,
    CellVisited(CellCoordinate),
    Expired,
    ScoreCommitted(FinalScore),
}

/// Result of feeding one frame to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub status: SessionStatus,
    pub elapsed: f64,
    pub time_left: f64,
    pub mapped_detections: usize,
    pub dropped_detections: usize,
    pub events: Vec<SessionEvent>,
}

impl TickOutcome {
    pub fn newly_visited(&self) -> impl Iterator<Item = CellCoordinate> + '_ {
        self.events.iter().filter_map(|event| match event {
            SessionEvent::CellVisited(cell) => Some(*cell),
            _ => None,
        })
    }

    pub fn committed(&self) -> Option<&FinalScore> {
        self.events.iter().find_map(|event| match event {
            SessionEvent::ScoreCommitted(score) => Some(score),
            _ => None,
        })
    }
}

/// Everything that survives a finished session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionReport {
    pub team_name: String,
    pub status: SessionStatus,
    pub elapsed: f64,
    pub visited_cells: Vec<CellCoordinate>,
    pub exploration_score: u32,
    pub time_score: f64,
    pub committed: Option<FinalScore>,
}

impl SessionReport {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

use crate::scoring::{GridError, ScoringConfig, GRID_CELLS, MAX_EXPLORATION_SCORE};
use crate::session::{SessionReport, SessionStatus};
use serde::{Deserialize, Serialize};

/// Shared configuration for a single team's run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub run_duration_secs: f64,
    pub gate_on_movement: bool,
    pub commit_score: bool,
    pub scoring: ScoringConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            run_duration_secs: 300.0,
            gate_on_movement: false,
            commit_score: true,
            scoring: ScoringConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Short unscored run used to settle the camera before the first real team.
    pub fn warm_up() -> Self {
        Self {
            run_duration_secs: 10.0,
            gate_on_movement: false,
            commit_score: false,
            scoring: ScoringConfig::default(),
        }
    }

    pub fn validate(&self) -> SessionResult<()> {
        let scoring = &self.scoring;
        if !(self.run_duration_secs.is_finite() && self.run_duration_secs > 0.0) {
            return Err(SessionError::InvalidConfig(format!(
                "run duration must be positive, got {}",
                self.run_duration_secs
            )));
        }
        if !(scoring.decay_interval_secs.is_finite() && scoring.decay_interval_secs > 0.0) {
            return Err(SessionError::InvalidConfig(format!(
                "decay interval must be positive, got {}",
                scoring.decay_interval_secs
            )));
        }
        if scoring.grace_period_secs < 0.0 || scoring.decay_step < 0.0 {
            return Err(SessionError::InvalidConfig(
                "grace period and decay step must not be negative".into(),
            ));
        }
        if scoring.points_per_cell == 0 || scoring.max_cells == 0 || scoring.max_cells > GRID_CELLS {
            return Err(SessionError::InvalidConfig(format!(
                "need points_per_cell >= 1 and max_cells in 1..={}, got {} and {}",
                GRID_CELLS, scoring.points_per_cell, scoring.max_cells
            )));
        }
        let max_exploration = u64::from(scoring.points_per_cell) * u64::from(scoring.max_cells);
        if max_exploration > u64::from(MAX_EXPLORATION_SCORE) {
            return Err(SessionError::InvalidConfig(format!(
                "exploration score could reach {}, above the {} point cap",
                max_exploration, MAX_EXPLORATION_SCORE
            )));
        }
        if !(scoring.initial_time_score.is_finite() && scoring.initial_time_score >= 0.0) {
            return Err(SessionError::InvalidConfig(format!(
                "initial time score must be non-negative, got {}",
                scoring.initial_time_score
            )));
        }
        Ok(())
    }
}

/// Common error type for session execution.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("cannot {operation} while session is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
    #[error("frame timestamp {current} precedes previous timestamp {previous}")]
    ClockWentBackwards { previous: f64, current: f64 },
    #[error("frame timestamp {0} is not a finite number of seconds")]
    NonFiniteTimestamp(f64),
    #[error("session for {} ended while {}", .0.team_name, .0.status)]
    UnexpectedTermination(Box<SessionReport>),
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_competition_rules() {
        let config = SessionConfig::default();
        assert_eq!(config.run_duration_secs, 300.0);
        assert!(config.commit_score);
        assert_eq!(config.scoring.initial_time_score, 600.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn warm_up_run_never_commits() {
        let config = SessionConfig::warm_up();
        assert_eq!(config.run_duration_secs, 10.0);
        assert!(!config.commit_score);
    }

    #[test]
    fn zero_decay_interval_is_rejected() {
        let mut config = SessionConfig::default();
        config.scoring.decay_interval_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn exploration_knobs_cannot_exceed_the_cap() {
        let invalid = [(3, 64), (2, 100), (0, 64), (2, 0)];
        for (points_per_cell, max_cells) in invalid {
            let mut config = SessionConfig::default();
            config.scoring.points_per_cell = points_per_cell;
            config.scoring.max_cells = max_cells;
            assert!(
                matches!(config.validate(), Err(SessionError::InvalidConfig(_))),
                "{points_per_cell} x {max_cells} should be rejected"
            );
        }

        let mut halved = SessionConfig::default();
        halved.scoring.points_per_cell = 4;
        halved.scoring.max_cells = 32;
        assert!(halved.validate().is_ok());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"gate_on_movement": true, "scoring": {"decay_step": 10.0}}"#)
                .unwrap();
        assert!(config.gate_on_movement);
        assert_eq!(config.scoring.decay_step, 10.0);
        assert_eq!(config.scoring.grace_period_secs, 60.0);
        assert_eq!(config.run_duration_secs, 300.0);
    }
}

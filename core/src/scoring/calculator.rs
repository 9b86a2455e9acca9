use crate::scoring::grid::GRID_DIM;
use serde::{Deserialize, Serialize};

/// Exploration points for a fully explored maze.
pub const MAX_EXPLORATION_SCORE: u32 = 128;

/// Cells in the maze grid.
pub const GRID_CELLS: u32 = GRID_DIM * GRID_DIM;

/// How the time score catches up when a tick spans several decay intervals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecayPolicy {
    /// One step per interval boundary crossed since the grace period ended.
    #[default]
    PerInterval,
    /// At most one step per tick, measured from the previous decay tick.
    SinglePerTick,
}

/// Scoring constants for a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub initial_time_score: f64,
    pub grace_period_secs: f64,
    pub decay_interval_secs: f64,
    pub decay_step: f64,
    pub points_per_cell: u32,
    pub max_cells: u32,
    pub decay_policy: DecayPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            initial_time_score: 600.0,
            grace_period_secs: 60.0,
            decay_interval_secs: 5.0,
            decay_step: 12.5,
            points_per_cell: 2,
            max_cells: 64,
            decay_policy: DecayPolicy::PerInterval,
        }
    }
}

/// Running score components, with elapsed seconds of the last applied decay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreState {
    pub exploration_score: u32,
    pub time_score: f64,
    pub last_decay_elapsed: f64,
}

impl ScoreState {
    pub fn final_score(&self) -> f64 {
        f64::from(self.exploration_score) + self.time_score
    }
}

pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn initial_state(&self) -> ScoreState {
        let last_decay_elapsed = match self.config.decay_policy {
            DecayPolicy::PerInterval => self.config.grace_period_secs,
            DecayPolicy::SinglePerTick => 0.0,
        };
        ScoreState {
            exploration_score: 0,
            time_score: self.config.initial_time_score,
            last_decay_elapsed,
        }
    }

    pub fn max_exploration_score(&self) -> u32 {
        self.config
            .max_cells
            .saturating_mul(self.config.points_per_cell)
            .min(MAX_EXPLORATION_SCORE)
    }

    pub fn exploration_score(&self, visited_count: usize) -> u32 {
        let visited = u32::try_from(visited_count).unwrap_or(u32::MAX);
        visited
            .saturating_mul(self.config.points_per_cell)
            .min(self.max_exploration_score())
    }

    /// Applies whatever decay `elapsed` calls for on top of `state`.
    pub fn time_score(&self, elapsed: f64, state: ScoreState) -> ScoreState {
        if elapsed <= self.config.grace_period_secs {
            return state;
        }

        let interval = self.config.decay_interval_secs;
        let since_last = elapsed - state.last_decay_elapsed;
        if since_last < interval || state.time_score <= 0.0 {
            return state;
        }

        let mut next = state;
        match self.config.decay_policy {
            DecayPolicy::PerInterval => {
                let steps = (since_last / interval).floor();
                next.time_score = (state.time_score - steps * self.config.decay_step).max(0.0);
                next.last_decay_elapsed = state.last_decay_elapsed + steps * interval;
            }
            DecayPolicy::SinglePerTick => {
                next.time_score = (state.time_score - self.config.decay_step).max(0.0);
                next.last_decay_elapsed = elapsed;
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> ScoreCalculator {
        ScoreCalculator::new(ScoringConfig::default())
    }

    #[test]
    fn exploration_score_is_two_per_cell_and_capped() {
        let calc = calculator();
        assert_eq!(calc.exploration_score(0), 0);
        assert_eq!(calc.exploration_score(2), 4);
        assert_eq!(calc.exploration_score(64), 128);
        assert_eq!(calc.exploration_score(500), 128);
    }

    #[test]
    fn exploration_cap_holds_for_oversized_knobs() {
        let calc = ScoreCalculator::new(ScoringConfig {
            points_per_cell: 3,
            max_cells: 100,
            ..ScoringConfig::default()
        });
        assert_eq!(calc.max_exploration_score(), MAX_EXPLORATION_SCORE);
        assert_eq!(calc.exploration_score(64), 128);
    }

    #[test]
    fn grace_period_leaves_time_score_untouched() {
        let calc = calculator();
        let start = calc.initial_state();
        for elapsed in [0.0, 10.0, 59.9, 60.0] {
            assert_eq!(calc.time_score(elapsed, start), start);
        }
    }

    #[test]
    fn first_step_lands_one_interval_after_grace() {
        let calc = calculator();
        let start = calc.initial_state();
        assert_eq!(calc.time_score(64.9, start).time_score, 600.0);
        let after = calc.time_score(65.0, start);
        assert_eq!(after.time_score, 587.5);
        assert_eq!(after.last_decay_elapsed, 65.0);
    }

    #[test]
    fn stalled_tick_applies_every_crossed_interval() {
        let calc = calculator();
        let after = calc.time_score(81.0, calc.initial_state());
        assert_eq!(after.time_score, 600.0 - 4.0 * 12.5);
        assert_eq!(after.last_decay_elapsed, 80.0);
        let later = calc.time_score(85.0, after);
        assert_eq!(later.time_score, 600.0 - 5.0 * 12.5);
    }

    #[test]
    fn step_schedule_is_independent_of_tick_rate() {
        let calc = calculator();
        let mut fine = calc.initial_state();
        let mut elapsed = 0.0;
        while elapsed < 200.0 {
            elapsed += 0.25;
            fine = calc.time_score(elapsed, fine);
        }
        let coarse = calc.time_score(200.0, calc.initial_state());
        assert_eq!(fine.time_score, coarse.time_score);
    }

    #[test]
    fn time_score_never_increases_and_floors_at_zero() {
        let calc = calculator();
        let mut state = calc.initial_state();
        let mut previous = state.time_score;
        for tick in 0..4000 {
            state = calc.time_score(f64::from(tick) * 0.5, state);
            assert!(state.time_score <= previous);
            assert!(state.time_score >= 0.0);
            previous = state.time_score;
        }
        assert_eq!(state.time_score, 0.0);
    }

    #[test]
    fn single_per_tick_policy_decays_once_per_tick() {
        let calc = ScoreCalculator::new(ScoringConfig {
            decay_policy: DecayPolicy::SinglePerTick,
            ..Default::default()
        });
        let start = calc.initial_state();
        let first = calc.time_score(90.0, start);
        assert_eq!(first.time_score, 587.5);
        assert_eq!(first.last_decay_elapsed, 90.0);
        assert_eq!(calc.time_score(94.0, first), first);
        assert_eq!(calc.time_score(95.0, first).time_score, 575.0);
    }

    #[test]
    fn final_score_sums_components() {
        let state = ScoreState {
            exploration_score: 10,
            time_score: 587.5,
            last_decay_elapsed: 65.0,
        };
        assert_eq!(state.final_score(), 597.5);
    }
}

pub mod calculator;
pub mod grid;
pub mod visitation;

pub use calculator::{
    DecayPolicy, ScoreCalculator, ScoreState, ScoringConfig, GRID_CELLS, MAX_EXPLORATION_SCORE,
};
pub use grid::{
    CellCoordinate, CellLookup, GridError, GridMapper, LineSegment, PixelRect, RegionOfInterest,
    GRID_DIM,
};
pub use visitation::VisitationTracker;

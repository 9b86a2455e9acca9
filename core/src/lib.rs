//! Run-scoring engine for the robotics maze competition.
//!
//! A host feeds marker detections frame by frame into a [`session::RunSession`],
//! which maps them onto the 8x8 maze grid, tracks visited cells, decays the time
//! score and commits one final score when the run expires.

pub mod frame;
pub mod prelude;
pub mod queue;
pub mod scoring;
pub mod session;
pub mod telemetry;

pub use prelude::{SessionConfig, SessionError, SessionResult};
pub use session::{RunSession, SessionStatus};

pub mod gate;
pub mod overlay;
pub mod report;
pub mod run;

pub use gate::{GateVerdict, MovementGate};
pub use overlay::{MarkerBox, OverlayModel};
pub use report::{FinalScore, SessionEvent, SessionReport, SessionStatus, StopReason, TickOutcome};
pub use run::RunSession;

use mazecore::session::{FinalScore, OverlayModel};
use serde::{Deserialize, Serialize};

/// Latest state published to the overlay viewer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeModel {
    pub overlay: Option<OverlayModel>,
    pub scores: Vec<FinalScore>,
    pub status: String,
}

impl BridgeModel {
    pub fn record_score(&mut self, score: FinalScore) {
        self.scores.push(score);
    }
}

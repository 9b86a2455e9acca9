use serde::{Deserialize, Serialize};

/// A team waiting for its hardware run, with the time of its last upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TeamEntry {
    pub team_name: String,
    pub uploaded_at: String,
}

impl TeamEntry {
    pub fn new(team_name: impl Into<String>, uploaded_at: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            uploaded_at: uploaded_at.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("team store unavailable: {0}")]
    Unavailable(String),
    #[error("team store data is corrupt: {0}")]
    Corrupt(String),
    #[error("score for {team} rejected: {reason}")]
    Rejected { team: String, reason: String },
}

/// Shared document store holding teams and their hardware scores.
pub trait TeamStore {
    /// Teams with an upload timestamp, oldest upload first.
    fn list_teams_by_upload_time(&self) -> Result<Vec<TeamEntry>, StoreError>;

    /// Upserts the hardware score for `team_name`. Called once per scored run.
    fn record_hardware_score(&self, team_name: &str, score: f64) -> Result<(), StoreError>;
}

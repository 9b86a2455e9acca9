use log::{debug, info, warn};

/// Log helper that tags every record with the team being scored.
pub struct RunLogger {
    team: String,
}

impl RunLogger {
    pub fn new(team: &str) -> Self {
        Self {
            team: team.to_string(),
        }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.team, message);
    }

    pub fn detail(&self, message: &str) {
        debug!("[{}] {}", self.team, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.team, message);
    }
}

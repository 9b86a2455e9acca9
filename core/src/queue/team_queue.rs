use crate::queue::store::{StoreError, TeamEntry, TeamStore};
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRefresh {
    /// The store returned a different list; the queue starts over.
    Replaced,
    /// Same list as before but every team had run, so the queue starts over.
    Rewound,
    Unchanged,
}

/// Ordered teams awaiting a run, refreshed from the team store between runs.
#[derive(Debug, Clone, Default)]
pub struct TeamQueue {
    entries: Vec<TeamEntry>,
    cursor: usize,
}

impl TeamQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_from(&mut self, store: &dyn TeamStore) -> Result<QueueRefresh, StoreError> {
        let teams = store.list_teams_by_upload_time()?;
        Ok(self.replace(teams))
    }

    pub fn replace(&mut self, teams: Vec<TeamEntry>) -> QueueRefresh {
        if teams != self.entries {
            self.entries = teams;
            self.cursor = 0;
            info!("loaded {} teams", self.entries.len());
            for entry in &self.entries {
                info!("  {} - {}", entry.team_name, entry.uploaded_at);
            }
            QueueRefresh::Replaced
        } else if self.is_exhausted() && !self.entries.is_empty() {
            self.cursor = 0;
            QueueRefresh::Rewound
        } else {
            QueueRefresh::Unchanged
        }
    }

    pub fn next_team(&mut self) -> Option<TeamEntry> {
        let entry = self.entries.get(self.cursor).cloned();
        if entry.is_some() {
            self.cursor += 1;
        }
        entry
    }

    pub fn peek(&self) -> Option<&TeamEntry> {
        self.entries.get(self.cursor)
    }

    pub fn remaining(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn entries(&self) -> &[TeamEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedStore {
        teams: RefCell<Vec<TeamEntry>>,
    }

    impl TeamStore for FixedStore {
        fn list_teams_by_upload_time(&self) -> Result<Vec<TeamEntry>, StoreError> {
            Ok(self.teams.borrow().clone())
        }

        fn record_hardware_score(&self, _team_name: &str, _score: f64) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct DownStore;

    impl TeamStore for DownStore {
        fn list_teams_by_upload_time(&self) -> Result<Vec<TeamEntry>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }

        fn record_hardware_score(&self, _team_name: &str, _score: f64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
    }

    fn teams(names: &[&str]) -> Vec<TeamEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| TeamEntry::new(*name, format!("2024-04-0{}T10:00:00", i + 1)))
            .collect()
    }

    #[test]
    fn teams_come_out_in_store_order() {
        let store = FixedStore {
            teams: RefCell::new(teams(&["alpha", "beta"])),
        };
        let mut queue = TeamQueue::new();
        assert_eq!(queue.refresh_from(&store).unwrap(), QueueRefresh::Replaced);
        assert_eq!(queue.next_team().unwrap().team_name, "alpha");
        assert_eq!(queue.peek().unwrap().team_name, "beta");
        assert_eq!(queue.next_team().unwrap().team_name, "beta");
        assert!(queue.next_team().is_none());
        assert!(queue.is_exhausted());
    }

    #[test]
    fn identical_refresh_keeps_position() {
        let mut queue = TeamQueue::new();
        queue.replace(teams(&["alpha", "beta", "gamma"]));
        queue.next_team();
        assert_eq!(
            queue.replace(teams(&["alpha", "beta", "gamma"])),
            QueueRefresh::Unchanged
        );
        assert_eq!(queue.remaining(), 2);
    }

    #[test]
    fn changed_list_restarts_queue() {
        let mut queue = TeamQueue::new();
        queue.replace(teams(&["alpha", "beta"]));
        queue.next_team();
        assert_eq!(
            queue.replace(teams(&["beta", "delta"])),
            QueueRefresh::Replaced
        );
        assert_eq!(queue.next_team().unwrap().team_name, "beta");
    }

    #[test]
    fn exhausted_queue_rewinds_on_refresh() {
        let mut queue = TeamQueue::new();
        queue.replace(teams(&["alpha"]));
        queue.next_team();
        assert_eq!(queue.replace(teams(&["alpha"])), QueueRefresh::Rewound);
        assert_eq!(queue.next_team().unwrap().team_name, "alpha");
    }

    #[test]
    fn empty_store_stays_exhausted() {
        let mut queue = TeamQueue::new();
        assert_eq!(queue.replace(Vec::new()), QueueRefresh::Unchanged);
        assert!(queue.is_exhausted());
        assert!(queue.next_team().is_none());
    }

    #[test]
    fn store_failure_leaves_queue_intact() {
        let mut queue = TeamQueue::new();
        queue.replace(teams(&["alpha"]));
        assert!(queue.refresh_from(&DownStore).is_err());
        assert_eq!(queue.remaining(), 1);
    }
}

use log::info;
use mazecore::queue::{StoreError, TeamEntry, TeamStore};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One team document as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamDocument {
    pub team_name: String,
    #[serde(default)]
    pub last_upload_to_bot_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_score: Option<f64>,
}

/// Team store backed by a JSON array of team documents.
pub struct JsonTeamStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonTeamStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_documents(&self) -> Result<Vec<TeamDocument>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "{}: {}",
                    self.path.display(),
                    err
                )))
            }
        };
        serde_json::from_str(&contents)
            .map_err(|err| StoreError::Corrupt(format!("{}: {}", self.path.display(), err)))
    }

    fn save_documents(&self, documents: &[TeamDocument]) -> Result<(), StoreError> {
        let unavailable = |err: std::io::Error| {
            StoreError::Unavailable(format!("{}: {}", self.path.display(), err))
        };
        let body = serde_json::to_string_pretty(documents)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(unavailable)?;
            }
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, body).map_err(unavailable)?;
        fs::rename(&staging, &self.path).map_err(unavailable)
    }
}

impl TeamStore for JsonTeamStore {
    fn list_teams_by_upload_time(&self) -> Result<Vec<TeamEntry>, StoreError> {
        let mut teams: Vec<TeamEntry> = self
            .load_documents()?
            .into_iter()
            .filter_map(|doc| {
                doc.last_upload_to_bot_timestamp
                    .map(|uploaded_at| TeamEntry::new(doc.team_name, uploaded_at))
            })
            .collect();
        // ISO-8601 timestamps order correctly as strings.
        teams.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        Ok(teams)
    }

    fn record_hardware_score(&self, team_name: &str, score: f64) -> Result<(), StoreError> {
        if !score.is_finite() {
            return Err(StoreError::Rejected {
                team: team_name.to_string(),
                reason: format!("score {} is not a number", score),
            });
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut documents = self.load_documents()?;
        match documents.iter_mut().find(|doc| doc.team_name == team_name) {
            Some(doc) => doc.hardware_score = Some(score),
            None => documents.push(TeamDocument {
                team_name: team_name.to_string(),
                last_upload_to_bot_timestamp: None,
                hardware_score: Some(score),
            }),
        }
        self.save_documents(&documents)?;
        info!("updated hardwareScore for {} to {}", team_name, score);
        Ok(())
    }
}

use crate::generator::feed::SyntheticFeedConfig;
use anyhow::Context;
use mazecore::prelude::SessionConfig;
use mazecore::scoring::RegionOfInterest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// Move straight on to the next team once a run is scored.
    #[default]
    Automatic,
    /// Wait for the operator before each team.
    Manual,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedConfig {
    Synthetic(SyntheticFeedConfig),
    Trace { path: PathBuf },
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig::Synthetic(SyntheticFeedConfig::default())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompetitionConfig {
    pub roi: RegionOfInterest,
    pub session: SessionConfig,
    pub warm_up_run: bool,
    pub advance: AdvanceMode,
    pub store_path: PathBuf,
    pub ledger_path: PathBuf,
    pub feed: FeedConfig,
    /// Seconds between store polls while waiting for new uploads.
    pub refresh_interval_secs: f64,
    /// Keep polling the store once every queued team is handled.
    pub poll_for_uploads: bool,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            roi: RegionOfInterest::new(80, 0, 480, 480),
            session: SessionConfig {
                gate_on_movement: true,
                ..SessionConfig::default()
            },
            warm_up_run: true,
            advance: AdvanceMode::Automatic,
            store_path: PathBuf::from("tools/data/teams.json"),
            ledger_path: PathBuf::from("tools/data/run_ledger.jsonl"),
            feed: FeedConfig::default(),
            refresh_interval_secs: 20.0,
            poll_for_uploads: false,
        }
    }
}

impl CompetitionConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading competition config {}", path_ref.display()))?;
        let config: CompetitionConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing competition config {}", path_ref.display()))?;
        if !(config.refresh_interval_secs.is_finite() && config.refresh_interval_secs > 0.0) {
            anyhow::bail!(
                "refresh_interval_secs must be positive in {}",
                path_ref.display()
            );
        }
        config
            .session
            .validate()
            .with_context(|| format!("validating competition config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Warm-up runs reuse the competition ROI but never score.
    pub fn warm_up_session(&self) -> SessionConfig {
        SessionConfig::warm_up()
    }
}

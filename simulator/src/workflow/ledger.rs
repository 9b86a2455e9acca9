use anyhow::Context;
use mazecore::session::SessionReport;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One finished run as written to the results ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub report: SessionReport,
    pub persisted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only JSON-lines record of every run this host finished.
pub struct ResultsLedger {
    path: PathBuf,
}

impl ResultsLedger {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &LedgerEntry) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating ledger directory {}", parent.display()))?;
            }
        }
        let line = serde_json::to_string(entry).context("serializing ledger entry")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening ledger {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("writing ledger {}", self.path.display()))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn read_all(&self) -> anyhow::Result<Vec<LedgerEntry>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading ledger {}", self.path.display()))?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str::<LedgerEntry>(line).context("parsing ledger line"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazecore::session::{FinalScore, SessionStatus};
    use tempfile::tempdir;

    fn report(team: &str) -> SessionReport {
        SessionReport {
            team_name: team.into(),
            status: SessionStatus::Expired,
            elapsed: 300.0,
            visited_cells: Vec::new(),
            exploration_score: 0,
            time_score: 0.0,
            committed: Some(FinalScore {
                team_name: team.into(),
                exploration_score: 0,
                time_score: 0.0,
                final_score: 0.0,
            }),
        }
    }

    #[test]
    fn ledger_appends_one_line_per_run() {
        let dir = tempdir().unwrap();
        let ledger = ResultsLedger::new(dir.path().join("data/ledger.jsonl"));
        ledger
            .append(&LedgerEntry {
                report: report("a"),
                persisted: true,
                error: None,
            })
            .unwrap();
        ledger
            .append(&LedgerEntry {
                report: report("b"),
                persisted: false,
                error: Some("store offline".into()),
            })
            .unwrap();

        let entries = ledger.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].report.team_name, "b");
        assert_eq!(entries[1].error.as_deref(), Some("store offline"));
    }
}

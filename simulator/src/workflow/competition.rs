use crate::generator::open_feed;
use crate::workflow::config::CompetitionConfig;
use crate::workflow::ledger::{LedgerEntry, ResultsLedger};
use crate::workflow::runner::{RunError, Runner, RunControl};
use anyhow::{anyhow, Context};
use log::{error, warn};
use mazecore::prelude::{SessionConfig, SessionError};
use mazecore::queue::{TeamEntry, TeamQueue, TeamStore};
use mazecore::session::{FinalScore, RunSession, SessionReport, SessionStatus, StopReason};
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

pub const WARM_UP_TEAM: &str = "warm-up";
const POLL_SLICE: Duration = Duration::from_millis(100);

/// Receives progress from the competition loop, e.g. the GUI bridge.
pub trait RunObserver {
    fn on_frame(&self, session: &RunSession);
    fn on_finished(&self, outcome: &RunOutcome);
    fn publish_status(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorChoice {
    Start,
    Skip,
    Quit,
}

/// Decides whether the next team's run starts.
pub trait Operator {
    fn confirm_start(&mut self, team: &TeamEntry) -> OperatorChoice;
}

/// Starts every team straight away.
pub struct AutoOperator;

impl Operator for AutoOperator {
    fn confirm_start(&mut self, _team: &TeamEntry) -> OperatorChoice {
        OperatorChoice::Start
    }
}

/// Asks on the terminal before each team.
pub struct ConsoleOperator;

impl Operator for ConsoleOperator {
    fn confirm_start(&mut self, team: &TeamEntry) -> OperatorChoice {
        print!(
            "Next team: {} (uploaded {}). [Enter] start, [s] skip, [q] quit: ",
            team.team_name, team.uploaded_at
        );
        if io::stdout().flush().is_err() {
            return OperatorChoice::Quit;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => OperatorChoice::Quit,
            Ok(_) => match line.trim() {
                "s" | "S" => OperatorChoice::Skip,
                "q" | "Q" => OperatorChoice::Quit,
                _ => OperatorChoice::Start,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Persistence {
    NotScored,
    Recorded,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: SessionReport,
    pub persistence: Persistence,
}

#[derive(Debug, Default)]
pub struct CompetitionSummary {
    pub runs: usize,
    pub scored: Vec<FinalScore>,
    pub persistence_failures: usize,
    /// Teams whose run was cancelled or lost its frames.
    pub interrupted: Vec<String>,
}

/// Walks the team queue, one scored run per team.
pub struct Competition<'a> {
    config: CompetitionConfig,
    runner: Runner,
    store: &'a dyn TeamStore,
    observer: &'a dyn RunObserver,
    control: Arc<RunControl>,
    ledger: ResultsLedger,
    handled: HashSet<TeamEntry>,
    deferred: HashSet<TeamEntry>,
    run_index: u64,
}

impl<'a> Competition<'a> {
    pub fn new(
        config: CompetitionConfig,
        runner: Runner,
        store: &'a dyn TeamStore,
        observer: &'a dyn RunObserver,
        control: Arc<RunControl>,
    ) -> Self {
        let ledger = ResultsLedger::new(config.ledger_path.clone());
        Self {
            config,
            runner,
            store,
            observer,
            control,
            ledger,
            handled: HashSet::new(),
            deferred: HashSet::new(),
            run_index: 0,
        }
    }

    pub fn run(
        &mut self,
        queue: &mut TeamQueue,
        operator: &mut dyn Operator,
        once: bool,
    ) -> anyhow::Result<CompetitionSummary> {
        let mut summary = CompetitionSummary::default();

        if self.config.warm_up_run {
            self.warm_up()?;
        }

        loop {
            if self.control.is_shutdown() {
                self.observer.publish_status("Shutdown requested.");
                break;
            }

            if let Err(err) = queue.refresh_from(self.store) {
                if queue.entries().is_empty() {
                    return Err(err).context("loading teams from the store");
                }
                warn!("team refresh failed, keeping previous queue: {}", err);
            }

            let Some(team) = self.next_unhandled(queue) else {
                self.observer
                    .publish_status("All teams have been processed.");
                // Interrupted teams get another run after the next refresh.
                self.deferred.clear();
                if self.config.poll_for_uploads && !once {
                    self.wait_for_refresh();
                    continue;
                }
                break;
            };

            match operator.confirm_start(&team) {
                OperatorChoice::Start => {}
                OperatorChoice::Skip => {
                    self.handled.insert(team);
                    continue;
                }
                OperatorChoice::Quit => break,
            }

            self.observer
                .publish_status(&format!("Selected Team: {}", team.team_name));
            let outcome = self.score_team(&team.team_name, self.config.session.clone())?;
            summary.runs += 1;
            if matches!(outcome.report.status, SessionStatus::Stopped(_)) {
                summary.interrupted.push(team.team_name.clone());
                self.deferred.insert(team);
            } else {
                self.handled.insert(team);
            }

            if let Some(score) = outcome.report.committed.clone() {
                if matches!(outcome.persistence, Persistence::Failed(_)) {
                    summary.persistence_failures += 1;
                }
                summary.scored.push(score);
            }

            if once {
                break;
            }
        }

        Ok(summary)
    }

    /// Unscored run before the first team so the camera and operator settle.
    pub fn warm_up(&mut self) -> anyhow::Result<()> {
        self.observer.publish_status("Warm-up run started.");
        let config = self.config.warm_up_session();
        let outcome = self
            .score_team(WARM_UP_TEAM, config)
            .context("warm-up run failed")?;
        if outcome.report.status == SessionStatus::Stopped(StopReason::FrameSourceLost) {
            return Err(anyhow!("warm-up run lost its frame source"));
        }
        Ok(())
    }

    /// Sleeps one refresh interval in short slices so shutdown stays responsive.
    fn wait_for_refresh(&self) {
        let deadline = Instant::now() + Duration::from_secs_f64(self.config.refresh_interval_secs);
        while !self.control.is_shutdown() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(POLL_SLICE));
        }
    }

    fn next_unhandled(&self, queue: &mut TeamQueue) -> Option<TeamEntry> {
        while let Some(team) = queue.next_team() {
            if !self.handled.contains(&team) && !self.deferred.contains(&team) {
                return Some(team);
            }
        }
        None
    }

    fn score_team(
        &mut self,
        team_name: &str,
        session_config: SessionConfig,
    ) -> anyhow::Result<RunOutcome> {
        self.run_index += 1;
        let mut feed = open_feed(&self.config.feed, self.config.roi, self.run_index)
            .with_context(|| format!("opening frame source for {}", team_name))?;

        let observer = self.observer;
        let result = self.runner.execute(
            team_name,
            session_config,
            feed.as_mut(),
            &mut |session| observer.on_frame(session),
        );

        let report = match result {
            Ok(report) => report,
            Err(RunError::FrameSource { report, source }) => {
                error!("run for {} aborted: {}", team_name, source);
                self.observer
                    .publish_status(&format!("Run for {} aborted: {}", team_name, source));
                self.record((*report).clone(), false, Some(source.to_string()));
                let outcome = RunOutcome {
                    report: *report,
                    persistence: Persistence::NotScored,
                };
                self.observer.on_finished(&outcome);
                return Ok(outcome);
            }
            Err(RunError::Session(SessionError::UnexpectedTermination(report))) => {
                let status = report.status;
                self.record(*report, false, Some("unexpected termination".into()));
                return Err(anyhow!(
                    "run for {} ended unexpectedly while {}",
                    team_name,
                    status
                ));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("running session for {}", team_name))
            }
        };

        let persistence = match &report.committed {
            None => Persistence::NotScored,
            Some(score) => {
                self.observer.publish_status(&format!(
                    "Exploration Score: {} - Time Score: {} - Final Score: {}",
                    score.exploration_score, score.time_score, score.final_score
                ));
                match self
                    .store
                    .record_hardware_score(&score.team_name, score.final_score)
                {
                    Ok(()) => Persistence::Recorded,
                    Err(err) => {
                        error!(
                            "could not record final score {} for {}: {}; resolve manually",
                            score.final_score, score.team_name, err
                        );
                        self.runner.metrics().record_error();
                        Persistence::Failed(err.to_string())
                    }
                }
            }
        };

        let error = match &persistence {
            Persistence::Failed(reason) => Some(reason.clone()),
            _ => None,
        };
        self.record(
            report.clone(),
            persistence == Persistence::Recorded,
            error,
        );

        let outcome = RunOutcome {
            report,
            persistence,
        };
        self.observer.on_finished(&outcome);
        Ok(outcome)
    }

    fn record(&self, report: SessionReport, persisted: bool, error: Option<String>) {
        let entry = LedgerEntry {
            report,
            persisted,
            error,
        };
        if let Err(err) = self.ledger.append(&entry) {
            error!(
                "could not append {} to ledger {}: {:#}",
                entry.report.team_name,
                self.ledger.path().display(),
                err
            );
        }
    }
}

//! Dashboard state, updated from progress events.
//!
//! Holds everything the renderer needs: client info for the header,
//! per-test progress, the live roster view, and the result snapshot
//! taken at each test completion.

use crate::probe::targets::SERVER_ROSTER;
use crate::progress::{ProgressEvent, TestKind};
use crate::results::{ResultStore, TargetStatus};
use crate::userinfo::ClientInfo;

/// Progress of one test kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestProgress {
    pub running: bool,
    /// Completed iterations (1-indexed after the first)
    pub current: usize,
    pub total: usize,
}

impl TestProgress {
    /// Whole-number progress percentage, 0 when nothing ran yet.
    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }

        (self.current * 100 / self.total) as u16
    }
}

/// Live view of one roster entry.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub name: &'static str,
    pub location: &'static str,
    pub status: TargetStatus,
    pub ping_ms: Option<f64>,
}

/// Everything the dashboard renders.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Header sidebar, absent when the lookup failed
    pub client: Option<ClientInfo>,
    /// Test currently running, if any
    pub active: Option<TestKind>,
    pub progress: [TestProgress; TestKind::COUNT],
    pub roster: Vec<RosterRow>,
    /// Snapshot taken at the latest test completion
    pub results: ResultStore,
    /// Last failure notification
    pub notice: Option<String>,
    /// The whole run is over; hold the final frame
    pub finished: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        let roster = SERVER_ROSTER
            .iter()
            .map(|target| RosterRow {
                name: target.name,
                location: target.location,
                status: TargetStatus::Untested,
                ping_ms: None,
            })
            .collect();

        DashboardState {
            client: None,
            active: None,
            progress: [TestProgress::default(); TestKind::COUNT],
            roster,
            results: ResultStore::new(),
            notice: None,
            finished: false,
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one progress event into the state.
    pub fn update_from_event(&mut self, event: &ProgressEvent) {
        match event {
            ProgressEvent::TestStarted { kind } => {
                self.active = Some(*kind);
                self.progress[kind.index()] =
                    TestProgress { running: true, current: 0, total: 0 };
            }
            ProgressEvent::Iteration { kind, current, total } => {
                let progress = &mut self.progress[kind.index()];
                progress.running = true;
                progress.current = *current;
                progress.total = *total;
            }
            ProgressEvent::TargetUpdate { index, status, ping_ms } => {
                if let Some(row) = self.roster.get_mut(*index) {
                    row.status = *status;
                    row.ping_ms = *ping_ms;
                }
            }
            ProgressEvent::TestCompleted { kind, results } => {
                self.progress[kind.index()].running = false;
                self.results = results.clone();
                if self.active == Some(*kind) {
                    self.active = None;
                }
            }
            ProgressEvent::TestFailed { kind, message } => {
                self.progress[kind.index()].running = false;
                self.notice = Some(message.clone());
                if self.active == Some(*kind) {
                    self.active = None;
                }
            }
        }
    }
}

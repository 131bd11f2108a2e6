//! Progress event types and callback interface.
//!
//! The session emits these events while tests run; the rendering layer
//! (TUI or plain console) consumes them. Implementations must be
//! non-blocking to avoid skewing probe timing.

use crate::results::{ResultStore, TargetStatus};

/// The test kinds a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestKind {
    Speed,
    Jitter,
    Packet,
    Servers,
    Dns,
    /// The composite run of all five, in fixed order
    Full,
}

impl TestKind {
    pub(crate) const COUNT: usize = 6;

    /// Lowercase label used in notifications and logs.
    pub fn label(&self) -> &'static str {
        match self {
            TestKind::Speed => "speed",
            TestKind::Jitter => "jitter",
            TestKind::Packet => "packet",
            TestKind::Servers => "server",
            TestKind::Dns => "dns",
            TestKind::Full => "full",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            TestKind::Speed => 0,
            TestKind::Jitter => 1,
            TestKind::Packet => 2,
            TestKind::Servers => 3,
            TestKind::Dns => 4,
            TestKind::Full => 5,
        }
    }
}

/// Progress events emitted during test execution.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A test entered its running state; progress starts at 0%.
    TestStarted { kind: TestKind },
    /// One probe iteration finished (1-indexed).
    Iteration { kind: TestKind, current: usize, total: usize },
    /// A roster target changed state during the server test.
    TargetUpdate {
        /// Roster index
        index: usize,
        status: TargetStatus,
        ping_ms: Option<f64>,
    },
    /// A test finished and its result was recorded; `results` is the
    /// store snapshot after the write.
    TestCompleted { kind: TestKind, results: ResultStore },
    /// Orchestration-level failure notification naming the failed test.
    TestFailed { kind: TestKind, message: String },
}

/// Callback interface for progress updates.
pub trait ProgressCallback: Send + Sync {
    /// Called when a progress event occurs.
    fn on_progress(&self, event: ProgressEvent);
}

/// Callback that discards every event, for silent runs.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn on_progress(&self, _event: ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels_are_lowercase() {
        assert_eq!(TestKind::Speed.label(), "speed");
        assert_eq!(TestKind::Servers.label(), "server");
        assert_eq!(TestKind::Full.label(), "full");
    }

    #[test]
    fn test_kind_indices_are_distinct() {
        let kinds = [
            TestKind::Speed,
            TestKind::Jitter,
            TestKind::Packet,
            TestKind::Servers,
            TestKind::Dns,
            TestKind::Full,
        ];
        for (position, kind) in kinds.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }
}

//! Error types for the diagnostics tool.
//!
//! Probe-level failures never reach this module; they are absorbed by the
//! collector's simulated fallback. What remains are orchestration-level
//! failures, rejected re-entrant runs, and I/O around report export.

use crate::progress::TestKind;
use std::error::Error;
use std::fmt;

/// Exit codes for the application.
pub mod exit_codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// A test run failed at the orchestration level.
    pub const TEST_FAILURE: i32 = 1;
    /// Invalid configuration or probe target.
    pub const CONFIG_ERROR: i32 = 2;
    /// Failed to write the export artifact or drive the terminal.
    pub const IO_ERROR: i32 = 3;
    /// A test was triggered while already running.
    pub const BUSY: i32 = 4;
}

/// Categories of errors a run can end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A test run failed outside the probe loop.
    Orchestration,
    /// Re-entrant invocation of a test that is already running.
    Busy,
    /// A probe target that cannot be turned into a URL.
    InvalidTarget,
    /// Filesystem or terminal I/O.
    Io,
}

impl ErrorKind {
    /// Get the exit code for this error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Orchestration => exit_codes::TEST_FAILURE,
            ErrorKind::Busy => exit_codes::BUSY,
            ErrorKind::InvalidTarget => exit_codes::CONFIG_ERROR,
            ErrorKind::Io => exit_codes::IO_ERROR,
        }
    }

    /// Get a user-facing description of this error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Orchestration => "Test failure",
            ErrorKind::Busy => "Test already running",
            ErrorKind::InvalidTarget => "Invalid probe target",
            ErrorKind::Io => "I/O error",
        }
    }
}

/// The error type carried out of a test session or the CLI layer.
#[derive(Debug)]
pub struct NetTestError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// User-facing message.
    pub message: String,
    /// The underlying error, if any.
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl NetTestError {
    /// Create a new NetTestError.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    /// Add the underlying error source.
    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    /// A test was triggered while an instance of it is still running.
    pub fn busy(kind: TestKind) -> Self {
        Self::new(
            ErrorKind::Busy,
            format!("the {} test is already running", kind.label()),
        )
    }

    /// A probe target that cannot be promoted to a URL.
    pub fn invalid_target(
        host: &str,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            ErrorKind::InvalidTarget,
            format!("cannot probe target {:?}", host),
        )
        .with_source(source)
    }

    /// An orchestration-level failure, named after the test that failed.
    pub fn orchestration(kind: TestKind, message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Orchestration,
            format!("{} test failed: {}", kind.label(), message.into()),
        )
    }

    /// A filesystem or terminal failure.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, message).with_source(source)
    }
}

impl fmt::Display for NetTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)
    }
}

impl Error for NetTestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

//! Output mode selection.

/// How results and progress are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Live dashboard with progress gauges and the final report
    Tui,
    /// Line-oriented console output, one line per completed step
    Plain,
    /// Machine-readable snapshot on stdout, nothing else
    Json,
}

impl OutputMode {
    /// Pick the output mode from the `--json` flag and whether stdout is
    /// an interactive terminal. JSON always wins; pipes get plain lines.
    pub fn detect(json_flag: bool, is_tty: bool) -> Self {
        if json_flag {
            OutputMode::Json
        } else if is_tty {
            OutputMode::Tui
        } else {
            OutputMode::Plain
        }
    }
}

//! Dashboard lifecycle: terminal setup, rendering, teardown.
//!
//! The controller owns the terminal and a shared dashboard state. The
//! session writes into that state through the progress callback while
//! the driving loop renders on a fixed cadence.

use std::io::{self, Stdout};
use std::sync::{Arc, Mutex};

use crossterm::{
    cursor, execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::renderer::render_frame;
use super::state::DashboardState;
use crate::progress::{ProgressCallback, ProgressEvent};
use crate::userinfo::ClientInfo;

/// Controller for the live dashboard.
pub struct TuiController {
    state: Arc<Mutex<DashboardState>>,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    initialized: bool,
}

impl TuiController {
    pub fn new() -> Self {
        TuiController {
            state: Arc::new(Mutex::new(DashboardState::new())),
            terminal: None,
            initialized: false,
        }
    }

    /// Show the client lookup result in the header.
    pub fn set_client_info(&mut self, client: ClientInfo) {
        if let Ok(mut state) = self.state.lock() {
            state.client = Some(client);
        }
    }

    /// Enter the alternate screen and take over the terminal.
    pub fn init(&mut self) -> io::Result<()> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let backend = CrosstermBackend::new(stdout);
        self.terminal = Some(Terminal::new(backend)?);
        self.initialized = true;

        Ok(())
    }

    /// Restore the terminal. Safe to call more than once.
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }

        if let Some(terminal) = self.terminal.as_mut() {
            execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
        }
        disable_raw_mode()?;

        self.initialized = false;
        self.terminal = None;

        Ok(())
    }

    /// Draw the current state.
    pub fn render(&mut self) -> io::Result<()> {
        let Some(terminal) = self.terminal.as_mut() else {
            return Ok(());
        };

        // Clone out of the lock so the callback is never blocked by a
        // draw in progress.
        let state = match self.state.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return Ok(()),
        };

        terminal.draw(|frame| render_frame(frame, &state))?;

        Ok(())
    }

    /// Freeze the dashboard on its final frame.
    pub fn mark_finished(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.finished = true;
            state.active = None;
        }
    }

    /// The callback handed to the session; updates are non-blocking.
    pub fn progress_callback(&self) -> Arc<dyn ProgressCallback> {
        Arc::new(DashboardCallback { state: Arc::clone(&self.state) })
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Arc<Mutex<DashboardState>> {
        Arc::clone(&self.state)
    }
}

impl Default for TuiController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TuiController {
    /// Restore the terminal even when the run ends through an error path.
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Feeds progress events into the shared dashboard state.
struct DashboardCallback {
    state: Arc<Mutex<DashboardState>>,
}

impl ProgressCallback for DashboardCallback {
    fn on_progress(&self, event: ProgressEvent) {
        // Skip an update rather than block a probe in flight.
        if let Ok(mut state) = self.state.try_lock() {
            state.update_from_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::TestKind;
    use crate::results::ResultStore;

    #[test]
    fn test_callback_updates_the_shared_state() {
        let controller = TuiController::new();
        let callback = controller.progress_callback();

        callback.on_progress(ProgressEvent::TestStarted {
            kind: TestKind::Speed,
        });

        let state = controller.state();
        let state = state.lock().unwrap();
        assert_eq!(state.active, Some(TestKind::Speed));
    }

    #[test]
    fn test_completion_snapshot_reaches_the_state() {
        let controller = TuiController::new();
        let callback = controller.progress_callback();

        callback.on_progress(ProgressEvent::TestCompleted {
            kind: TestKind::Speed,
            results: ResultStore::new(),
        });

        let state = controller.state();
        assert!(!state.lock().unwrap().progress[TestKind::Speed.index()].running);
    }

    #[test]
    fn test_mark_finished_freezes_the_dashboard() {
        let mut controller = TuiController::new();
        controller.mark_finished();

        let state = controller.state();
        assert!(state.lock().unwrap().finished);
    }

    #[test]
    fn test_cleanup_is_a_noop_before_init() {
        let mut controller = TuiController::new();
        assert!(controller.cleanup().is_ok());
        assert!(controller.render().is_ok());
    }
}

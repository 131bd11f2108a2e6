//! Live terminal dashboard for test runs.
//!
//! The session emits progress events; the controller feeds them into a
//! shared dashboard state which the renderer draws on a fixed cadence.

pub(crate) mod controller;
pub(crate) mod display_mode;
pub(crate) mod renderer;
pub(crate) mod state;

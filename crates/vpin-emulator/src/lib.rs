//! Visual Pinball session management for the VPin launcher
//!
//! Launches the emulator for one table at a time, waits for it to exit and
//! reports how the session ended.

mod launcher;
mod worker;

pub use launcher::{SessionLauncher, resolve_executable};
pub use worker::{SessionHandle, SessionWorker};

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Flag asking Visual Pinball to start the given table immediately
pub const PLAY_FLAG: &str = "-play";

/// Printed by Visual Pinball on stdout when the player quits the table
pub const PLAYER_CLOSED_MARKER: &str = "Player closed.";

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("Table not found: {0}")]
    TableNotFound(PathBuf),

    #[error("Launch failed: {0}")]
    LaunchFailed(String),

    #[error("A session is already running")]
    SessionBusy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifecycle of the single emulator session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum SessionState {
    #[default]
    Idle,
    Launching,
    Running,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Launching => "launching",
            SessionState::Running => "running",
        };
        f.write_str(name)
    }
}

/// How a session ended. Exactly one is produced per launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionOutcome {
    /// Emulator exited without the player-closed marker
    NormalExit,
    /// Player quit the table from inside the emulator
    ClosedByPlayer,
    /// Stopped through [`SessionHandle::cancel`]
    Cancelled,
    /// Emulator could not be started or waited on
    Failed(String),
}

impl SessionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SessionOutcome::Failed(_))
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::NormalExit => write!(f, "Emulator exited"),
            SessionOutcome::ClosedByPlayer => write!(f, "Table closed by player"),
            SessionOutcome::Cancelled => write!(f, "Session cancelled"),
            SessionOutcome::Failed(reason) => write!(f, "Session failed: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            SessionOutcome::ClosedByPlayer.to_string(),
            "Table closed by player"
        );
        assert!(
            SessionOutcome::Failed("no such file".into())
                .to_string()
                .contains("no such file")
        );
    }

    #[test]
    fn test_outcome_is_failure() {
        assert!(SessionOutcome::Failed(String::new()).is_failure());
        assert!(!SessionOutcome::NormalExit.is_failure());
        assert!(!SessionOutcome::Cancelled.is_failure());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            EmulatorError::SessionBusy.to_string(),
            "A session is already running"
        );
    }
}

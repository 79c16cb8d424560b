//! Blocking session launcher

use crate::{EmulatorError, PLAY_FLAG, PLAYER_CLOSED_MARKER, SessionOutcome, SessionState};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};

/// Runs Visual Pinball sessions, one at a time
#[derive(Debug, Clone, Default)]
pub struct SessionLauncher {
    state: Arc<Mutex<SessionState>>,
}

impl SessionLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_idle(&self) -> bool {
        self.state() == SessionState::Idle
    }

    /// Claim the session slot. The returned guard resets it to idle on drop.
    pub(crate) fn begin(&self) -> Result<SessionGuard, EmulatorError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != SessionState::Idle {
            return Err(EmulatorError::SessionBusy);
        }
        *state = SessionState::Launching;

        Ok(SessionGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Play a table and block until the emulator exits
    pub fn launch(&self, executable: &Path, table: &Path) -> SessionOutcome {
        let guard = match self.begin() {
            Ok(guard) => guard,
            Err(e) => return SessionOutcome::Failed(e.to_string()),
        };

        let mut cmd = match play_command(executable, table) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::error!("Cannot launch {}: {}", table.display(), e);
                return SessionOutcome::Failed(e.to_string());
            }
        };

        tracing::info!(
            "Launching {} with {}",
            table.display(),
            executable.display()
        );

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = EmulatorError::LaunchFailed(format!(
                    "Failed to spawn {}: {}",
                    executable.display(),
                    e
                ));
                tracing::error!("{}", err);
                return SessionOutcome::Failed(err.to_string());
            }
        };

        guard.set(SessionState::Running);
        tracing::debug!("Emulator running with PID {}", child.id());

        let outcome = match child.wait_with_output() {
            Ok(output) => classify(output.status, &output.stdout),
            Err(e) => SessionOutcome::Failed(format!("Failed to wait for emulator: {}", e)),
        };

        tracing::info!("{}: {}", table.display(), outcome);
        outcome
    }
}

/// Resets the session state to idle when dropped
#[derive(Debug)]
pub(crate) struct SessionGuard {
    state: Arc<Mutex<SessionState>>,
}

impl SessionGuard {
    pub(crate) fn set(&self, next: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.set(SessionState::Idle);
    }
}

/// Build `<executable> -play <absolute table path>` with stdout captured
pub(crate) fn play_command(executable: &Path, table: &Path) -> Result<Command, EmulatorError> {
    if !table.is_file() {
        return Err(EmulatorError::TableNotFound(table.to_path_buf()));
    }
    let table = std::path::absolute(table)?;

    let mut cmd = Command::new(executable);
    cmd.arg(PLAY_FLAG).arg(&table);

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::null());

    Ok(cmd)
}

/// Classify a finished emulator process from its exit status and stdout
pub(crate) fn classify(status: ExitStatus, stdout: &[u8]) -> SessionOutcome {
    if !status.success() {
        return SessionOutcome::Failed(format!("emulator exited with {}", status));
    }

    if String::from_utf8_lossy(stdout).contains(PLAYER_CLOSED_MARKER) {
        SessionOutcome::ClosedByPlayer
    } else {
        SessionOutcome::NormalExit
    }
}

/// Look a bare program name up on `PATH`. Paths with a directory part, and
/// names that cannot be found, are returned unchanged.
pub fn resolve_executable(executable: &Path) -> PathBuf {
    if executable.components().count() != 1 || executable.is_absolute() {
        return executable.to_path_buf();
    }

    match which::which(executable) {
        Ok(path) => {
            tracing::debug!("Resolved {} to {}", executable.display(), path.display());
            path
        }
        Err(e) => {
            tracing::debug!("{} not found on PATH: {}", executable.display(), e);
            executable.to_path_buf()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_single_flight() {
        let launcher = SessionLauncher::new();
        assert!(launcher.is_idle());

        let guard = launcher.begin().unwrap();
        assert_eq!(launcher.state(), SessionState::Launching);
        assert!(matches!(launcher.begin(), Err(EmulatorError::SessionBusy)));

        guard.set(SessionState::Running);
        assert_eq!(launcher.state(), SessionState::Running);

        drop(guard);
        assert!(launcher.is_idle());
    }

    #[test]
    fn test_launch_while_busy() {
        let launcher = SessionLauncher::new();
        let _guard = launcher.begin().unwrap();

        let outcome = launcher.launch(Path::new("/usr/bin/true"), Path::new("/tables/a.vpx"));
        assert_eq!(
            outcome,
            SessionOutcome::Failed("A session is already running".into())
        );
    }

    #[test]
    fn test_launch_missing_table() {
        let launcher = SessionLauncher::new();
        let outcome = launcher.launch(
            Path::new("VPinballX_GL"),
            Path::new("/nonexistent/tables/Viper.vpx"),
        );
        assert!(outcome.is_failure());
        assert!(launcher.is_idle());
    }

    #[test]
    fn test_play_command_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("Viper.vpx");
        std::fs::write(&table, b"FAKE_VPX_DATA").unwrap();

        let cmd = play_command(Path::new("VPinballX_GL"), &table).unwrap();
        let args: Vec<_> = cmd.get_args().collect();

        assert_eq!(cmd.get_program(), "VPinballX_GL");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], PLAY_FLAG);
        assert_eq!(Path::new(args[1]), table.as_path());
    }

    #[test]
    fn test_resolve_executable_keeps_paths() {
        let path = Path::new("/opt/vpinball/VPinballX_GL");
        assert_eq!(resolve_executable(path), path);

        let relative = Path::new("bin/VPinballX_GL");
        assert_eq!(resolve_executable(relative), relative);
    }

    #[test]
    fn test_resolve_executable_unknown_name() {
        let name = Path::new("vpin-definitely-not-installed");
        assert_eq!(resolve_executable(name), name);
    }

    #[cfg(unix)]
    #[test]
    fn test_classify() {
        use std::os::unix::process::ExitStatusExt;

        let ok = ExitStatus::from_raw(0);
        assert_eq!(
            classify(ok, b"Loading...\nPlayer closed.\n"),
            SessionOutcome::ClosedByPlayer
        );
        assert_eq!(classify(ok, b"Loading...\n"), SessionOutcome::NormalExit);
        assert_eq!(classify(ok, b""), SessionOutcome::NormalExit);

        // Exit code 1 is encoded in the high byte of the raw wait status
        let failed = ExitStatus::from_raw(1 << 8);
        assert!(classify(failed, b"Player closed.\n").is_failure());
    }
}

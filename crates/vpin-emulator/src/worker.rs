//! Background session worker
//!
//! Runs the emulator on a tokio runtime so the caller keeps responding while
//! a table is played. The outcome comes back through a [`SessionHandle`].

use crate::launcher::{SessionGuard, classify, play_command};
use crate::{EmulatorError, SessionLauncher, SessionOutcome, SessionState};
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Spawns emulator sessions onto a tokio runtime
#[derive(Debug, Clone)]
pub struct SessionWorker {
    launcher: SessionLauncher,
    runtime: Handle,
}

impl SessionWorker {
    pub fn new(runtime: Handle) -> Self {
        Self::with_launcher(SessionLauncher::new(), runtime)
    }

    /// Share the session slot with an existing launcher
    pub fn with_launcher(launcher: SessionLauncher, runtime: Handle) -> Self {
        Self { launcher, runtime }
    }

    pub fn launcher(&self) -> &SessionLauncher {
        &self.launcher
    }

    pub fn state(&self) -> SessionState {
        self.launcher.state()
    }

    /// Start a session for `table`.
    ///
    /// Fails with [`EmulatorError::SessionBusy`] while another session is
    /// active; requests are never queued.
    pub fn submit(&self, executable: &Path, table: &Path) -> Result<SessionHandle, EmulatorError> {
        let guard = self.launcher.begin()?;
        let command = play_command(executable, table)?;

        tracing::info!(
            "Launching {} with {}",
            table.display(),
            executable.display()
        );

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let label = table.display().to_string();

        self.runtime.spawn(async move {
            let outcome = run_session(command, guard, cancel_rx).await;
            tracing::info!("{}: {}", label, outcome);
            let _ = outcome_tx.send(outcome);
        });

        Ok(SessionHandle {
            table: table.to_path_buf(),
            outcome: Some(outcome_rx),
            cancel: Some(cancel_tx),
        })
    }
}

async fn run_session(
    command: std::process::Command,
    guard: SessionGuard,
    cancel: oneshot::Receiver<()>,
) -> SessionOutcome {
    let mut command = tokio::process::Command::from(command);
    command.kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            let err = EmulatorError::LaunchFailed(format!("Failed to spawn emulator: {}", e));
            tracing::error!("{}", err);
            return SessionOutcome::Failed(err.to_string());
        }
    };

    guard.set(SessionState::Running);
    if let Some(pid) = child.id() {
        tracing::debug!("Emulator running with PID {}", pid);
    }

    // Dropping the output future kills the child
    tokio::select! {
        output = child.wait_with_output() => match output {
            Ok(output) => classify(output.status, &output.stdout),
            Err(e) => SessionOutcome::Failed(format!("Failed to wait for emulator: {}", e)),
        },
        Ok(()) = cancel => {
            tracing::info!("Cancelling emulator session");
            SessionOutcome::Cancelled
        }
    }
}

/// Result channel and cancellation signal of one session
#[derive(Debug)]
pub struct SessionHandle {
    table: PathBuf,
    outcome: Option<oneshot::Receiver<SessionOutcome>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl SessionHandle {
    /// Table being played
    pub fn table(&self) -> &Path {
        &self.table
    }

    /// Ask the worker to stop the emulator. Has no effect once the session
    /// has ended.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Whether the outcome has already been taken
    pub fn is_finished(&self) -> bool {
        self.outcome.is_none()
    }

    /// Outcome of the session if it has finished. Returns `Some` at most
    /// once.
    pub fn try_outcome(&mut self) -> Option<SessionOutcome> {
        let receiver = self.outcome.as_mut()?;
        let outcome = match receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => lost_outcome(),
        };

        self.outcome = None;
        self.cancel = None;
        Some(outcome)
    }

    /// Wait for the session to finish
    pub async fn outcome(self) -> SessionOutcome {
        match self.outcome {
            Some(receiver) => receiver.await.unwrap_or_else(|_| lost_outcome()),
            None => SessionOutcome::Failed("outcome already taken".into()),
        }
    }
}

fn lost_outcome() -> SessionOutcome {
    SessionOutcome::Failed("session task ended without an outcome".into())
}

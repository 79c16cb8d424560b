//! Session controller
//!
//! Single owner of the table list, the current selection and the running
//! session. The UI talks to it through selection and play events only.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{info, warn};

use vpin_config::LauncherConfig;
use vpin_emulator::{
    EmulatorError, SessionHandle, SessionOutcome, SessionState, SessionWorker, resolve_executable,
};
use vpin_library::{LibraryError, Snapshot, SnapshotLibrary, TableCatalog, TableDescriptor};
use vpin_scores::{
    NvramStore, ScoreResult, ScoreRetriever, ScoreStoreMapping, TitleToStoreResolver,
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("No table selected")]
    NoSelection,

    #[error("No table at index {index} ({len} tables)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Not allowed while a session is running")]
    SessionActive,

    #[error("Emulator error: {0}")]
    Emulator(#[from] EmulatorError),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),
}

/// Everything shown for a newly selected table
#[derive(Debug)]
pub struct Selection {
    pub table: TableDescriptor,
    pub snapshot: Result<Snapshot, LibraryError>,
    pub score: ScoreResult,
}

/// One row of `--list` output
#[derive(Debug, Serialize)]
pub struct TableEntry {
    pub file: String,
    pub title: String,
    pub key: String,
    pub score: ScoreResult,
}

pub struct SessionController {
    tables_dir: PathBuf,
    executable: PathBuf,
    popup_image_errors: bool,
    catalog: TableCatalog,
    snapshots: SnapshotLibrary,
    retriever: ScoreRetriever,
    worker: SessionWorker,
    tables: Vec<TableDescriptor>,
    current: Option<TableDescriptor>,
    session: Option<SessionHandle>,
}

impl SessionController {
    pub fn new(config: &LauncherConfig, runtime: Handle) -> Self {
        let resolver = TitleToStoreResolver::new(ScoreStoreMapping::from_config(&config.scores));
        let store = Arc::new(NvramStore::from_config(config));

        Self {
            tables_dir: config.paths.tables_dir.clone(),
            executable: resolve_executable(&config.paths.emulator),
            popup_image_errors: config.ui.popup_image_errors,
            catalog: TableCatalog::new(),
            snapshots: SnapshotLibrary::from_config(config),
            retriever: ScoreRetriever::new(resolver, store),
            worker: SessionWorker::new(runtime),
            tables: Vec::new(),
            current: None,
            session: None,
        }
    }

    /// Rebuild the table list from the tables directory.
    ///
    /// The list is replaced wholesale; on error it is left empty and the
    /// selection is cleared. Otherwise the current selection survives if its
    /// file is still present. Rejected while a session is running.
    pub fn rescan(&mut self) -> Result<usize, ControllerError> {
        if self.is_session_active() {
            return Err(ControllerError::SessionActive);
        }

        self.tables = match self.catalog.scan(&self.tables_dir) {
            Ok(tables) => tables,
            Err(e) => {
                self.tables.clear();
                self.current = None;
                return Err(e.into());
            }
        };

        if self
            .current
            .as_ref()
            .is_some_and(|current| !self.tables.contains(current))
        {
            self.current = None;
        }

        info!("{} tables in {}", self.tables.len(), self.tables_dir.display());
        Ok(self.tables.len())
    }

    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Titles in list order
    pub fn titles(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.display_title()).collect()
    }

    pub fn tables_dir(&self) -> &Path {
        &self.tables_dir
    }

    /// Currently selected table
    pub fn current(&self) -> Option<&TableDescriptor> {
        self.current.as_ref()
    }

    /// Whether snapshot errors should be shown to the user or only logged
    pub fn popup_image_errors(&self) -> bool {
        self.popup_image_errors
    }

    pub fn set_popup_image_errors(&mut self, enabled: bool) {
        self.popup_image_errors = enabled;
    }

    /// Select the table at `index` and look up its snapshot and high score.
    ///
    /// Rejected while a session is running, so the table being played is
    /// always the one shown as current.
    pub fn select(&mut self, index: usize) -> Result<Selection, ControllerError> {
        if self.is_session_active() {
            return Err(ControllerError::SessionActive);
        }

        let table = self
            .tables
            .get(index)
            .cloned()
            .ok_or(ControllerError::IndexOutOfRange {
                index,
                len: self.tables.len(),
            })?;

        let snapshot = self.snapshots.load(&table);
        if let Err(e) = &snapshot {
            warn!("No snapshot for {}: {}", table.display_title(), e);
        }
        let score = self.retriever.fetch(table.display_title());

        self.current = Some(table.clone());

        Ok(Selection {
            table,
            snapshot,
            score,
        })
    }

    /// Start a session for the current table
    pub fn play(&mut self) -> Result<&TableDescriptor, ControllerError> {
        if self.session.is_some() {
            return Err(EmulatorError::SessionBusy.into());
        }
        let table = self.current.as_ref().ok_or(ControllerError::NoSelection)?;

        let path = table.path_in(&self.tables_dir);
        let handle = self.worker.submit(&self.executable, &path)?;
        self.session = Some(handle);

        Ok(table)
    }

    /// A session is running or its outcome has not been collected yet
    pub fn is_session_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_state(&self) -> SessionState {
        self.worker.state()
    }

    /// Collect the outcome of a finished session, returning to idle
    pub fn poll_session(&mut self) -> Option<SessionOutcome> {
        let outcome = self.session.as_mut()?.try_outcome()?;
        self.session = None;
        Some(outcome)
    }

    /// Ask the running session to stop. The outcome still arrives through
    /// [`poll_session`](Self::poll_session).
    pub fn cancel_session(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// Catalog rows with their high scores
    pub fn entries(&self) -> Vec<TableEntry> {
        self.tables
            .iter()
            .map(|table| TableEntry {
                file: table.raw_file_name().to_string(),
                title: table.display_title().to_string(),
                key: table.normalized_key().to_string(),
                score: self.retriever.fetch(table.display_title()),
            })
            .collect()
    }
}

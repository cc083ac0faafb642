//! In-memory state of the open workspace.
//!
//! [`WorkspaceState`] lives behind a `std::sync::Mutex` inside
//! [`crate::workspace::Workspace`]. The lock is only ever held for short,
//! synchronous reads and writes; store calls run with it released.

use mindmap_shared::{Document, Project};
use serde::Serialize;

use crate::auth::AuthState;
use crate::session::Session;

/// Progress of the explicit save action, as shown on the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Idle => "Save",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Error => "Save failed",
        }
    }
}

/// Everything the workspace knows about the current user session.
pub struct WorkspaceState {
    pub auth: AuthState,

    /// Validated passphrase. `Some` exactly when `auth` is `LoggedIn`.
    pub session: Option<Session>,

    /// Project metadata, most recently saved first.
    pub projects: Vec<Project>,

    pub current_project_id: Option<String>,

    /// Graph of the open project. Empty when nothing is open.
    pub document: Document,

    pub selected_node_id: Option<String>,

    pub save_status: SaveStatus,

    /// Bumped on every load request; a finished load applies only if it is
    /// still the latest.
    pub load_generation: u64,

    /// Generation of the last load that finished, applied or failed.
    /// Lags `load_generation` while a switch is in flight.
    pub loaded_generation: u64,

    /// Bumped on every save; the `Saved -> Idle` revert checks it.
    pub save_generation: u64,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self {
            auth: AuthState::LoggedOut,
            session: None,
            projects: Vec::new(),
            current_project_id: None,
            document: Document::empty(),
            selected_node_id: None,
            save_status: SaveStatus::Idle,
            load_generation: 0,
            loaded_generation: 0,
            save_generation: 0,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth == AuthState::LoggedIn && self.session.is_some()
    }

    /// Passphrase of the validated session, if any.
    pub fn passphrase(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.passphrase().to_string())
    }

    /// A project switch has started and its document is not in yet.
    pub fn is_loading(&self) -> bool {
        self.loaded_generation != self.load_generation
    }

    /// Forget the open project and its graph.
    pub fn clear_selection(&mut self) {
        self.current_project_id = None;
        self.document = Document::empty();
        self.selected_node_id = None;
        self.load_generation += 1;
        self.loaded_generation = self.load_generation;
    }
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self::new()
    }
}

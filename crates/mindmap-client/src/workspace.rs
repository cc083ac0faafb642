//! The document lifecycle controller.
//!
//! A [`Workspace`] ties the pieces together: it gates every store call on a
//! validated passphrase, keeps the project list and the open document in
//! memory, and drives the explicit save action with its status indicator.
//! Clones share the same state.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use mindmap_shared::changes::{self, Connection, EdgeChange, NodeChange};
use mindmap_shared::constants::{
    DEFAULT_PROJECT_ID, NEW_NODE_ORIGIN, NEW_NODE_SPAN, NODE_TYPE_MINDMAP, SAVED_DISPLAY_MILLIS,
};
use mindmap_shared::ids::NodeIdGenerator;
use mindmap_shared::{Document, Node, NodeDataPatch, Position, Project};
use mindmap_store::ProjectStore;
use rand::Rng;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthState, Authenticator};
use crate::config::{Backend, ClientConfig};
use crate::error::{ClientError, Result};
use crate::events::{
    AppEvent, AuthFailedPayload, DocumentPayload, EventBus, LoadFailedPayload, ProjectsPayload,
};
use crate::slot::{FileSlot, SessionSlot};
use crate::state::{SaveStatus, WorkspaceState};

#[derive(Clone)]
pub struct Workspace {
    inner: Arc<Inner>,
}

struct Inner {
    store: ProjectStore,
    auth: Authenticator,
    state: Mutex<WorkspaceState>,
    events: EventBus,
    node_ids: NodeIdGenerator,
    saved_display: Duration,
}

impl Workspace {
    pub fn new(
        store: ProjectStore,
        slot: Arc<dyn SessionSlot>,
        session_ttl: chrono::Duration,
    ) -> Self {
        let auth = Authenticator::new(store.clone(), slot, session_ttl);
        Self {
            inner: Arc::new(Inner {
                store,
                auth,
                state: Mutex::new(WorkspaceState::new()),
                events: EventBus::new(),
                node_ids: NodeIdGenerator::new(),
                saved_display: Duration::from_millis(SAVED_DISPLAY_MILLIS),
            }),
        }
    }

    /// Open the configured backend and session slot, then try to log back in
    /// with a cached passphrase.
    pub async fn bootstrap(config: &ClientConfig) -> anyhow::Result<Self> {
        let table = config.open_table().context("failed to open the project table")?;
        let store = ProjectStore::new(table);

        if matches!(config.backend, Backend::Sqlite { .. }) {
            store
                .ensure_default_project()
                .await
                .context("failed to provision the default project")?;
        }

        let slot = match &config.data_dir {
            Some(dir) => FileSlot::new(dir),
            None => FileSlot::default_location()?,
        };
        info!(slot_dir = %slot.dir().display(), "session slot ready");

        let workspace = Self::new(store, Arc::new(slot), config.session_ttl);
        if workspace.restore_session().await? {
            info!("restored cached session");
        }
        Ok(workspace)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.inner.events.subscribe()
    }

    fn lock(&self) -> Result<MutexGuard<'_, WorkspaceState>> {
        self.inner.state.lock().map_err(|_| ClientError::LockPoisoned)
    }

    fn emit(&self, event: AppEvent) {
        self.inner.events.emit(event);
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Validate the passphrase cached by a previous run, if it is still
    /// fresh. `Ok(true)` when that logged the user in.
    pub async fn restore_session(&self) -> Result<bool> {
        let Some(cached) = self.inner.auth.cached_session() else {
            debug!("no cached session");
            return Ok(false);
        };

        match self.submit_passphrase(cached.passphrase()).await {
            Ok(()) => Ok(true),
            Err(ClientError::Auth(e)) => {
                info!(error = %e, "cached passphrase no longer opens the default project");
                if e == AuthError::WrongPassphrase {
                    self.inner.auth.forget_cached();
                }
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Check `candidate` against the `default` project and log in with it.
    pub async fn submit_passphrase(&self, candidate: &str) -> Result<()> {
        {
            let mut state = self.lock()?;
            match state.auth {
                AuthState::Validating => return Err(AuthError::InProgress.into()),
                AuthState::LoggedIn => {
                    debug!("already logged in, ignoring passphrase");
                    return Ok(());
                }
                AuthState::LoggedOut => {}
            }
            state.auth = AuthState::Validating;
        }
        self.emit(AppEvent::AuthStateChanged(AuthState::Validating));

        let outcome = self.inner.auth.validate(candidate).await;

        {
            let mut state = self.lock()?;
            match &outcome {
                Ok(session) => {
                    state.auth = AuthState::LoggedIn;
                    state.session = Some(session.clone());
                }
                Err(_) => {
                    state.auth = AuthState::LoggedOut;
                    state.session = None;
                }
            }
        }

        match outcome {
            Ok(_) => {
                self.emit(AppEvent::AuthStateChanged(AuthState::LoggedIn));
                self.refresh_projects().await?;
                Ok(())
            }
            Err(e) => {
                self.emit(AppEvent::AuthStateChanged(AuthState::LoggedOut));
                self.emit(AppEvent::AuthFailed(AuthFailedPayload {
                    message: e.to_string(),
                }));
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn auth_state(&self) -> Result<AuthState> {
        Ok(self.lock()?.auth)
    }

    pub fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.lock()?.projects.clone())
    }

    pub fn current_project_id(&self) -> Result<Option<String>> {
        Ok(self.lock()?.current_project_id.clone())
    }

    pub fn document(&self) -> Result<Document> {
        Ok(self.lock()?.document.clone())
    }

    pub fn save_status(&self) -> Result<SaveStatus> {
        Ok(self.lock()?.save_status)
    }

    /// The node open in the editor panel, as it currently is.
    pub fn selected_node(&self) -> Result<Option<Node>> {
        let state = self.lock()?;
        Ok(state
            .selected_node_id
            .as_deref()
            .and_then(|id| state.document.node(id))
            .cloned())
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Reload the project list. When nothing is open yet, opens `default`
    /// if it is listed, otherwise the most recent project.
    pub async fn refresh_projects(&self) -> Result<Vec<Project>> {
        let projects = self.fetch_projects().await?;

        let pick = {
            let state = self.lock()?;
            if state.current_project_id.is_some() {
                None
            } else {
                projects
                    .iter()
                    .find(|p| p.id == DEFAULT_PROJECT_ID)
                    .or_else(|| projects.first())
                    .map(|p| p.id.clone())
            }
        };
        if let Some(id) = pick {
            self.open_project(&id).await?;
        }
        Ok(projects)
    }

    /// Switch to another project and load its document.
    ///
    /// Returns `Ok(false)` without changing anything while a save is in
    /// flight or when `id` is not a known project. Selecting the project
    /// that is already open keeps its unsaved edits.
    pub async fn select_project(&self, id: &str) -> Result<bool> {
        {
            let state = self.lock()?;
            if !state.is_logged_in() {
                return Err(ClientError::NotAuthenticated);
            }
            if state.save_status == SaveStatus::Saving {
                debug!(project_id = %id, "switch ignored while saving");
                return Ok(false);
            }
            if !state.projects.iter().any(|p| p.id == id) {
                warn!(project_id = %id, "switch to unknown project ignored");
                return Ok(false);
            }
            if state.current_project_id.as_deref() == Some(id) {
                debug!(project_id = %id, "project already open");
                return Ok(true);
            }
        }
        self.open_project(id).await?;
        Ok(true)
    }

    /// Create a project and open it.
    pub async fn create_project(&self, name: &str) -> Result<Option<Project>> {
        self.ensure_logged_in()?;

        let Some(project) = self.inner.store.create_project(name).await else {
            return Ok(None);
        };

        self.fetch_projects().await?;
        {
            let mut state = self.lock()?;
            if !state.projects.iter().any(|p| p.id == project.id) {
                state.projects.insert(0, project.clone());
            }
        }
        self.open_project(&project.id).await?;
        Ok(Some(project))
    }

    /// Delete a project. Unsaved edits to it are lost.
    ///
    /// If it was open, the first remaining project is opened instead, or the
    /// selection is cleared when none is left.
    pub async fn delete_project(&self, id: &str) -> Result<bool> {
        self.ensure_logged_in()?;
        if id == DEFAULT_PROJECT_ID {
            warn!("deleting the default project, later logins cannot verify a passphrase");
        }

        if !self.inner.store.delete_project(id).await {
            return Ok(false);
        }

        let next = {
            let mut state = self.lock()?;
            state.projects.retain(|p| p.id != id);
            let was_open = state.current_project_id.as_deref() == Some(id);
            let next = state.projects.first().map(|p| p.id.clone());

            if was_open && next.is_none() {
                state.clear_selection();
                self.emit(AppEvent::DocumentLoaded(DocumentPayload {
                    project_id: None,
                    nodes: Vec::new(),
                    edges: Vec::new(),
                }));
            }
            self.emit_projects(&state);

            if was_open {
                next
            } else {
                None
            }
        };

        if let Some(next) = next {
            self.open_project(&next).await?;
        }
        Ok(true)
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.ensure_logged_in()?;
        let projects = self.inner.store.list_projects().await;

        let mut state = self.lock()?;
        state.projects = projects.clone();
        self.emit_projects(&state);
        Ok(projects)
    }

    /// Select `id` and replace the document with its stored content.
    ///
    /// A load that finishes after another selection has started is dropped.
    /// A failed load puts the previous project back, document included.
    async fn open_project(&self, id: &str) -> Result<()> {
        let (generation, passphrase, previous) = {
            let mut state = self.lock()?;
            let passphrase = state.passphrase().ok_or(ClientError::NotAuthenticated)?;
            let previous = state.current_project_id.replace(id.to_string());
            state.selected_node_id = None;
            state.load_generation += 1;
            self.emit_projects(&state);
            (state.load_generation, passphrase, previous)
        };

        let loaded = self.inner.store.load_document(id, &passphrase).await;

        let mut state = self.lock()?;
        if state.load_generation != generation || state.current_project_id.as_deref() != Some(id) {
            debug!(project_id = %id, "discarding stale load");
            return Ok(());
        }

        state.loaded_generation = generation;

        match loaded {
            Ok(document) => {
                state.document = document;
                self.emit(AppEvent::DocumentLoaded(DocumentPayload {
                    project_id: Some(id.to_string()),
                    nodes: state.document.nodes.clone(),
                    edges: state.document.edges.clone(),
                }));
            }
            Err(e) => {
                let message = if e.is_decryption_failure() {
                    "Failed to decrypt project".to_string()
                } else {
                    format!("Failed to load project: {e}")
                };
                warn!(project_id = %id, error = %e, "load failed, keeping previous document");

                let previous = previous.filter(|p| state.projects.iter().any(|known| &known.id == p));
                match previous {
                    Some(previous) => state.current_project_id = Some(previous),
                    None => state.clear_selection(),
                }
                self.emit_projects(&state);
                self.emit(AppEvent::LoadFailed(LoadFailedPayload {
                    project_id: id.to_string(),
                    message,
                }));
            }
        }
        Ok(())
    }

    fn emit_projects(&self, state: &WorkspaceState) {
        self.emit(AppEvent::ProjectsChanged(ProjectsPayload {
            projects: state.projects.clone(),
            current_project_id: state.current_project_id.clone(),
        }));
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Seal the open document and write it to the store.
    ///
    /// `Ok(true)` when it was written. Does nothing when logged out, when no
    /// project is open, while the open project's document is still loading
    /// or when a save is already running.
    pub async fn save(&self) -> Result<bool> {
        let (id, document, passphrase, generation) = {
            let mut state = self.lock()?;
            let (Some(id), Some(passphrase)) = (state.current_project_id.clone(), state.passphrase())
            else {
                debug!("nothing to save");
                return Ok(false);
            };
            if state.is_loading() {
                debug!(project_id = %id, "save ignored while the document is loading");
                return Ok(false);
            }
            if state.save_status == SaveStatus::Saving {
                debug!("save already running");
                return Ok(false);
            }
            state.save_status = SaveStatus::Saving;
            state.save_generation += 1;
            (id, state.document.clone(), passphrase, state.save_generation)
        };
        self.emit(AppEvent::SaveStatusChanged(SaveStatus::Saving.into()));

        let saved = self.inner.store.save_document(&id, &document, &passphrase).await;

        let status = if saved { SaveStatus::Saved } else { SaveStatus::Error };
        self.lock()?.save_status = status;
        self.emit(AppEvent::SaveStatusChanged(status.into()));

        if saved {
            self.schedule_idle(generation);
            self.fetch_projects().await?;
        }
        Ok(saved)
    }

    /// Put the status back to idle once "Saved" has been shown long enough,
    /// unless another save started in the meantime.
    fn schedule_idle(&self, generation: u64) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.saved_display).await;
            let reverted = match inner.state.lock() {
                Ok(mut state) => {
                    let current = state.save_generation == generation
                        && state.save_status == SaveStatus::Saved;
                    if current {
                        state.save_status = SaveStatus::Idle;
                    }
                    current
                }
                Err(_) => false,
            };
            if reverted {
                inner.events.emit(AppEvent::SaveStatusChanged(SaveStatus::Idle.into()));
            }
        });
    }

    // ------------------------------------------------------------------
    // Document edits (memory only until the next save)
    // ------------------------------------------------------------------

    fn ensure_logged_in(&self) -> Result<()> {
        if self.lock()?.is_logged_in() {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }

    fn edit<R>(&self, f: impl FnOnce(&mut WorkspaceState) -> R) -> Result<R> {
        let mut state = self.lock()?;
        if !state.is_logged_in() {
            return Err(ClientError::NotAuthenticated);
        }
        Ok(f(&mut state))
    }

    /// Add a default-styled node at a random spot in the visible area.
    pub fn add_node(&self) -> Result<Node> {
        let mut rng = rand::thread_rng();
        let x = NEW_NODE_ORIGIN + rng.gen::<f64>() * NEW_NODE_SPAN;
        let y = NEW_NODE_ORIGIN + rng.gen::<f64>() * NEW_NODE_SPAN;
        let node = Node {
            kind: Some(NODE_TYPE_MINDMAP.to_string()),
            ..Node::new(self.inner.node_ids.next_id(), x, y)
        };

        self.edit(|state| {
            state.document.nodes.push(node.clone());
            node
        })
    }

    pub fn update_node(&self, id: &str, patch: &NodeDataPatch) -> Result<bool> {
        self.edit(|state| match state.document.node_mut(id) {
            Some(node) => {
                patch.apply(&mut node.data);
                true
            }
            None => false,
        })
    }

    pub fn move_node(&self, id: &str, position: Position) -> Result<bool> {
        self.edit(|state| match state.document.node_mut(id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        })
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&self, id: &str) -> Result<bool> {
        self.edit(|state| {
            let before = state.document.nodes.len();
            state.document.nodes.retain(|n| n.id != id);
            if state.document.nodes.len() == before {
                return false;
            }
            state.document.edges = changes::detach_node(&state.document.edges, id);
            if state.selected_node_id.as_deref() == Some(id) {
                state.selected_node_id = None;
            }
            true
        })
    }

    /// Draw an edge. `false` when an endpoint is missing, for self-loops and
    /// for connections that already exist.
    pub fn connect(&self, connection: &Connection) -> Result<bool> {
        self.edit(|state| {
            let doc = &mut state.document;
            if doc.node(&connection.source).is_none() || doc.node(&connection.target).is_none() {
                return false;
            }
            let before = doc.edges.len();
            doc.edges = changes::add_edge(connection, &doc.edges);
            doc.edges.len() > before
        })
    }

    pub fn disconnect(&self, edge_id: &str) -> Result<bool> {
        self.edit(|state| {
            let before = state.document.edges.len();
            state.document.edges.retain(|e| e.id != edge_id);
            state.document.edges.len() < before
        })
    }

    /// Apply a batch of node changes reported by the canvas.
    pub fn apply_node_changes(&self, batch: &[NodeChange]) -> Result<()> {
        self.edit(|state| {
            state.document.nodes = changes::apply_node_changes(&state.document.nodes, batch);
            let pruned = state.document.prune_dangling_edges();
            if pruned > 0 {
                debug!(pruned, "dropped edges of removed nodes");
            }

            for change in batch {
                match change {
                    NodeChange::Select { id, selected: true } => {
                        state.selected_node_id = Some(id.clone());
                    }
                    NodeChange::Select { id, selected: false } | NodeChange::Remove { id }
                        if state.selected_node_id.as_ref() == Some(id) =>
                    {
                        state.selected_node_id = None;
                    }
                    _ => {}
                }
            }
        })
    }

    /// Apply a batch of edge changes reported by the canvas.
    pub fn apply_edge_changes(&self, batch: &[EdgeChange]) -> Result<()> {
        self.edit(|state| {
            state.document.edges = changes::apply_edge_changes(&state.document.edges, batch);
            let pruned = state.document.prune_dangling_edges();
            if pruned > 0 {
                warn!(pruned, "rejected edges with unknown endpoints");
            }
        })
    }

    /// Open `id` in the editor panel, or close the panel with `None`.
    pub fn select_node(&self, id: Option<&str>) -> Result<bool> {
        self.edit(|state| {
            if let Some(id) = id {
                if state.document.node(id).is_none() {
                    return false;
                }
            }
            for node in &mut state.document.nodes {
                node.selected = Some(node.id.as_str()) == id;
            }
            state.selected_node_id = id.map(str::to_string);
            true
        })
    }
}

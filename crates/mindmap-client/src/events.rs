use mindmap_shared::{Edge, Node, Project};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::auth::AuthState;
use crate::state::SaveStatus;

pub const EVENT_AUTH_STATE_CHANGED: &str = "auth-state-changed";
pub const EVENT_AUTH_FAILED: &str = "auth-failed";
pub const EVENT_PROJECTS_CHANGED: &str = "projects-changed";
pub const EVENT_DOCUMENT_LOADED: &str = "document-loaded";
pub const EVENT_LOAD_FAILED: &str = "load-failed";
pub const EVENT_SAVE_STATUS_CHANGED: &str = "save-status-changed";

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum AppEvent {
    AuthStateChanged(AuthState),
    AuthFailed(AuthFailedPayload),
    ProjectsChanged(ProjectsPayload),
    DocumentLoaded(DocumentPayload),
    LoadFailed(LoadFailedPayload),
    SaveStatusChanged(SaveStatusPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthFailedPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsPayload {
    pub projects: Vec<Project>,
    pub current_project_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    pub project_id: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadFailedPayload {
    pub project_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatusPayload {
    pub status: SaveStatus,
    pub label: &'static str,
}

impl From<SaveStatus> for SaveStatusPayload {
    fn from(status: SaveStatus) -> Self {
        Self {
            status,
            label: status.label(),
        }
    }
}

impl AppEvent {
    /// Wire name of the event, for surfaces that dispatch on strings.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::AuthStateChanged(_) => EVENT_AUTH_STATE_CHANGED,
            AppEvent::AuthFailed(_) => EVENT_AUTH_FAILED,
            AppEvent::ProjectsChanged(_) => EVENT_PROJECTS_CHANGED,
            AppEvent::DocumentLoaded(_) => EVENT_DOCUMENT_LOADED,
            AppEvent::LoadFailed(_) => EVENT_LOAD_FAILED,
            AppEvent::SaveStatusChanged(_) => EVENT_SAVE_STATUS_CHANGED,
        }
    }
}

/// Fan-out of [`AppEvent`]s to every subscribed surface.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::debug!(event = name, "No subscribers for event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_tag() {
        let event = AppEvent::SaveStatusChanged(SaveStatus::Saving.into());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "saveStatusChanged");
        assert_eq!(json["payload"]["status"], "saving");
        assert_eq!(json["payload"]["label"], "Saving...");
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.emit(AppEvent::AuthStateChanged(AuthState::LoggedOut));

        let mut rx = bus.subscribe();
        bus.emit(AppEvent::AuthStateChanged(AuthState::LoggedIn));
        assert!(matches!(
            rx.recv().await.unwrap(),
            AppEvent::AuthStateChanged(AuthState::LoggedIn)
        ));
    }
}

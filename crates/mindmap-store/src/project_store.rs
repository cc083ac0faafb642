//! Project CRUD and sealed document load/save on top of a [`TableStore`].
//!
//! Connectivity failures are logged and degraded (empty list, `None`,
//! `false`) everywhere except [`ProjectStore::load_document`], which must let
//! the caller tell "wrong passphrase" apart from "store unreachable".

use std::sync::Arc;

use chrono::Utc;
use mindmap_shared::constants::{DEFAULT_PROJECT_ID, DEFAULT_PROJECT_NAME};
use mindmap_shared::{codec, ids, Document, Project};
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};
use crate::models::MindmapRecord;
use crate::table::TableStore;

#[derive(Clone)]
pub struct ProjectStore {
    table: Arc<dyn TableStore>,
}

impl ProjectStore {
    pub fn new(table: Arc<dyn TableStore>) -> Self {
        Self { table }
    }

    /// All projects, most recently saved first. Empty on failure.
    pub async fn list_projects(&self) -> Vec<Project> {
        match self.table.list().await {
            Ok(projects) => projects,
            Err(e) => {
                error!(error = %e, "failed to list projects");
                Vec::new()
            }
        }
    }

    /// Insert a new project with no document yet.
    pub async fn create_project(&self, name: &str) -> Option<Project> {
        let name = name.trim();
        if name.is_empty() {
            warn!("refusing to create a project with an empty name");
            return None;
        }

        let record = MindmapRecord::empty(ids::new_project_id(), name);
        match self.table.insert(&record).await {
            Ok(project) => {
                info!(project_id = %project.id, name = %project.name, "project created");
                Some(project)
            }
            Err(e) => {
                error!(error = %e, name, "failed to create project");
                None
            }
        }
    }

    pub async fn delete_project(&self, id: &str) -> bool {
        match self.table.delete(id).await {
            Ok(true) => {
                info!(project_id = %id, "project deleted");
                true
            }
            Ok(false) => {
                warn!(project_id = %id, "project to delete was not found");
                false
            }
            Err(e) => {
                error!(error = %e, project_id = %id, "failed to delete project");
                false
            }
        }
    }

    /// Fetch and open a project's document.
    ///
    /// A missing record or an empty ciphertext yields an empty document.
    /// A ciphertext that does not open with `passphrase` yields
    /// [`StoreError::DecryptionFailed`]; store failures are returned as-is.
    pub async fn load_document(&self, id: &str, passphrase: &str) -> Result<Document> {
        Ok(self
            .load_existing_document(id, passphrase)
            .await?
            .unwrap_or_default())
    }

    /// Like [`ProjectStore::load_document`], but `Ok(None)` when the record
    /// does not exist at all.
    pub async fn load_existing_document(&self, id: &str, passphrase: &str) -> Result<Option<Document>> {
        let record = self.table.get(id).await.map_err(|e| {
            error!(error = %e, project_id = %id, "failed to fetch document");
            e
        })?;

        let Some(record) = record else {
            debug!(project_id = %id, "no such project");
            return Ok(None);
        };
        if !record.has_document() {
            debug!(project_id = %id, "no stored document, starting empty");
            return Ok(Some(Document::empty()));
        }

        let document: Document = codec::decrypt(&record.encrypted_data, passphrase).ok_or_else(|| {
            warn!(project_id = %id, "document did not decrypt");
            StoreError::DecryptionFailed
        })?;

        let defects = document.validate();
        if !defects.is_empty() {
            warn!(project_id = %id, defects = ?defects, "loaded document has integrity defects");
        }

        debug!(
            project_id = %id,
            nodes = document.nodes.len(),
            edges = document.edges.len(),
            "document loaded"
        );
        Ok(Some(document))
    }

    /// Seal and store a project's document. `false` on any failure.
    pub async fn save_document(&self, id: &str, document: &Document, passphrase: &str) -> bool {
        let sealed = match codec::encrypt(document, passphrase) {
            Ok(sealed) => sealed,
            Err(e) => {
                error!(error = %e, project_id = %id, "failed to seal document");
                return false;
            }
        };

        match self.table.update_data(id, &sealed, Utc::now()).await {
            Ok(true) => {
                info!(project_id = %id, nodes = document.nodes.len(), "document saved");
                true
            }
            Ok(false) => {
                warn!(project_id = %id, "document save matched no project");
                false
            }
            Err(e) => {
                error!(error = %e, project_id = %id, "failed to save document");
                false
            }
        }
    }

    /// Make sure the `default` project exists so passphrase validation has a
    /// record to probe. Returns `true` if it had to be created.
    pub async fn ensure_default_project(&self) -> Result<bool> {
        if self.table.get(DEFAULT_PROJECT_ID).await?.is_some() {
            return Ok(false);
        }
        let record = MindmapRecord::empty(DEFAULT_PROJECT_ID, DEFAULT_PROJECT_NAME);
        self.table.insert(&record).await?;
        info!("provisioned default project");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::DateTime;
    use mindmap_shared::types::{Edge, Node};

    use super::*;
    use crate::database::Database;

    fn store() -> ProjectStore {
        ProjectStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    /// Table whose every call fails as if the network were down.
    struct Unreachable;

    #[async_trait]
    impl TableStore for Unreachable {
        async fn list(&self) -> Result<Vec<Project>> {
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
        async fn get(&self, _id: &str) -> Result<Option<MindmapRecord>> {
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
        async fn insert(&self, _record: &MindmapRecord) -> Result<Project> {
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
        async fn update_data(&self, _: &str, _: &str, _: DateTime<Utc>) -> Result<bool> {
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
        async fn delete(&self, _id: &str) -> Result<bool> {
            Err(StoreError::Status { status: 503, body: "down".into() })
        }
    }

    fn sample() -> Document {
        Document {
            nodes: vec![Node::new("a", 1.0, 2.0), Node::new("b", 3.0, 4.0)],
            edges: vec![Edge::new("ab", "a", "b")],
        }
    }

    #[tokio::test]
    async fn create_then_list() {
        let store = store();
        let project = store.create_project("  Trip Plan ").await.unwrap();
        assert_eq!(project.name, "Trip Plan");

        let listed = store.list_projects().await;
        assert_eq!(listed, vec![project]);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        assert!(store().create_project("   ").await.is_none());
    }

    #[tokio::test]
    async fn empty_ciphertext_loads_empty_for_any_passphrase() {
        let store = store();
        let project = store.create_project("Fresh").await.unwrap();
        for pass in ["a", "b", "anything at all"] {
            assert!(store.load_document(&project.id, pass).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn missing_record_loads_empty() {
        let store = store();
        assert!(store.load_document("ghost", "p").await.unwrap().is_empty());
        assert!(store.load_existing_document("ghost", "p").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let store = store();
        let project = store.create_project("Roundtrip").await.unwrap();
        assert!(store.save_document(&project.id, &sample(), "pw").await);
        assert_eq!(store.load_document(&project.id, "pw").await.unwrap(), sample());
    }

    #[tokio::test]
    async fn wrong_passphrase_is_decryption_failure() {
        let store = store();
        let project = store.create_project("Locked").await.unwrap();
        assert!(store.save_document(&project.id, &sample(), "right").await);

        let err = store.load_document(&project.id, "wrong").await.unwrap_err();
        assert!(err.is_decryption_failure());
    }

    #[tokio::test]
    async fn save_to_missing_project_fails() {
        assert!(!store().save_document("ghost", &sample(), "pw").await);
    }

    #[tokio::test]
    async fn save_moves_project_to_front() {
        let store = store();
        let first = store.create_project("First").await.unwrap();
        let second = store.create_project("Second").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(store.save_document(&first.id, &sample(), "pw").await);
        let listed = store.list_projects().await;
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn delete_reports_outcome() {
        let store = store();
        let project = store.create_project("Doomed").await.unwrap();
        assert!(store.delete_project(&project.id).await);
        assert!(!store.delete_project(&project.id).await);
        assert!(store.list_projects().await.is_empty());
    }

    #[tokio::test]
    async fn ensure_default_project_is_idempotent() {
        let store = store();
        assert!(store.ensure_default_project().await.unwrap());
        assert!(!store.ensure_default_project().await.unwrap());
        assert_eq!(store.list_projects().await[0].id, DEFAULT_PROJECT_ID);
    }

    #[tokio::test]
    async fn unreachable_store_degrades() {
        let store = ProjectStore::new(Arc::new(Unreachable));
        assert!(store.list_projects().await.is_empty());
        assert!(store.create_project("x").await.is_none());
        assert!(!store.delete_project("x").await);
        assert!(!store.save_document("x", &sample(), "pw").await);

        let err = store.load_document("x", "pw").await.unwrap_err();
        assert!(!err.is_decryption_failure());
    }
}

//! The remote table collaborator.
//!
//! [`TableStore`] is the create/read/update/delete surface the project store
//! needs from the `mindmaps` collection. Adapters: [`crate::Database`]
//! (local SQLite) and [`crate::RestTable`] (PostgREST over HTTP).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mindmap_shared::Project;

use crate::error::Result;
use crate::models::MindmapRecord;

#[async_trait]
pub trait TableStore: Send + Sync {
    /// Project metadata, most recently updated first.
    async fn list(&self) -> Result<Vec<Project>>;

    /// Full record by id, `None` when absent.
    async fn get(&self, id: &str) -> Result<Option<MindmapRecord>>;

    /// Insert a new record and return its metadata as stored.
    async fn insert(&self, record: &MindmapRecord) -> Result<Project>;

    /// Replace the ciphertext and bump `updated_at`. `Ok(false)` when no
    /// record has this id.
    async fn update_data(
        &self,
        id: &str,
        encrypted_data: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Delete by id. `Ok(false)` when no record has this id.
    async fn delete(&self, id: &str) -> Result<bool>;
}

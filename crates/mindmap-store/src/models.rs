//! Records of the remote `mindmaps` collection.

use chrono::{DateTime, Utc};
use mindmap_shared::Project;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of `mindmaps`. `encrypted_data` is empty until the project's
/// document is saved for the first time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MindmapRecord {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub encrypted_data: String,
    pub updated_at: DateTime<Utc>,
}

impl MindmapRecord {
    /// A fresh record with no document yet.
    pub fn empty(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            encrypted_data: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn has_document(&self) -> bool {
        !self.encrypted_data.is_empty()
    }

    pub fn project(&self) -> Project {
        Project {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//! SQLite adapter for the `mindmaps` table.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. It stands in for the
//! remote collection when the app runs without a hosted backend, and backs
//! most of the tests.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use directories::ProjectDirs;
use mindmap_shared::Project;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::models::MindmapRecord;
use crate::table::TableStore;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/mindmap/mindmap.db`
    /// - macOS:   `~/Library/Application Support/com.mindmap.mindmap/mindmap.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\mindmap\mindmap\data\mindmap.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "mindmap", "mindmap").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Self::open_at(&data_dir.join("mindmap.db"))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Throwaway database living only as long as the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn list_rows(&self) -> Result<Vec<Project>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, updated_at FROM mindmaps ORDER BY updated_at DESC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_project)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    fn get_row(&self, id: &str) -> Result<Option<MindmapRecord>> {
        self.conn()?
            .query_row(
                "SELECT id, name, encrypted_data, updated_at FROM mindmaps WHERE id = ?1",
                params![id],
                row_to_record,
            )
            .optional()
            .map_err(StoreError::Sqlite)
    }

    fn insert_row(&self, record: &MindmapRecord) -> Result<Project> {
        self.conn()?.execute(
            "INSERT INTO mindmaps (id, name, encrypted_data, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.name,
                record.encrypted_data,
                format_timestamp(record.updated_at),
            ],
        )?;
        let mut project = record.project();
        project.updated_at = project.updated_at.trunc_subsecs(6);
        Ok(project)
    }

    fn update_row(&self, id: &str, encrypted_data: &str, updated_at: DateTime<Utc>) -> Result<bool> {
        let affected = self.conn()?.execute(
            "UPDATE mindmaps SET encrypted_data = ?1, updated_at = ?2 WHERE id = ?3",
            params![encrypted_data, format_timestamp(updated_at), id],
        )?;
        Ok(affected > 0)
    }

    fn delete_row(&self, id: &str) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM mindmaps WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl TableStore for Database {
    async fn list(&self) -> Result<Vec<Project>> {
        self.list_rows()
    }

    async fn get(&self, id: &str) -> Result<Option<MindmapRecord>> {
        self.get_row(id)
    }

    async fn insert(&self, record: &MindmapRecord) -> Result<Project> {
        self.insert_row(record)
    }

    async fn update_data(
        &self,
        id: &str,
        encrypted_data: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.update_row(id, encrypted_data, updated_at)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_row(id)
    }
}

// Fixed-width so that ORDER BY on the text column is chronological.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    let updated_str: String = row.get(2)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        updated_at: parse_timestamp(2, &updated_str)?,
    })
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<MindmapRecord> {
    let updated_str: String = row.get(3)?;
    Ok(MindmapRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        encrypted_data: row.get(2)?,
        updated_at: parse_timestamp(3, &updated_str)?,
    })
}

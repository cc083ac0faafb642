//! # mindmap-store
//!
//! Persistence for mind-map projects. Each project is one row of the
//! `mindmaps` collection whose document is sealed client-side before it is
//! written; the store never sees plaintext.
//!
//! [`TableStore`] abstracts the collection. [`Database`] keeps it in a local
//! SQLite file and [`RestTable`] talks to a hosted PostgREST endpoint.
//! [`ProjectStore`] is the façade the client uses.

pub mod database;
pub mod migrations;
pub mod models;
pub mod project_store;
pub mod rest;
pub mod table;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::MindmapRecord;
pub use project_store::ProjectStore;
pub use rest::RestTable;
pub use table::TableStore;

//! # mindmap-shared
//!
//! Types and primitives shared by the store and the client: the mind-map
//! data model, the passphrase codec that seals documents at rest, and the
//! pure graph-change functions used at the UI boundary.

pub mod changes;
pub mod codec;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod ids;
pub mod types;

pub use error::{CodecError, CryptoError};
pub use types::{Document, DocumentDefect, Edge, Node, NodeData, NodeDataPatch, Position, Project};

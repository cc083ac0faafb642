/// Application name
pub const APP_NAME: &str = "Mindmap";

/// Remote collection holding one record per project
pub const MINDMAPS_TABLE: &str = "mindmaps";

/// Id of the project whose record is probed to validate a passphrase
pub const DEFAULT_PROJECT_ID: &str = "default";

/// Display name given to the default project when it is provisioned
pub const DEFAULT_PROJECT_NAME: &str = "Default";

/// Ciphertext envelope format version
pub const ENVELOPE_VERSION: u8 = 1;

/// Random salt mixed into the passphrase KDF, per ciphertext
pub const SALT_SIZE: usize = 16;

/// XChaCha20-Poly1305 nonce size in bytes
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Symmetric key size in bytes (for XChaCha20-Poly1305)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Key derivation context (BLAKE3)
pub const KDF_CONTEXT_DOCUMENT_KEY: &str = "mindmap-document-key-v1";

/// Local persistence slot holding the cached passphrase
pub const SESSION_SLOT_KEY: &str = "mindmap_auth";

/// How long a cached passphrase stays usable across restarts
pub const SESSION_TTL_HOURS: i64 = 24;

/// How long the "saved" indicator stays up before reverting to idle
pub const SAVED_DISPLAY_MILLIS: u64 = 2_000;

/// Node defaults applied by "add node"
pub const NODE_TYPE_MINDMAP: &str = "mindmapNode";
pub const DEFAULT_NODE_LABEL: &str = "New node";
pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 72;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const TRANSPARENT: &str = "transparent";

/// Region new nodes are scattered over: [origin, origin + span)
pub const NEW_NODE_ORIGIN: f64 = 100.0;
pub const NEW_NODE_SPAN: f64 = 500.0;

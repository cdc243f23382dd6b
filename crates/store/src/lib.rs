//! filedock file storage core
//!
//! This crate implements the storage logic behind the filedock HTTP API:
//! clients hand over base64-encoded payloads (optionally carrying a
//! `data:<mime>;base64,` prefix) which are decoded and written to disk under
//! a configured root directory, and later retrieved, re-encoded, overwritten,
//! or deleted by name and path.
//!
//! ## Storage model
//!
//! Files are plain bytes on the local filesystem. There is no manifest,
//! index, or database row tracking them; existence is checked directly
//! against the filesystem at call time.
//!
//! ```text
//! <root>/                      # configured storage root
//! ├── <name>.<ext>             # uploads without an explicit path
//! └── <sub>/<dir>/             # caller-supplied relative directories
//!     └── <name>.<ext>
//! ```
//!
//! ## Path confinement
//!
//! Caller-supplied names and paths are interpreted relative to the storage
//! root. Absolute paths and `..` components are rejected, so every resolved
//! path stays inside the root.
//!
//! ## Concurrency
//!
//! All operations are synchronous and blocking. No locking protects the
//! filesystem: two concurrent calls targeting the same resolved path race
//! with last-writer-wins semantics.
//!
//! ## Example usage
//!
//! ```no_run
//! use filedock_store::{FileStore, UploadRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::new("static/uploads")?;
//! let stored = store.upload(&UploadRequest {
//!     base64: "data:image/png;base64,iVBORw0KGgo=".into(),
//!     file_name: Some("logo".into()),
//!     file_path: None,
//! })?;
//! assert_eq!(stored.file_name, "logo.png");
//! # Ok(())
//! # }
//! ```

mod data_uri;
mod store;

pub use data_uri::split_data_uri;
pub use store::{EncodedFile, FileStore, StoredFile, UploadRequest, DEFAULT_MAX_PAYLOAD_BYTES};

/// Errors that can occur during file storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Payload is not valid base64, or a data URI prefix is malformed
    #[error("Invalid base64 payload: {0}")]
    InvalidEncoding(String),

    /// Decoded payload exceeds the configured size ceiling
    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Target file does not exist
    #[error("File not found: {0}")]
    NotFound(String),

    /// Target file already exists (uploads never overwrite)
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// Path validation failed (absolute path or directory traversal)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

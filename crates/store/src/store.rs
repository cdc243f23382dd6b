//! Root-scoped file storage service implementation
//!
//! This module provides the core implementation of filedock's storage
//! through the [`FileStore`] type. It decodes base64 upload payloads and
//! persists the bytes under a configured root directory, and serves the
//! reverse operations: existence checks, re-encoding reads, raw reads for
//! download, overwrites, and deletes.
//!
//! # Upload path
//!
//! 1. An optional `data:<mime>;base64,` prefix is split off the payload
//!    ([`crate::split_data_uri`]).
//! 2. The remaining body is base64-decoded; malformed input fails here and
//!    nothing touches the disk.
//! 3. The decoded size is checked against the configured ceiling.
//! 4. The target path is resolved: the caller's directory (relative to the
//!    root, created on demand) plus the caller's name (or a random token)
//!    plus an extension derived from the sniffed MIME subtype (`bin` when
//!    no prefix was present).
//! 5. Uploads never overwrite: an occupied target is a conflict and the
//!    existing bytes are left untouched. Overwriting goes through
//!    [`FileStore::update`] explicitly.
//!
//! # Security model
//!
//! Caller-supplied names and paths are validated before use: absolute
//! paths, `..` components, and separator-bearing file names are rejected,
//! confining every resolved path to the storage root.
//!
//! # Implementation notes
//!
//! - Writes are not atomic; an interrupted write leaves a truncated file.
//! - No locking: concurrent calls to the same resolved path race with
//!   last-writer-wins semantics.
//! - The service is stateless apart from its configuration and implements
//!   `Debug` but not `Clone` (single-owner semantics; share via `Arc`).

use crate::data_uri::{extension_for, split_data_uri};
use crate::StoreError;
use base64::{engine::general_purpose, Engine as _};
use std::fs;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Default ceiling on the decoded payload size: 5 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

/// An upload or update request
///
/// `base64` may embed a `data:<mime>;base64,` prefix; the MIME subtype then
/// determines the stored file's extension. `file_name` and `file_path` are
/// both optional for uploads: a missing path targets the storage root and a
/// missing name is replaced with a randomly generated unique token.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Base64 payload, optionally prefixed with a data URI marker
    pub base64: String,

    /// File name without extension for uploads; full name for updates
    pub file_name: Option<String>,

    /// Directory relative to the storage root
    pub file_path: Option<String>,
}

/// A stored file's identity, returned by write and stat operations
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredFile {
    /// Final file name, including the derived extension
    pub file_name: String,

    /// Full resolved path on disk
    pub path: PathBuf,
}

/// A file's content re-encoded to base64
///
/// The encoded content lives in its own field rather than being smuggled
/// through the file name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EncodedFile {
    /// File name as supplied by the caller
    pub file_name: String,

    /// Full resolved path on disk
    pub path: PathBuf,

    /// Base64-encoded file content
    pub base64: String,
}

/// Service for storing and retrieving base64-submitted files
///
/// The `FileStore` provides a safe, root-scoped interface over a directory
/// of plain files. All operations resolve caller-supplied names and paths
/// against the configured root and refuse anything that would escape it.
#[derive(Debug)]
pub struct FileStore {
    /// Root directory under which all files live
    root: PathBuf,

    /// Ceiling on the decoded payload size in bytes
    max_payload_bytes: usize,
}

impl FileStore {
    /// Creates a new `FileStore` rooted at `root`
    ///
    /// The root directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the root directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create storage root {}: {}", root.display(), e),
            ))
        })?;
        Ok(Self {
            root,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        })
    }

    /// Overrides the decoded payload size ceiling
    #[must_use]
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }

    /// Returns the storage root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes and persists an upload
    ///
    /// Splits off any data URI prefix, decodes the base64 body, resolves
    /// the target path, and writes the decoded bytes. The final name is
    /// `<name>.<ext>` where `<ext>` is the sniffed MIME subtype or `bin`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if:
    /// - The payload is not valid base64 or has a malformed data URI prefix
    /// - The decoded payload exceeds the configured size ceiling
    /// - The supplied name or path would escape the storage root
    /// - A file already exists at the resolved path (uploads never
    ///   overwrite; the existing bytes are untouched)
    /// - Directory creation or the file write fails (I/O)
    pub fn upload(&self, request: &UploadRequest) -> Result<StoredFile, StoreError> {
        let (mime, encoded) = split_data_uri(&request.base64)?;
        let bytes = self.decode_payload(encoded)?;

        let directory = self.resolve_directory(request.file_path.as_deref())?;
        fs::create_dir_all(&directory).map_err(|e| {
            StoreError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create target directory {}: {}",
                    directory.display(),
                    e
                ),
            ))
        })?;

        let stem = match request.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                validate_file_name(name)?;
                name.to_owned()
            }
            // Random token; collisions between concurrent nameless
            // uploads are negligible by construction.
            _ => Uuid::new_v4().simple().to_string(),
        };
        let file_name = format!("{}.{}", stem, extension_for(mime));
        let target = directory.join(&file_name);

        if target.exists() {
            return Err(StoreError::AlreadyExists(file_name));
        }

        write_bytes(&target, &bytes)?;

        Ok(StoredFile {
            file_name,
            path: target,
        })
    }

    /// Overwrites an existing file with a freshly decoded payload
    ///
    /// Unlike [`FileStore::upload`], the file name is required, carries its
    /// own extension, and must already exist at the resolved path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if:
    /// - No file exists at the resolved path (includes a missing name)
    /// - The payload is not valid base64 or exceeds the size ceiling
    /// - The supplied name or path would escape the storage root
    /// - The file write fails (I/O)
    pub fn update(&self, request: &UploadRequest) -> Result<StoredFile, StoreError> {
        let Some(file_name) = request
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            return Err(StoreError::NotFound("no file name was supplied".into()));
        };

        let target = self.resolve_file(file_name, request.file_path.as_deref())?;
        if !target.is_file() {
            return Err(StoreError::NotFound(file_name.to_owned()));
        }

        let (_, encoded) = split_data_uri(&request.base64)?;
        let bytes = self.decode_payload(encoded)?;

        write_bytes(&target, &bytes)?;

        Ok(StoredFile {
            file_name: file_name.to_owned(),
            path: target,
        })
    }

    /// Checks whether a file exists at a path relative to the root
    ///
    /// A pure existence check: no content is read. Returns the file's base
    /// name and full resolved path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the path does not name an existing
    /// file, or `StoreError::InvalidPath` if it would escape the root.
    pub fn stat(&self, file_path: &str) -> Result<StoredFile, StoreError> {
        let trimmed = file_path.trim();
        if trimmed.is_empty() {
            return Err(StoreError::NotFound("no file path was supplied".into()));
        }

        let target = self.confine(trimmed)?;
        if !target.is_file() {
            return Err(StoreError::NotFound(trimmed.to_owned()));
        }

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(StoredFile {
            file_name,
            path: target,
        })
    }

    /// Reads a file and re-encodes its content to base64
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the file is absent,
    /// `StoreError::InvalidPath` on confinement failure, or
    /// `StoreError::Io` if the read fails.
    pub fn read_encoded(
        &self,
        file_name: &str,
        file_path: Option<&str>,
    ) -> Result<EncodedFile, StoreError> {
        let target = self.resolve_file(file_name, file_path)?;
        if !target.is_file() {
            return Err(StoreError::NotFound(file_name.to_owned()));
        }

        let bytes = read_bytes(&target)?;

        Ok(EncodedFile {
            file_name: file_name.to_owned(),
            path: target,
            base64: general_purpose::STANDARD.encode(bytes),
        })
    }

    /// Reads a file's raw bytes, for download responses
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the file is absent,
    /// `StoreError::InvalidPath` on confinement failure, or
    /// `StoreError::Io` if the read fails.
    pub fn read_raw(&self, file_name: &str, file_path: Option<&str>) -> Result<Vec<u8>, StoreError> {
        let target = self.resolve_file(file_name, file_path)?;
        if !target.is_file() {
            return Err(StoreError::NotFound(file_name.to_owned()));
        }

        read_bytes(&target)
    }

    /// Removes a file
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the file is absent,
    /// `StoreError::InvalidPath` on confinement failure, or
    /// `StoreError::Io` if the removal fails (permissions, in-use handle).
    /// Failures are reported, not retried.
    pub fn delete(&self, file_name: &str, file_path: Option<&str>) -> Result<(), StoreError> {
        let target = self.resolve_file(file_name, file_path)?;
        if !target.is_file() {
            return Err(StoreError::NotFound(file_name.to_owned()));
        }

        fs::remove_file(&target).map_err(|e| {
            StoreError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to delete file {}: {}", target.display(), e),
            ))
        })
    }

    /// Decodes a base64 body and enforces the size ceiling
    fn decode_payload(&self, encoded: &str) -> Result<Vec<u8>, StoreError> {
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| StoreError::InvalidEncoding(e.to_string()))?;

        if bytes.len() > self.max_payload_bytes {
            return Err(StoreError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_payload_bytes,
            });
        }

        Ok(bytes)
    }

    /// Resolves a caller-supplied directory, defaulting to the root
    fn resolve_directory(&self, file_path: Option<&str>) -> Result<PathBuf, StoreError> {
        match file_path.map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => self.confine(raw),
            None => Ok(self.root.clone()),
        }
    }

    /// Resolves `<directory>/<file_name>` with both parts validated
    fn resolve_file(
        &self,
        file_name: &str,
        file_path: Option<&str>,
    ) -> Result<PathBuf, StoreError> {
        let file_name = file_name.trim();
        validate_file_name(file_name)?;
        Ok(self.resolve_directory(file_path)?.join(file_name))
    }

    /// Joins a relative path onto the root, rejecting escapes
    fn confine(&self, raw: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(raw);
        if relative.is_absolute() {
            return Err(StoreError::InvalidPath(format!(
                "absolute paths are not permitted: {raw}"
            )));
        }

        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(StoreError::InvalidPath(format!(
                        "path escapes the storage root: {raw}"
                    )))
                }
            }
        }

        Ok(self.root.join(relative))
    }
}

/// Validates a file name as a single path component
fn validate_file_name(file_name: &str) -> Result<(), StoreError> {
    if file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains('/')
        || file_name.contains('\\')
    {
        return Err(StoreError::InvalidPath(format!(
            "file name must be a single path component: {file_name}"
        )));
    }
    Ok(())
}

/// Writes bytes, fully replacing any prior content
///
/// Not atomic: an interrupted write leaves a truncated or zero-length file.
fn write_bytes(target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    fs::write(target, bytes).map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write file to {}: {}", target.display(), e),
        ))
    })
}

/// Reads a file's full content
fn read_bytes(target: &Path) -> Result<Vec<u8>, StoreError> {
    fs::read(target).map_err(|e| {
        StoreError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read file from {}: {}", target.display(), e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> FileStore {
        FileStore::new(temp.path().join("uploads")).unwrap()
    }

    fn upload_req(base64: &str, name: Option<&str>, path: Option<&str>) -> UploadRequest {
        UploadRequest {
            base64: base64.into(),
            file_name: name.map(Into::into),
            file_path: path.map(Into::into),
        }
    }

    // "hello world" in base64
    const HELLO: &str = "aGVsbG8gd29ybGQ=";

    #[test]
    fn test_new_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("a/b/uploads");

        let store = FileStore::new(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(store.root(), root);
    }

    #[test]
    fn test_upload_plain_base64() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store
            .upload(&upload_req(HELLO, Some("greeting"), None))
            .unwrap();

        assert_eq!(stored.file_name, "greeting.bin");
        assert_eq!(stored.path, store.root().join("greeting.bin"));
        assert_eq!(fs::read(&stored.path).unwrap(), b"hello world");
    }

    #[test]
    fn test_upload_data_uri_extension_from_subtype() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let payload = format!("data:image/png;base64,{HELLO}");
        let stored = store
            .upload(&upload_req(&payload, Some("logo"), None))
            .unwrap();

        assert_eq!(stored.file_name, "logo.png");
        assert_eq!(fs::read(&stored.path).unwrap(), b"hello world");
    }

    #[test]
    fn test_upload_creates_nested_directories() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store
            .upload(&upload_req(HELLO, Some("note"), Some("a/b/c")))
            .unwrap();

        assert_eq!(stored.path, store.root().join("a/b/c/note.bin"));
        assert!(stored.path.is_file());
    }

    #[test]
    fn test_upload_without_name_generates_unique_names() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let first = store.upload(&upload_req(HELLO, None, None)).unwrap();
        let second = store.upload(&upload_req(HELLO, None, None)).unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert!(first.path.is_file());
        assert!(second.path.is_file());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 2);
    }

    #[test]
    fn test_upload_blank_name_generates_name() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store.upload(&upload_req(HELLO, Some("   "), None)).unwrap();

        // 32 hex chars + ".bin"
        assert_eq!(stored.file_name.len(), 36);
        assert!(stored.file_name.ends_with(".bin"));
    }

    #[test]
    fn test_upload_conflict_leaves_original_untouched() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let first = store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        // "other bytes"
        let result = store.upload(&upload_req("b3RoZXIgYnl0ZXM=", Some("doc"), None));

        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(fs::read(&first.path).unwrap(), b"hello world");
    }

    #[test]
    fn test_upload_invalid_base64_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.upload(&upload_req("!@#not-base64", Some("bad"), None));

        assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_upload_malformed_data_uri_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.upload(&upload_req("data:image/png;b64,AAAA", None, None));

        assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
    }

    #[test]
    fn test_upload_rejects_oversized_payload() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).with_max_payload_bytes(8);

        let payload = general_purpose::STANDARD.encode(vec![0u8; 16]);
        let result = store.upload(&upload_req(&payload, Some("big"), None));

        assert!(matches!(
            result,
            Err(StoreError::PayloadTooLarge { size: 16, limit: 8 })
        ));
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    }

    #[test]
    fn test_upload_rejects_traversal_path() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.upload(&upload_req(HELLO, Some("evil"), Some("../outside")));

        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_upload_rejects_absolute_path() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.upload(&upload_req(HELLO, Some("evil"), Some("/tmp")));

        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_upload_rejects_separator_in_name() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.upload(&upload_req(HELLO, Some("../evil"), None));

        assert!(matches!(result, Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_update_overwrites_existing_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        // "other bytes"
        let updated = store
            .update(&upload_req("b3RoZXIgYnl0ZXM=", Some("doc.bin"), None))
            .unwrap();

        assert_eq!(updated.path, stored.path);
        assert_eq!(fs::read(&updated.path).unwrap(), b"other bytes");
    }

    #[test]
    fn test_update_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.update(&upload_req(HELLO, Some("ghost.bin"), None));

        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_without_name_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let result = store.update(&upload_req(HELLO, None, None));

        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_update_invalid_base64_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        let result = store.update(&upload_req("!!!", Some("doc.bin"), None));

        assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
        assert_eq!(fs::read(&stored.path).unwrap(), b"hello world");
    }

    #[test]
    fn test_stat_existing_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .upload(&upload_req(HELLO, Some("doc"), Some("sub")))
            .unwrap();

        let stat = store.stat("sub/doc.bin").unwrap();

        assert_eq!(stat.file_name, "doc.bin");
        assert_eq!(stat.path, store.root().join("sub/doc.bin"));
    }

    #[test]
    fn test_stat_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(matches!(
            store.stat("nowhere.bin"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_stat_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(matches!(
            store.stat("../etc/passwd"),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_read_encoded_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        let encoded = store.read_encoded("doc.bin", None).unwrap();

        assert_eq!(encoded.file_name, "doc.bin");
        assert_eq!(encoded.base64, HELLO);
        assert_eq!(
            general_purpose::STANDARD.decode(&encoded.base64).unwrap(),
            b"hello world"
        );
    }

    #[test]
    fn test_read_encoded_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(matches!(
            store.read_encoded("ghost.bin", None),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_raw_returns_identical_bytes() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let binary: Vec<u8> = (0..=255).collect();
        let payload = general_purpose::STANDARD.encode(&binary);
        store
            .upload(&upload_req(&payload, Some("blob"), None))
            .unwrap();

        let bytes = store.read_raw("blob.bin", None).unwrap();

        assert_eq!(bytes, binary);
    }

    #[test]
    fn test_delete_removes_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        store.delete("doc.bin", None).unwrap();

        assert!(matches!(
            store.stat("doc.bin"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        store
            .upload(&upload_req(HELLO, Some("doc"), None))
            .unwrap();

        let result = store.delete("ghost.bin", None);

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        // Nothing else was mutated
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_payload_is_valid() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let stored = store.upload(&upload_req("", Some("empty"), None)).unwrap();

        assert_eq!(fs::read(&stored.path).unwrap(), b"");
    }

    #[test]
    fn test_stored_file_serializes() {
        let stored = StoredFile {
            file_name: "doc.png".into(),
            path: PathBuf::from("static/uploads/doc.png"),
        };

        let json = serde_json::to_string(&stored).unwrap();
        assert!(json.contains("doc.png"));
    }
}

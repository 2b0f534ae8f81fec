//! Generic filesystem contract.
//!
//! This module defines the `FilesystemAdapter` trait: the operation set a
//! virtual-filesystem facade dispatches to, independent of the storage
//! backend. Paths are logical paths, `/`-separated and relative to the
//! adapter's root.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sharefs_remote::ByteStream;

use crate::error::{AdapterError, AdapterResult};
use crate::metadata::{MetadataRecord, Visibility};

/// Options accompanying a create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Requested visibility. Only [`Visibility::Public`] can be honored.
    pub visibility: Option<Visibility>,
    /// Content type to store with the file.
    pub content_type: Option<String>,
}

impl WriteOptions {
    /// Options requesting public visibility.
    pub fn public() -> Self {
        Self {
            visibility: Some(Visibility::Public),
            content_type: None,
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Rejects options the backend cannot honor.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::CapabilityUnsupported` when private visibility
    /// is requested.
    pub fn ensure_supported(&self) -> AdapterResult<()> {
        match self.visibility {
            Some(Visibility::Private) => Err(AdapterError::CapabilityUnsupported(
                "private visibility",
            )),
            _ => Ok(()),
        }
    }
}

/// Generic filesystem operations.
///
/// Implementations translate each operation into backend calls and report
/// failures through the [`AdapterError`] taxonomy, so callers see the same
/// error kinds whatever the backend.
#[async_trait]
pub trait FilesystemAdapter: Send + Sync {
    /// Checks whether a file or directory exists at `path`.
    ///
    /// Absence is `Ok(false)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidPath` for a malformed path, or
    /// `AdapterError::Transport` if the backend fails for another reason.
    async fn has(&self, path: &str) -> AdapterResult<bool>;

    /// Reads a whole file into memory.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the file does not exist.
    async fn read(&self, path: &str) -> AdapterResult<Bytes>;

    /// Opens a file for streaming.
    ///
    /// The body is consumed lazily; dropping the stream releases it.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the file does not exist.
    async fn read_stream(&self, path: &str) -> AdapterResult<ByteStream>;

    /// Creates a new file, along with any missing parent directories.
    ///
    /// Never overwrites.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::AlreadyExists` if something already exists at
    /// `path`; the existing content is left unchanged.
    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        options: &WriteOptions,
    ) -> AdapterResult<MetadataRecord>;

    /// Creates a new file from a stream. Same rules as [`FilesystemAdapter::write`].
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Io` if the stream fails; nothing is written then.
    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        options: &WriteOptions,
    ) -> AdapterResult<MetadataRecord>;

    /// Replaces the content of an existing file.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the file does not exist.
    async fn update(&self, path: &str, contents: Bytes) -> AdapterResult<MetadataRecord>;

    /// Replaces the content of an existing file from a stream.
    async fn update_stream(&self, path: &str, stream: ByteStream)
    -> AdapterResult<MetadataRecord>;

    /// Writes `contents`, updating the file if it exists and creating it otherwise.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::AlreadyExists` if `path` is a directory.
    async fn put(
        &self,
        path: &str,
        contents: Bytes,
        options: &WriteOptions,
    ) -> AdapterResult<MetadataRecord> {
        options.ensure_supported()?;
        match self.get_metadata(path).await {
            Ok(existing) if existing.is_dir() => Err(AdapterError::AlreadyExists(path.to_string())),
            Ok(_) => self.update(path, contents).await,
            Err(err) if err.is_not_found() => self.write(path, contents, options).await,
            Err(err) => Err(err),
        }
    }

    /// Deletes a single file.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if the file does not exist.
    async fn delete(&self, path: &str) -> AdapterResult<()>;

    /// Deletes a directory. Succeeds if the directory does not exist.
    ///
    /// A file at `path` is not touched and fails with `AdapterError::InvalidPath`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::DirectoryNotEmpty` if the directory has
    /// children and the adapter does not delete recursively.
    async fn delete_dir(&self, path: &str) -> AdapterResult<()>;

    /// Creates a directory and any missing parents. Idempotent.
    async fn create_dir(&self, path: &str) -> AdapterResult<MetadataRecord>;

    /// Lists the entries below `path`.
    ///
    /// Immediate children only, unless `recursive`. A missing directory lists
    /// as empty.
    async fn list_contents(&self, path: &str, recursive: bool)
    -> AdapterResult<Vec<MetadataRecord>>;

    /// Moves a file. Not atomic: the destination is written before the
    /// source is removed.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if `src` does not exist, or
    /// `AdapterError::AlreadyExists` if `dst` does.
    async fn rename(&self, src: &str, dst: &str) -> AdapterResult<()>;

    /// Copies a file. Same rules as [`FilesystemAdapter::rename`].
    async fn copy(&self, src: &str, dst: &str) -> AdapterResult<()>;

    /// Metadata of a file or directory.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotFound` if nothing exists at `path`.
    async fn get_metadata(&self, path: &str) -> AdapterResult<MetadataRecord>;

    /// Size in bytes.
    async fn get_size(&self, path: &str) -> AdapterResult<u64> {
        Ok(self.get_metadata(path).await?.size)
    }

    /// Last modification time.
    async fn get_timestamp(&self, path: &str) -> AdapterResult<DateTime<Utc>> {
        Ok(self.get_metadata(path).await?.timestamp)
    }

    /// Stored content type, if any.
    async fn get_mimetype(&self, path: &str) -> AdapterResult<Option<String>> {
        Ok(self.get_metadata(path).await?.mimetype)
    }

    /// Changes the visibility of an entry.
    async fn set_visibility(&self, path: &str, visibility: Visibility) -> AdapterResult<()>;

    /// Reads the visibility of an entry.
    async fn get_visibility(&self, path: &str) -> AdapterResult<Visibility>;
}

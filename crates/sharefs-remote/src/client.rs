//! The file share client interface.
//!
//! This module defines the `ShareClient` trait: the path-addressed REST
//! primitives of a network file share. Implementations can talk to a real
//! service, to a local directory ([`crate::LocalShare`]) or to memory
//! ([`crate::MemoryShare`]).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::RemoteResult;
use crate::types::{ByteStream, FileOptions, ListPage, RemoteEntry};

/// Path-addressed operations offered by a remote file share.
///
/// Paths are `/`-separated, carry no leading or trailing slash, and `""`
/// addresses the share root. Every directory in a path must already exist;
/// the share never creates parents implicitly. There is no existence query:
/// absence is reported by the property calls failing with
/// [`FaultCode::ResourceNotFound`](crate::FaultCode::ResourceNotFound).
///
/// Retries, authentication, timeouts and cancellation belong to the
/// implementation; callers see them only as faults.
#[async_trait]
pub trait ShareClient: Send + Sync {
    /// Creates a single directory.
    ///
    /// # Errors
    ///
    /// `ResourceAlreadyExists` if something already lives at `path`,
    /// `ParentNotFound` if the parent directory is missing.
    async fn create_directory(&self, path: &str) -> RemoteResult<()>;

    /// Fetches the properties of a directory.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if no directory exists at `path`.
    async fn get_directory_properties(&self, path: &str) -> RemoteResult<RemoteEntry>;

    /// Deletes an empty directory.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` if absent, `DirectoryNotEmpty` if it has children.
    async fn delete_directory(&self, path: &str) -> RemoteResult<()>;

    /// Lists one page of the immediate children of a directory.
    ///
    /// Pass the previous page's `next_marker` to continue.
    async fn list_directory(&self, path: &str, marker: Option<&str>) -> RemoteResult<ListPage>;

    /// Creates a file with the given content.
    ///
    /// Carries an existence precondition: the call fails with
    /// `ResourceAlreadyExists` instead of replacing an existing file.
    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        options: &FileOptions,
    ) -> RemoteResult<RemoteEntry>;

    /// Fetches the properties of a file.
    ///
    /// Directories are not files: addressing one fails with `ResourceNotFound`.
    async fn get_file_properties(&self, path: &str) -> RemoteResult<RemoteEntry>;

    /// Opens the content of a file as a lazily consumed stream.
    async fn read_file(&self, path: &str) -> RemoteResult<ByteStream>;

    /// Replaces the content of an existing file.
    ///
    /// Never creates: fails with `ResourceNotFound` if the file is absent.
    async fn put_file_content(&self, path: &str, content: Bytes) -> RemoteResult<RemoteEntry>;

    /// Deletes a file.
    async fn delete_file(&self, path: &str) -> RemoteResult<()>;
}

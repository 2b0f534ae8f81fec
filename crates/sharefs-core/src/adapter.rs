//! Share-backed implementation of the generic filesystem contract.
//!
//! `ShareFileAdapter` resolves every logical path through its prefix, prepares
//! directory ancestry where the share needs it, issues the remote calls and
//! maps results and faults back into generic terms.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use sharefs_remote::{ByteStream, FileOptions, RemoteFault, ShareClient};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::ShareConfig;
use crate::directory::DirectoryOperator;
use crate::error::{AdapterError, AdapterResult};
use crate::filesystem::{FilesystemAdapter, WriteOptions};
use crate::metadata::{MetadataMapper, MetadataRecord, Visibility};
use crate::path::{PathPrefix, RemotePath};

/// Drains a byte stream into one buffer.
async fn collect_stream(mut stream: ByteStream) -> AdapterResult<Bytes> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer.freeze())
}

/// Filesystem adapter over a remote file share.
///
/// Holds only the client handle, the immutable prefix and the recursive-delete
/// toggle, so one adapter can serve concurrent operations. Several adapters
/// with different prefixes can share one client without seeing each other's
/// files.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use sharefs_core::{FilesystemAdapter, ShareConfig, ShareFileAdapter, WriteOptions};
/// use sharefs_remote::MemoryShare;
/// use std::sync::Arc;
///
/// futures::executor::block_on(async {
///     let share = Arc::new(MemoryShare::new());
///     let config = ShareConfig::new("assets");
///     let fs = ShareFileAdapter::with_prefix(share, &config, "p1").unwrap();
///
///     fs.write("foo/bar/baz.txt", Bytes::from_static(b"hi"), &WriteOptions::default())
///         .await
///         .unwrap();
///     assert!(fs.has("foo/bar/baz.txt").await.unwrap());
///     assert_eq!(fs.read("foo/bar/baz.txt").await.unwrap(), "hi");
/// });
/// ```
#[derive(Clone)]
pub struct ShareFileAdapter {
    client: Arc<dyn ShareClient>,
    prefix: PathPrefix,
    recursive_delete: bool,
}

impl fmt::Debug for ShareFileAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareFileAdapter")
            .field("prefix", &self.prefix)
            .field("recursive_delete", &self.recursive_delete)
            .finish_non_exhaustive()
    }
}

impl ShareFileAdapter {
    /// Creates an adapter using the prefix from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidConfig` if the configuration does not validate.
    pub fn new(client: Arc<dyn ShareClient>, config: &ShareConfig) -> AdapterResult<Self> {
        config.validate()?;
        Ok(Self {
            client,
            prefix: config.path_prefix()?,
            recursive_delete: config.recursive_delete(),
        })
    }

    /// Creates an adapter confined to `prefix`, overriding any prefix in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidConfig` if the configuration or the
    /// prefix is invalid.
    pub fn with_prefix(
        client: Arc<dyn ShareClient>,
        config: &ShareConfig,
        prefix: &str,
    ) -> AdapterResult<Self> {
        let config = config.clone().with_prefix(prefix);
        Self::new(client, &config)
    }

    /// The prefix every logical path is resolved under.
    pub fn prefix(&self) -> &PathPrefix {
        &self.prefix
    }

    /// Whether `delete_dir` cascades into non-empty directories.
    pub fn recursive_delete(&self) -> bool {
        self.recursive_delete
    }

    fn resolve(&self, path: &str) -> AdapterResult<RemotePath> {
        self.prefix.resolve(path)
    }

    fn directories(&self) -> DirectoryOperator<'_> {
        DirectoryOperator::new(self.client.as_ref(), &self.prefix)
    }

    fn mapper(&self) -> MetadataMapper<'_> {
        MetadataMapper::new(&self.prefix)
    }

    fn fault(&self, fault: RemoteFault, remote: &RemotePath) -> AdapterError {
        AdapterError::from_fault(fault, self.prefix.logical_display(remote))
    }

    /// Refuses to treat the share root as a file.
    fn file_target(&self, path: &str) -> AdapterResult<RemotePath> {
        let remote = self.resolve(path)?;
        if remote.is_root() {
            return Err(AdapterError::InvalidPath(format!(
                "{path:?} addresses the share root, not a file"
            )));
        }
        Ok(remote)
    }

    /// Outcome of a properties call: `Ok(None)` when the resource is absent.
    fn found<T>(
        &self,
        result: Result<T, RemoteFault>,
        remote: &RemotePath,
    ) -> AdapterResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(fault) if fault.code.is_not_found() => Ok(None),
            Err(fault) => Err(self.fault(fault, remote)),
        }
    }
}

#[async_trait]
impl FilesystemAdapter for ShareFileAdapter {
    #[tracing::instrument(skip_all, fields(path = path))]
    async fn has(&self, path: &str) -> AdapterResult<bool> {
        let remote = self.resolve(path)?;
        if remote.is_root() {
            return Ok(true);
        }

        let file = self.client.get_file_properties(remote.as_str()).await;
        if self.found(file, &remote)?.is_some() {
            return Ok(true);
        }

        let dir = self.client.get_directory_properties(remote.as_str()).await;
        let exists = self.found(dir, &remote)?.is_some();
        if !exists {
            tracing::trace!(remote = %remote, "not found");
        }
        Ok(exists)
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn read(&self, path: &str) -> AdapterResult<Bytes> {
        let stream = self.read_stream(path).await?;
        collect_stream(stream).await
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn read_stream(&self, path: &str) -> AdapterResult<ByteStream> {
        let remote = self.file_target(path)?;
        self.client
            .read_file(remote.as_str())
            .await
            .map_err(|fault| self.fault(fault, &remote))
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        options: &WriteOptions,
    ) -> AdapterResult<MetadataRecord> {
        options.ensure_supported()?;
        let remote = self.file_target(path)?;
        self.directories().ensure_ancestry(&remote).await?;

        let file_options = FileOptions {
            content_type: options.content_type.clone(),
        };
        let entry = self
            .client
            .create_file(remote.as_str(), contents, &file_options)
            .await
            .map_err(|fault| self.fault(fault, &remote))?;
        self.mapper().to_metadata(&entry)
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        options: &WriteOptions,
    ) -> AdapterResult<MetadataRecord> {
        options.ensure_supported()?;
        self.file_target(path)?;
        let contents = collect_stream(stream).await?;
        self.write(path, contents, options).await
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn update(&self, path: &str, contents: Bytes) -> AdapterResult<MetadataRecord> {
        let remote = self.file_target(path)?;
        let entry = self
            .client
            .put_file_content(remote.as_str(), contents)
            .await
            .map_err(|fault| self.fault(fault, &remote))?;
        self.mapper().to_metadata(&entry)
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn update_stream(
        &self,
        path: &str,
        stream: ByteStream,
    ) -> AdapterResult<MetadataRecord> {
        self.file_target(path)?;
        let contents = collect_stream(stream).await?;
        self.update(path, contents).await
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn delete(&self, path: &str) -> AdapterResult<()> {
        let remote = self.file_target(path)?;
        self.client
            .delete_file(remote.as_str())
            .await
            .map_err(|fault| self.fault(fault, &remote))
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn delete_dir(&self, path: &str) -> AdapterResult<()> {
        let remote = self.resolve(path)?;
        self.directories()
            .delete_recursive(&remote, self.recursive_delete)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn create_dir(&self, path: &str) -> AdapterResult<MetadataRecord> {
        let remote = self.resolve(path)?;
        self.directories().create_directory(&remote).await?;

        let entry = self
            .client
            .get_directory_properties(remote.as_str())
            .await
            .map_err(|fault| self.fault(fault, &remote))?;
        self.mapper().to_metadata(&entry)
    }

    #[tracing::instrument(skip_all, fields(path = path, recursive = recursive))]
    async fn list_contents(
        &self,
        path: &str,
        recursive: bool,
    ) -> AdapterResult<Vec<MetadataRecord>> {
        let directories = self.directories();
        let mapper = self.mapper();

        let mut records = Vec::new();
        let mut pending = VecDeque::from([self.resolve(path)?]);
        while let Some(dir) = pending.pop_front() {
            let children = match directories.list_children(&dir).await {
                Ok(children) => children,
                Err(err) if err.is_not_found() => continue,
                Err(err) => return Err(err),
            };
            for entry in children {
                records.push(mapper.to_metadata(&entry)?);
                if recursive && entry.kind.is_dir() {
                    pending.push_back(RemotePath::from_remote(entry.path));
                }
            }
        }
        Ok(records)
    }

    #[tracing::instrument(skip_all, fields(src = src, dst = dst))]
    async fn rename(&self, src: &str, dst: &str) -> AdapterResult<()> {
        self.copy(src, dst).await?;
        self.delete(src).await
    }

    #[tracing::instrument(skip_all, fields(src = src, dst = dst))]
    async fn copy(&self, src: &str, dst: &str) -> AdapterResult<()> {
        let contents = self.read(src).await?;
        self.write(dst, contents, &WriteOptions::default()).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(path = path))]
    async fn get_metadata(&self, path: &str) -> AdapterResult<MetadataRecord> {
        let remote = self.resolve(path)?;

        let file = self.client.get_file_properties(remote.as_str()).await;
        let entry = match self.found(file, &remote)? {
            Some(entry) => entry,
            None => self
                .client
                .get_directory_properties(remote.as_str())
                .await
                .map_err(|fault| self.fault(fault, &remote))?,
        };
        self.mapper().to_metadata(&entry)
    }

    async fn set_visibility(&self, _path: &str, _visibility: Visibility) -> AdapterResult<()> {
        Err(AdapterError::CapabilityUnsupported("set_visibility"))
    }

    async fn get_visibility(&self, _path: &str) -> AdapterResult<Visibility> {
        Err(AdapterError::CapabilityUnsupported("get_visibility"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharefs_remote::{FaultCode, MemoryShare, ShareCall, ShareOp};

    fn adapter(share: &MemoryShare, prefix: &str) -> ShareFileAdapter {
        let client: Arc<dyn ShareClient> = Arc::new(share.clone());
        ShareFileAdapter::with_prefix(client, &ShareConfig::new("test"), prefix).unwrap()
    }

    #[tokio::test]
    async fn test_has_uses_properties_calls() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        assert!(!fs.has("missing.txt").await.unwrap());
        assert_eq!(
            share.calls(),
            vec![
                ShareCall::new(ShareOp::GetFileProperties, "p/missing.txt"),
                ShareCall::new(ShareOp::GetDirectoryProperties, "p/missing.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_has_answers_true_for_directories() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        fs.create_dir("d").await.unwrap();
        assert!(fs.has("d").await.unwrap());
        assert!(fs.has("d/").await.unwrap());
    }

    #[tokio::test]
    async fn test_has_propagates_transport_faults() {
        let share = MemoryShare::new();
        share.inject_fault(ShareOp::GetFileProperties, "p/a", FaultCode::OperationTimedOut);
        let fs = adapter(&share, "p");

        let err = fs.has("a").await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport { ref path, .. } if path == "a"));
    }

    #[tokio::test]
    async fn test_write_creates_prefix_and_ancestry() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        let record = fs
            .write("a/b.txt", Bytes::from_static(b"x"), &WriteOptions::default())
            .await
            .unwrap();
        assert_eq!(record.path, "a/b.txt");
        assert_eq!(record.size, 1);
        assert_eq!(
            share.calls(),
            vec![
                ShareCall::new(ShareOp::CreateDirectory, "p"),
                ShareCall::new(ShareOp::CreateDirectory, "p/a"),
                ShareCall::new(ShareOp::CreateFile, "p/a/b.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_write_rejects_private_before_any_call() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        let options = WriteOptions {
            visibility: Some(Visibility::Private),
            content_type: None,
        };
        let err = fs
            .write("a.txt", Bytes::from_static(b"x"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::CapabilityUnsupported(_)));
        assert!(share.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_issues_single_call() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        let err = fs
            .update("y.txt", Bytes::from_static(b"c"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(ref p) if p == "y.txt"));
        assert_eq!(
            share.calls(),
            vec![ShareCall::new(ShareOp::PutFileContent, "p/y.txt")]
        );
    }

    #[tokio::test]
    async fn test_root_is_not_a_file() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "");

        assert!(matches!(
            fs.read("").await,
            Err(AdapterError::InvalidPath(_))
        ));
        assert!(fs.has("").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_metadata_falls_back_to_directory() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        fs.create_dir("d").await.unwrap();
        let record = fs.get_metadata("d").await.unwrap();
        assert!(record.is_dir());
        assert_eq!(record.path, "d");

        assert!(fs.get_metadata("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_content_type_round_trips() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p");

        let options = WriteOptions::public().with_content_type("text/plain");
        fs.write("a.txt", Bytes::from_static(b"x"), &options)
            .await
            .unwrap();
        assert_eq!(
            fs.get_mimetype("a.txt").await.unwrap().as_deref(),
            Some("text/plain")
        );
        assert_eq!(fs.get_size("a.txt").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_debug_hides_client() {
        let share = MemoryShare::new();
        let fs = adapter(&share, "p1/p2");
        let rendered = format!("{fs:?}");
        assert!(rendered.contains("ShareFileAdapter"));
        assert!(rendered.contains("recursive_delete: true"));
    }
}

//! Local-directory file share.
//!
//! `LocalShare` implements [`ShareClient`] on top of `tokio::fs`, holding a
//! local directory to the same rules as the remote service: no implicit
//! parents, create-only file creation, non-creating content replacement and
//! one-level directory deletion.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::client::ShareClient;
use crate::error::{FaultCode, RemoteFault, RemoteResult};
use crate::types::{ByteStream, FileOptions, ListPage, RemoteEntry, join_path};

/// A [`ShareClient`] backed by a directory on local disk.
#[derive(Debug, Clone)]
pub struct LocalShare {
    root: PathBuf,
}

impl LocalShare {
    /// Opens the share rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `ShareNotFound` if `root` is not an existing directory.
    pub async fn open(root: impl Into<PathBuf>) -> RemoteResult<Self> {
        let root = root.into();
        match fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(root = %root.display(), "opened local share");
                Ok(Self { root })
            }
            _ => Err(RemoteFault::new(
                FaultCode::ShareNotFound,
                format!("share root is not a directory: {}", root.display()),
            )),
        }
    }

    /// Local directory holding the share.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a remote path beneath the root, refusing anything that would leave it.
    fn local_path(&self, path: &str) -> RemoteResult<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(RemoteFault::new(
                FaultCode::Other("InvalidResourceName".to_string()),
                format!("invalid resource name: {path}"),
            ));
        }
        Ok(self.root.join(relative))
    }

    async fn entry(&self, path: &str, local: &Path) -> RemoteResult<RemoteEntry> {
        let meta = fs::metadata(local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok(if meta.is_dir() {
            RemoteEntry::directory(path, modified)
        } else {
            RemoteEntry::file(path, meta.len(), modified)
        })
    }

    async fn require_file(&self, path: &str) -> RemoteResult<PathBuf> {
        let local = self.local_path(path)?;
        match fs::metadata(&local).await {
            Ok(meta) if meta.is_file() => Ok(local),
            Ok(_) => Err(RemoteFault::not_found(path)),
            Err(e) => Err(fault_from_io(e, path, FaultCode::ResourceNotFound)),
        }
    }

    async fn require_parent_dir(&self, path: &str, local: &Path) -> RemoteResult<()> {
        let parent = local.parent().unwrap_or(&self.root);
        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(RemoteFault::parent_not_found(path)),
        }
    }
}

/// Maps an I/O error onto the fault the service would report.
///
/// `missing` is the code to use for `NotFound`, which depends on whether the
/// call addressed the resource itself or needed its parent.
fn fault_from_io(err: std::io::Error, path: &str, missing: FaultCode) -> RemoteFault {
    let code = match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => missing,
        ErrorKind::AlreadyExists => FaultCode::ResourceAlreadyExists,
        ErrorKind::DirectoryNotEmpty => FaultCode::DirectoryNotEmpty,
        ErrorKind::TimedOut => FaultCode::OperationTimedOut,
        ErrorKind::Interrupted => FaultCode::OperationCancelled,
        kind => {
            tracing::debug!(path, error = %err, "unclassified io error");
            FaultCode::Other(format!("{kind:?}"))
        }
    };
    RemoteFault::new(code, format!("{path}: {err}"))
}

#[async_trait]
impl ShareClient for LocalShare {
    async fn create_directory(&self, path: &str) -> RemoteResult<()> {
        if path.is_empty() {
            return Err(RemoteFault::already_exists(path));
        }
        let local = self.local_path(path)?;
        fs::create_dir(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ParentNotFound))
    }

    async fn get_directory_properties(&self, path: &str) -> RemoteResult<RemoteEntry> {
        let local = self.local_path(path)?;
        let entry = self.entry(path, &local).await?;
        if entry.kind.is_dir() {
            Ok(entry)
        } else {
            Err(RemoteFault::not_found(path))
        }
    }

    async fn delete_directory(&self, path: &str) -> RemoteResult<()> {
        if path.is_empty() {
            return Err(RemoteFault::new(
                FaultCode::Other("OperationNotAllowedOnRoot".to_string()),
                "the share root cannot be deleted",
            ));
        }
        let local = self.local_path(path)?;
        match fs::metadata(&local).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(RemoteFault::not_found(path)),
            Err(e) => return Err(fault_from_io(e, path, FaultCode::ResourceNotFound)),
        }
        fs::remove_dir(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))
    }

    async fn list_directory(&self, path: &str, _marker: Option<&str>) -> RemoteResult<ListPage> {
        let local = self.local_path(path)?;
        let mut dir = fs::read_dir(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;

        let mut entries = Vec::new();
        while let Some(child) = dir
            .next_entry()
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?
        {
            let name = child.file_name().to_string_lossy().into_owned();
            let child_path = join_path(path, &name);
            match self.entry(&child_path, &child.path()).await {
                Ok(entry) => entries.push(entry),
                // Removed between read_dir and stat.
                Err(fault) if fault.code.is_not_found() => continue,
                Err(fault) => return Err(fault),
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(ListPage {
            entries,
            next_marker: None,
        })
    }

    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        _options: &FileOptions,
    ) -> RemoteResult<RemoteEntry> {
        let local = self.local_path(path)?;
        self.require_parent_dir(path, &local).await?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ParentNotFound))?;
        write_or_discard(file, &content, &local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;

        self.entry(path, &local).await
    }

    async fn get_file_properties(&self, path: &str) -> RemoteResult<RemoteEntry> {
        let local = self.require_file(path).await?;
        self.entry(path, &local).await
    }

    async fn read_file(&self, path: &str) -> RemoteResult<ByteStream> {
        let local = self.require_file(path).await?;
        let file = fs::File::open(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;
        Ok(ReaderStream::new(file).boxed())
    }

    async fn put_file_content(&self, path: &str, content: Bytes) -> RemoteResult<RemoteEntry> {
        let local = self.require_file(path).await?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;
        file.write_all(&content)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;
        file.flush()
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))?;

        self.entry(path, &local).await
    }

    async fn delete_file(&self, path: &str) -> RemoteResult<()> {
        let local = self.require_file(path).await?;
        fs::remove_file(&local)
            .await
            .map_err(|e| fault_from_io(e, path, FaultCode::ResourceNotFound))
    }
}

/// Writes the body of a freshly created file.
///
/// On failure the file is removed again so the path stays free for a retry.
async fn write_or_discard<W>(mut writer: W, content: &[u8], local: &Path) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match writer.write_all(content).await {
        Ok(()) => writer.flush().await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        drop(writer);
        if let Err(cleanup) = fs::remove_file(local).await {
            tracing::warn!(
                path = %local.display(),
                error = %cleanup,
                "failed to remove partial file"
            );
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    async fn share() -> (TempDir, LocalShare) {
        let temp_dir = TempDir::new().unwrap();
        let share = LocalShare::open(temp_dir.path()).await.unwrap();
        (temp_dir, share)
    }

    #[tokio::test]
    async fn test_open_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let err = LocalShare::open(temp_dir.path().join("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.code, FaultCode::ShareNotFound);
    }

    #[tokio::test]
    async fn test_create_file_and_read_back() {
        let (temp_dir, share) = share().await;

        let entry = share
            .create_file("a.txt", Bytes::from_static(b"hello"), &FileOptions::default())
            .await
            .unwrap();
        assert_eq!(entry.size, 5);
        assert!(entry.kind.is_file());
        assert!(temp_dir.path().join("a.txt").is_file());

        let chunks: Vec<Bytes> = share
            .read_file("a.txt")
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.concat(), b"hello");
    }

    #[tokio::test]
    async fn test_create_file_precondition() {
        let (_temp_dir, share) = share().await;
        share
            .create_file("a.txt", Bytes::from_static(b"1"), &FileOptions::default())
            .await
            .unwrap();

        let err = share
            .create_file("a.txt", Bytes::from_static(b"2"), &FileOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, FaultCode::ResourceAlreadyExists);
    }

    #[tokio::test]
    async fn test_no_implicit_parents() {
        let (_temp_dir, share) = share().await;

        let err = share
            .create_file("x/y.txt", Bytes::new(), &FileOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, FaultCode::ParentNotFound);

        let err = share.create_directory("x/y").await.unwrap_err();
        assert_eq!(err.code, FaultCode::ParentNotFound);
    }

    #[tokio::test]
    async fn test_put_requires_existing_file() {
        let (_temp_dir, share) = share().await;
        let err = share
            .put_file_content("ghost.txt", Bytes::from_static(b"c"))
            .await
            .unwrap_err();
        assert_eq!(err.code, FaultCode::ResourceNotFound);

        share
            .create_file("real.txt", Bytes::from_static(b"longer"), &FileOptions::default())
            .await
            .unwrap();
        let entry = share
            .put_file_content("real.txt", Bytes::from_static(b"c"))
            .await
            .unwrap();
        assert_eq!(entry.size, 1);
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let (_temp_dir, share) = share().await;
        share.create_directory("d").await.unwrap();

        let err = share.get_file_properties("d").await.unwrap_err();
        assert_eq!(err.code, FaultCode::ResourceNotFound);
        assert!(share.get_directory_properties("d").await.unwrap().kind.is_dir());
    }

    #[tokio::test]
    async fn test_delete_directory_not_empty() {
        let (_temp_dir, share) = share().await;
        share.create_directory("d").await.unwrap();
        share
            .create_file("d/f", Bytes::new(), &FileOptions::default())
            .await
            .unwrap();

        let err = share.delete_directory("d").await.unwrap_err();
        assert_eq!(err.code, FaultCode::DirectoryNotEmpty);

        share.delete_file("d/f").await.unwrap();
        share.delete_directory("d").await.unwrap();

        let err = share.delete_directory("d").await.unwrap_err();
        assert_eq!(err.code, FaultCode::ResourceNotFound);
    }

    #[tokio::test]
    async fn test_list_directory_sorted() {
        let (_temp_dir, share) = share().await;
        share.create_directory("d").await.unwrap();
        share.create_directory("d/sub").await.unwrap();
        share
            .create_file("d/b.txt", Bytes::new(), &FileOptions::default())
            .await
            .unwrap();
        share
            .create_file("d/a.txt", Bytes::new(), &FileOptions::default())
            .await
            .unwrap();

        let page = share.list_directory("d", None).await.unwrap();
        let paths: Vec<_> = page.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["d/a.txt", "d/b.txt", "d/sub"]);
        assert!(page.next_marker.is_none());
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let (_temp_dir, share) = share().await;
        let err = share.get_file_properties("../etc/passwd").await.unwrap_err();
        assert_eq!(err.code, FaultCode::Other("InvalidResourceName".to_string()));
    }

    /// Accepts nothing; every write fails.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::other("no space left")))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_body_write_frees_the_path() {
        let (temp_dir, share) = share().await;
        let local = temp_dir.path().join("partial.txt");
        std::fs::write(&local, b"").unwrap();

        let err = write_or_discard(FullDisk, b"payload", &local)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no space left");
        assert!(!local.exists());

        share
            .create_file("partial.txt", Bytes::from_static(b"payload"), &FileOptions::default())
            .await
            .unwrap();
        assert_eq!(std::fs::read(&local).unwrap(), b"payload");
    }
}

//! Directory handling on top of the share's one-level primitives.
//!
//! The generic contract creates parent directories implicitly and deletes
//! directory trees in one call. The share does neither: every ancestor must be
//! created explicitly (parent first) and a directory can only be deleted once
//! it is empty. `DirectoryOperator` bridges the two.

use sharefs_remote::{EntryKind, FaultCode, RemoteEntry, ShareClient};

use crate::error::{AdapterError, AdapterResult};
use crate::path::{PathPrefix, RemotePath};

/// Counts of resources removed by a recursive delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteStats {
    /// Files deleted.
    pub files: usize,
    /// Directories deleted.
    pub directories: usize,
}

/// A directory waiting in the delete walk.
struct Frame {
    dir: RemotePath,
    /// Children already handled; the directory itself is next.
    children_done: bool,
}

/// Creates directory chains and deletes directory trees.
#[derive(Clone, Copy)]
pub struct DirectoryOperator<'a> {
    client: &'a dyn ShareClient,
    prefix: &'a PathPrefix,
}

impl<'a> DirectoryOperator<'a> {
    /// Creates an operator issuing calls through `client`.
    ///
    /// `prefix` is only used to render logical paths in errors.
    pub fn new(client: &'a dyn ShareClient, prefix: &'a PathPrefix) -> Self {
        Self { client, prefix }
    }

    fn fault(&self, fault: sharefs_remote::RemoteFault, path: &RemotePath) -> AdapterError {
        AdapterError::from_fault(fault, self.prefix.logical_display(path))
    }

    /// Creates one directory, treating an existing directory as success.
    ///
    /// A file already at `dir` is `AlreadyExists`.
    async fn create_one(&self, dir: &RemotePath) -> AdapterResult<()> {
        tracing::debug!(path = %dir, "create_directory");
        match self.client.create_directory(dir.as_str()).await {
            Ok(()) => Ok(()),
            Err(fault) if fault.code == FaultCode::ResourceAlreadyExists => {
                tracing::debug!(path = %dir, "get_directory_properties");
                match self.client.get_directory_properties(dir.as_str()).await {
                    Ok(_) => Ok(()),
                    Err(props) if props.code.is_not_found() => Err(AdapterError::AlreadyExists(
                        self.prefix.logical_display(dir),
                    )),
                    Err(props) => Err(self.fault(props, dir)),
                }
            }
            Err(fault) => Err(self.fault(fault, dir)),
        }
    }

    /// Fails with `InvalidPath` if `path` names a file rather than a directory.
    async fn refuse_file(&self, path: &RemotePath) -> AdapterResult<()> {
        tracing::debug!(path = %path, "get_file_properties");
        match self.client.get_file_properties(path.as_str()).await {
            Ok(_) => Err(AdapterError::InvalidPath(format!(
                "{} is a file, not a directory",
                self.prefix.logical_display(path)
            ))),
            Err(fault) if fault.code.is_not_found() => Ok(()),
            Err(fault) => Err(self.fault(fault, path)),
        }
    }

    /// Makes sure every directory above `path` exists.
    ///
    /// Ancestors are created root-to-leaf, including the prefix directories;
    /// the share rejects a child whose parent is missing.
    pub async fn ensure_ancestry(&self, path: &RemotePath) -> AdapterResult<()> {
        for dir in path.ancestors() {
            self.create_one(&dir).await?;
        }
        Ok(())
    }

    /// Creates `path` and all missing ancestors. Idempotent.
    pub async fn create_directory(&self, path: &RemotePath) -> AdapterResult<()> {
        if path.is_root() {
            return Ok(());
        }
        self.ensure_ancestry(path).await?;
        self.create_one(path).await
    }

    /// Lists every immediate child of `dir`, following continuation markers.
    pub async fn list_children(&self, dir: &RemotePath) -> AdapterResult<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            tracing::debug!(path = %dir, marker = ?marker, "list_directory");
            let page = self
                .client
                .list_directory(dir.as_str(), marker.as_deref())
                .await
                .map_err(|fault| self.fault(fault, dir))?;
            entries.extend(page.entries);
            match page.next_marker {
                Some(next) => marker = Some(next),
                None => break,
            }
        }
        Ok(entries)
    }

    /// Deletes a file, returning false if it was already gone.
    async fn delete_file_if_present(&self, file: &RemotePath) -> AdapterResult<bool> {
        tracing::debug!(path = %file, "delete_file");
        match self.client.delete_file(file.as_str()).await {
            Ok(()) => Ok(true),
            Err(fault) if fault.code.is_not_found() => Ok(false),
            Err(fault) => Err(self.fault(fault, file)),
        }
    }

    /// Deletes an empty directory, returning false if it was already gone.
    async fn delete_directory_if_present(&self, dir: &RemotePath) -> AdapterResult<bool> {
        tracing::debug!(path = %dir, "delete_directory");
        match self.client.delete_directory(dir.as_str()).await {
            Ok(()) => Ok(true),
            Err(fault) if fault.code.is_not_found() => Ok(false),
            Err(fault) => Err(self.fault(fault, dir)),
        }
    }

    /// Deletes the directory at `path`.
    ///
    /// With `allow_recursive`, the subtree is removed bottom-up: files are
    /// deleted as their directory is listed, and each directory is deleted
    /// after everything below it. Without it, only `path` itself is deleted
    /// and a non-empty directory fails with `DirectoryNotEmpty`.
    ///
    /// A directory that does not exist counts as deleted; a file at `path` is
    /// `InvalidPath` and is left in place. Calls are issued one
    /// at a time; if one fails, what was deleted stays deleted and a repeated
    /// call picks up the remainder.
    ///
    /// The share root is emptied but never deleted itself.
    pub async fn delete_recursive(
        &self,
        path: &RemotePath,
        allow_recursive: bool,
    ) -> AdapterResult<DeleteStats> {
        let mut stats = DeleteStats::default();

        if !allow_recursive {
            if path.is_root() {
                if !self.list_children(path).await?.is_empty() {
                    return Err(AdapterError::DirectoryNotEmpty(String::new()));
                }
            } else if self.delete_directory_if_present(path).await? {
                stats.directories += 1;
            } else {
                self.refuse_file(path).await?;
            }
            return Ok(stats);
        }

        let mut stack = vec![Frame {
            dir: path.clone(),
            children_done: false,
        }];

        while let Some(frame) = stack.pop() {
            if frame.children_done {
                if !frame.dir.is_root() && self.delete_directory_if_present(&frame.dir).await? {
                    stats.directories += 1;
                }
                continue;
            }

            let children = match self.list_children(&frame.dir).await {
                Ok(children) => children,
                Err(err) if err.is_not_found() => {
                    if frame.dir == *path {
                        self.refuse_file(path).await?;
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            stack.push(Frame {
                dir: frame.dir,
                children_done: true,
            });

            for child in children {
                let child_path = RemotePath::from_remote(child.path);
                match child.kind {
                    EntryKind::File => {
                        if self.delete_file_if_present(&child_path).await? {
                            stats.files += 1;
                        }
                    }
                    EntryKind::Directory => stack.push(Frame {
                        dir: child_path,
                        children_done: false,
                    }),
                }
            }
        }

        tracing::info!(
            path = %path,
            files = stats.files,
            directories = stats.directories,
            "recursive delete finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use sharefs_remote::{FileOptions, MemoryShare, ShareCall, ShareOp};

    async fn seed_file(share: &MemoryShare, path: &str) {
        share
            .create_file(path, Bytes::from_static(b"x"), &FileOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_ancestry_root_to_leaf() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::parse("p1").unwrap();
        let ops = DirectoryOperator::new(&share, &prefix);

        let target = prefix.resolve("foo/bar/baz.txt").unwrap();
        ops.ensure_ancestry(&target).await.unwrap();

        assert_eq!(
            share.calls(),
            vec![
                ShareCall::new(ShareOp::CreateDirectory, "p1"),
                ShareCall::new(ShareOp::CreateDirectory, "p1/foo"),
                ShareCall::new(ShareOp::CreateDirectory, "p1/foo/bar"),
            ]
        );
        assert!(share.is_dir("p1/foo/bar"));
        assert!(!share.exists("p1/foo/bar/baz.txt"));
    }

    #[tokio::test]
    async fn test_ensure_ancestry_is_idempotent() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        let target = prefix.resolve("a/b/c.txt").unwrap();
        ops.ensure_ancestry(&target).await.unwrap();
        ops.ensure_ancestry(&target).await.unwrap();
        assert!(share.is_dir("a/b"));
    }

    #[tokio::test]
    async fn test_ensure_ancestry_propagates_other_faults() {
        let share = MemoryShare::new();
        share.inject_fault(ShareOp::CreateDirectory, "a", FaultCode::OperationTimedOut);
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        let err = ops
            .ensure_ancestry(&prefix.resolve("a/b.txt").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_ensure_ancestry_rejects_file_in_the_way() {
        let share = MemoryShare::new();
        seed_file(&share, "f.txt").await;
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        let err = ops
            .ensure_ancestry(&prefix.resolve("f.txt/child").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::AlreadyExists(ref p) if p == "f.txt"));

        let err = ops
            .create_directory(&prefix.resolve("f.txt").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::AlreadyExists(ref p) if p == "f.txt"));
        assert!(share.file_content("f.txt").is_some());
    }

    #[tokio::test]
    async fn test_delete_recursive_post_order() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.resolve("d/sub").unwrap())
            .await
            .unwrap();
        seed_file(&share, "d/a.txt").await;
        seed_file(&share, "d/sub/b.txt").await;
        share.clear_calls();

        let stats = ops
            .delete_recursive(&prefix.resolve("d").unwrap(), true)
            .await
            .unwrap();
        assert_eq!(
            stats,
            DeleteStats {
                files: 2,
                directories: 2
            }
        );
        assert!(!share.exists("d"));

        let deletions: Vec<_> = share
            .calls()
            .into_iter()
            .filter(|c| c.op != ShareOp::ListDirectory)
            .collect();
        assert_eq!(
            deletions,
            vec![
                ShareCall::new(ShareOp::DeleteFile, "d/a.txt"),
                ShareCall::new(ShareOp::DeleteFile, "d/sub/b.txt"),
                ShareCall::new(ShareOp::DeleteDirectory, "d/sub"),
                ShareCall::new(ShareOp::DeleteDirectory, "d"),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_recursive_missing_directory() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::parse("never").unwrap();
        let ops = DirectoryOperator::new(&share, &prefix);

        let stats = ops
            .delete_recursive(&prefix.resolve("created").unwrap(), true)
            .await
            .unwrap();
        assert_eq!(stats, DeleteStats::default());

        let stats = ops
            .delete_recursive(&prefix.resolve("created").unwrap(), false)
            .await
            .unwrap();
        assert_eq!(stats, DeleteStats::default());
    }

    #[tokio::test]
    async fn test_delete_recursive_refuses_file_target() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::parse("p").unwrap();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.as_remote()).await.unwrap();
        seed_file(&share, "p/f.txt").await;

        let target = prefix.resolve("f.txt").unwrap();
        for allow_recursive in [true, false] {
            let err = ops
                .delete_recursive(&target, allow_recursive)
                .await
                .unwrap_err();
            assert!(matches!(err, AdapterError::InvalidPath(ref m) if m.contains("f.txt")));
        }
        assert!(share.file_content("p/f.txt").is_some());
    }

    #[tokio::test]
    async fn test_delete_non_recursive_refuses_non_empty() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::parse("p").unwrap();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.resolve("d").unwrap())
            .await
            .unwrap();
        seed_file(&share, "p/d/a.txt").await;

        let err = ops
            .delete_recursive(&prefix.resolve("d").unwrap(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::DirectoryNotEmpty(ref p) if p == "d"));
        assert!(share.exists("p/d/a.txt"));
    }

    #[tokio::test]
    async fn test_delete_recursive_resumes_after_failure() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.resolve("d").unwrap())
            .await
            .unwrap();
        seed_file(&share, "d/a.txt").await;
        seed_file(&share, "d/b.txt").await;
        share.inject_fault(ShareOp::DeleteFile, "d/b.txt", FaultCode::OperationTimedOut);

        let dir = prefix.resolve("d").unwrap();
        let err = ops.delete_recursive(&dir, true).await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport { .. }));
        assert!(!share.exists("d/a.txt"));
        assert!(share.exists("d/b.txt"));

        let stats = ops.delete_recursive(&dir, true).await.unwrap();
        assert_eq!(stats.files, 1);
        assert!(!share.exists("d"));
    }

    #[tokio::test]
    async fn test_delete_recursive_on_root_keeps_root() {
        let share = MemoryShare::new();
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.resolve("x/y").unwrap())
            .await
            .unwrap();
        seed_file(&share, "top.txt").await;

        ops.delete_recursive(&RemotePath::root(), true).await.unwrap();
        assert!(share.is_empty());
    }

    #[tokio::test]
    async fn test_list_children_follows_markers() {
        let share = MemoryShare::new().with_page_size(2);
        let prefix = PathPrefix::none();
        let ops = DirectoryOperator::new(&share, &prefix);

        ops.create_directory(&prefix.resolve("d").unwrap())
            .await
            .unwrap();
        for i in 0..5 {
            seed_file(&share, &format!("d/f{i}")).await;
        }

        let children = ops
            .list_children(&prefix.resolve("d").unwrap())
            .await
            .unwrap();
        assert_eq!(children.len(), 5);
    }
}

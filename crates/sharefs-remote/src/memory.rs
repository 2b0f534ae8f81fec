//! In-memory file share for testing.
//!
//! `MemoryShare` implements [`ShareClient`] over a sorted map, reproducing the
//! share's REST semantics: parents must exist, creation is create-only,
//! content replacement never creates, directories are deleted one level at a
//! time and listings are paged. It also records every call and can be told to
//! fail a specific call, so tests can assert the exact sequence of remote
//! round-trips an adapter issues.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::{Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::client::ShareClient;
use crate::error::{FaultCode, RemoteFault, RemoteResult};
use crate::types::{ByteStream, FileOptions, ListPage, RemoteEntry, parent_path};

/// Default number of entries per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Size of the chunks a file body is streamed in.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// The remote operation a recorded call issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShareOp {
    /// [`ShareClient::create_directory`]
    CreateDirectory,
    /// [`ShareClient::get_directory_properties`]
    GetDirectoryProperties,
    /// [`ShareClient::delete_directory`]
    DeleteDirectory,
    /// [`ShareClient::list_directory`], one call per page.
    ListDirectory,
    /// [`ShareClient::create_file`]
    CreateFile,
    /// [`ShareClient::get_file_properties`]
    GetFileProperties,
    /// [`ShareClient::read_file`]
    ReadFile,
    /// [`ShareClient::put_file_content`]
    PutFileContent,
    /// [`ShareClient::delete_file`]
    DeleteFile,
}

impl fmt::Display for ShareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShareOp::CreateDirectory => "create_directory",
            ShareOp::GetDirectoryProperties => "get_directory_properties",
            ShareOp::DeleteDirectory => "delete_directory",
            ShareOp::ListDirectory => "list_directory",
            ShareOp::CreateFile => "create_file",
            ShareOp::GetFileProperties => "get_file_properties",
            ShareOp::ReadFile => "read_file",
            ShareOp::PutFileContent => "put_file_content",
            ShareOp::DeleteFile => "delete_file",
        };
        f.write_str(name)
    }
}

/// A call recorded by [`MemoryShare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareCall {
    /// Operation issued.
    pub op: ShareOp,
    /// Remote path it addressed.
    pub path: String,
}

impl ShareCall {
    /// Creates a call record.
    pub fn new(op: ShareOp, path: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Bytes,
        modified: DateTime<Utc>,
        content_type: Option<String>,
    },
    Directory {
        modified: DateTime<Utc>,
    },
}

impl Node {
    fn entry(&self, path: &str) -> RemoteEntry {
        match self {
            Node::File {
                data,
                modified,
                content_type,
            } => RemoteEntry::file(path, data.len() as u64, *modified)
                .with_content_type(content_type.clone()),
            Node::Directory { modified } => RemoteEntry::directory(path, *modified),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    calls: Vec<ShareCall>,
    faults: Vec<(ShareOp, String, FaultCode)>,
}

impl State {
    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || matches!(self.nodes.get(path), Some(Node::Directory { .. }))
    }

    fn require_parent(&self, path: &str) -> RemoteResult<()> {
        match parent_path(path) {
            Some(parent) if self.is_dir(parent) => Ok(()),
            _ => Err(RemoteFault::parent_not_found(path)),
        }
    }

    /// Immediate children of `dir`, in name order.
    fn children<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = (&'a String, &'a Node)> + 'a {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(move |(key, _)| key.starts_with(&prefix))
            .filter(move |(key, _)| {
                let rest = &key[if dir.is_empty() { 0 } else { dir.len() + 1 }..];
                !rest.is_empty() && !rest.contains('/')
            })
    }
}

/// In-memory [`ShareClient`].
///
/// Cloning yields another handle to the same share, so a test can keep one
/// handle for inspection while adapters own the others.
///
/// # Examples
///
/// ```
/// use sharefs_remote::{FileOptions, MemoryShare, ShareClient};
/// use bytes::Bytes;
///
/// futures::executor::block_on(async {
///     let share = MemoryShare::new();
///     share.create_directory("docs").await.unwrap();
///     share
///         .create_file("docs/a.txt", Bytes::from_static(b"hi"), &FileOptions::default())
///         .await
///         .unwrap();
///     assert_eq!(share.file_content("docs/a.txt").unwrap(), "hi");
/// });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryShare {
    state: Arc<Mutex<State>>,
    page_size: usize,
}

impl Default for MemoryShare {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryShare {
    /// Creates an empty share containing only its root directory.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Limits listings to `page_size` entries per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fails the next `op` call addressing `path` with `code`.
    ///
    /// The fault fires once and is then discarded.
    pub fn inject_fault(&self, op: ShareOp, path: impl Into<String>, code: FaultCode) {
        self.state.lock().faults.push((op, path.into(), code));
    }

    /// Returns every call issued so far, oldest first.
    pub fn calls(&self) -> Vec<ShareCall> {
        self.state.lock().calls.clone()
    }

    /// Forgets the recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// True if a file or directory exists at `path`.
    pub fn exists(&self, path: &str) -> bool {
        path.is_empty() || self.state.lock().nodes.contains_key(path)
    }

    /// True if a directory exists at `path`.
    pub fn is_dir(&self, path: &str) -> bool {
        self.state.lock().is_dir(path)
    }

    /// Content of the file at `path`, if it is a file.
    pub fn file_content(&self, path: &str) -> Option<Bytes> {
        match self.state.lock().nodes.get(path) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Number of files and directories on the share, excluding the root.
    pub fn len(&self) -> usize {
        self.state.lock().nodes.len()
    }

    /// True if the share holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records the call, fires a matching injected fault, and hands out the state.
    fn enter(&self, op: ShareOp, path: &str) -> RemoteResult<MutexGuard<'_, State>> {
        let mut state = self.state.lock();
        state.calls.push(ShareCall::new(op, path));

        if let Some(idx) = state
            .faults
            .iter()
            .position(|(fault_op, fault_path, _)| *fault_op == op && fault_path == path)
        {
            let (_, _, code) = state.faults.remove(idx);
            return Err(RemoteFault::new(code, format!("injected fault: {op} {path}")));
        }

        Ok(state)
    }
}

#[async_trait]
impl ShareClient for MemoryShare {
    async fn create_directory(&self, path: &str) -> RemoteResult<()> {
        let mut state = self.enter(ShareOp::CreateDirectory, path)?;
        if path.is_empty() || state.nodes.contains_key(path) {
            return Err(RemoteFault::already_exists(path));
        }
        state.require_parent(path)?;
        state.nodes.insert(
            path.to_string(),
            Node::Directory {
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_directory_properties(&self, path: &str) -> RemoteResult<RemoteEntry> {
        let state = self.enter(ShareOp::GetDirectoryProperties, path)?;
        if path.is_empty() {
            return Ok(RemoteEntry::directory("", DateTime::<Utc>::default()));
        }
        match state.nodes.get(path) {
            Some(node @ Node::Directory { .. }) => Ok(node.entry(path)),
            _ => Err(RemoteFault::not_found(path)),
        }
    }

    async fn delete_directory(&self, path: &str) -> RemoteResult<()> {
        let mut state = self.enter(ShareOp::DeleteDirectory, path)?;
        if path.is_empty() {
            return Err(RemoteFault::new(
                FaultCode::Other("OperationNotAllowedOnRoot".to_string()),
                "the share root cannot be deleted",
            ));
        }
        if !matches!(state.nodes.get(path), Some(Node::Directory { .. })) {
            return Err(RemoteFault::not_found(path));
        }
        if state.children(path).next().is_some() {
            return Err(RemoteFault::directory_not_empty(path));
        }
        state.nodes.remove(path);
        Ok(())
    }

    async fn list_directory(&self, path: &str, marker: Option<&str>) -> RemoteResult<ListPage> {
        let state = self.enter(ShareOp::ListDirectory, path)?;
        if !state.is_dir(path) {
            return Err(RemoteFault::not_found(path));
        }

        let mut remaining = state
            .children(path)
            .map(|(key, node)| node.entry(key))
            .filter(|entry| marker.is_none_or(|m| entry.name() > m))
            .peekable();

        let mut entries = Vec::new();
        while entries.len() < self.page_size {
            match remaining.next() {
                Some(entry) => entries.push(entry),
                None => break,
            }
        }

        let next_marker = if remaining.peek().is_some() {
            entries.last().map(|entry| entry.name().to_string())
        } else {
            None
        };

        Ok(ListPage {
            entries,
            next_marker,
        })
    }

    async fn create_file(
        &self,
        path: &str,
        content: Bytes,
        options: &FileOptions,
    ) -> RemoteResult<RemoteEntry> {
        let mut state = self.enter(ShareOp::CreateFile, path)?;
        if path.is_empty() || state.nodes.contains_key(path) {
            return Err(RemoteFault::already_exists(path));
        }
        state.require_parent(path)?;

        let node = Node::File {
            data: content,
            modified: Utc::now(),
            content_type: options.content_type.clone(),
        };
        let entry = node.entry(path);
        state.nodes.insert(path.to_string(), node);
        Ok(entry)
    }

    async fn get_file_properties(&self, path: &str) -> RemoteResult<RemoteEntry> {
        let state = self.enter(ShareOp::GetFileProperties, path)?;
        match state.nodes.get(path) {
            Some(node @ Node::File { .. }) => Ok(node.entry(path)),
            _ => Err(RemoteFault::not_found(path)),
        }
    }

    async fn read_file(&self, path: &str) -> RemoteResult<ByteStream> {
        let state = self.enter(ShareOp::ReadFile, path)?;
        let data = match state.nodes.get(path) {
            Some(Node::File { data, .. }) => data.clone(),
            _ => return Err(RemoteFault::not_found(path)),
        };

        let chunks: Vec<std::io::Result<Bytes>> = (0..data.len())
            .step_by(READ_CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + READ_CHUNK_SIZE).min(data.len()))))
            .collect();
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn put_file_content(&self, path: &str, content: Bytes) -> RemoteResult<RemoteEntry> {
        let mut state = self.enter(ShareOp::PutFileContent, path)?;
        match state.nodes.get_mut(path) {
            Some(Node::File { data, modified, .. }) => {
                *data = content;
                *modified = Utc::now();
            }
            _ => return Err(RemoteFault::not_found(path)),
        }
        Ok(state.nodes[path].entry(path))
    }

    async fn delete_file(&self, path: &str) -> RemoteResult<()> {
        let mut state = self.enter(ShareOp::DeleteFile, path)?;
        match state.nodes.get(path) {
            Some(Node::File { .. }) => {
                state.nodes.remove(path);
                Ok(())
            }
            _ => Err(RemoteFault::not_found(path)),
        }
    }
}

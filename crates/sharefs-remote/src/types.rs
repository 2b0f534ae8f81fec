//! Resource descriptions returned by the file share.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

/// Lazily consumed file body.
///
/// Backed by the remote response (or an open local file); dropping the stream
/// releases the underlying resource.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Kind of a resource on the share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file with content.
    File,
    /// A directory.
    Directory,
}

impl EntryKind {
    /// Returns true if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// Properties of a single remote resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Full remote path (no leading slash; empty for the share root).
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Content length in bytes; zero for directories.
    pub size: u64,
    /// Last modification time reported by the service.
    pub last_modified: DateTime<Utc>,
    /// Content type set at creation, if any.
    pub content_type: Option<String>,
}

impl RemoteEntry {
    /// Describes a file.
    pub fn file(path: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            last_modified,
            content_type: None,
        }
    }

    /// Describes a directory.
    pub fn directory(path: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            last_modified,
            content_type: None,
        }
    }

    /// Sets the content type.
    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Final path segment (the entry's name within its directory).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// One page of a directory listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Immediate children of the listed directory.
    pub entries: Vec<RemoteEntry>,
    /// Continuation marker; `None` on the last page.
    pub next_marker: Option<String>,
}

/// Options applied when a file is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    /// Content type stored with the file.
    pub content_type: Option<String>,
}

/// Joins a directory path and a child name into a remote path.
pub fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Parent of a remote path; the share root is `""`, and the root has no parent.
pub fn parent_path(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rfind('/').map(|idx| &path[..idx]).unwrap_or(""))
}

//! Generic metadata records.
//!
//! Maps remote property and listing entries into the shape the generic
//! filesystem contract returns, with the adapter prefix stripped off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sharefs_remote::{EntryKind, RemoteEntry};

use crate::error::{AdapterError, AdapterResult};
use crate::path::PathPrefix;

/// Item type as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Regular file.
    File,
    /// Directory.
    Dir,
}

impl From<EntryKind> for ItemType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::File => ItemType::File,
            EntryKind::Directory => ItemType::Dir,
        }
    }
}

/// Visibility of an entry.
///
/// The share has no access-control concept, so every entry is reported as
/// [`Visibility::Public`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Readable by anyone with access to the share.
    #[default]
    Public,
    /// Restricted to the owner. Writes asking for it are refused.
    Private,
}

/// Metadata for a file or directory, in logical-path terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Logical path (prefix removed).
    pub path: String,
    /// File or directory.
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Last modification time.
    pub timestamp: DateTime<Utc>,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Always [`Visibility::Public`].
    pub visibility: Visibility,
    /// Content type, when the share stored one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl MetadataRecord {
    /// Returns true if this describes a file.
    pub fn is_file(&self) -> bool {
        self.kind == ItemType::File
    }

    /// Returns true if this describes a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == ItemType::Dir
    }
}

/// Converts remote entries into [`MetadataRecord`]s for one prefix.
#[derive(Debug, Clone, Copy)]
pub struct MetadataMapper<'a> {
    prefix: &'a PathPrefix,
}

impl<'a> MetadataMapper<'a> {
    /// Creates a mapper that strips `prefix` from remote paths.
    pub fn new(prefix: &'a PathPrefix) -> Self {
        Self { prefix }
    }

    /// Maps one remote entry.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidPath` if the entry lies outside the prefix.
    pub fn to_metadata(&self, entry: &RemoteEntry) -> AdapterResult<MetadataRecord> {
        let path = self.prefix.strip(&entry.path).ok_or_else(|| {
            AdapterError::InvalidPath(format!(
                "{} is outside prefix {}",
                entry.path, self.prefix
            ))
        })?;

        Ok(MetadataRecord {
            path,
            kind: entry.kind.into(),
            timestamp: entry.last_modified,
            size: if entry.kind.is_dir() { 0 } else { entry.size },
            visibility: Visibility::Public,
            mimetype: entry.content_type.clone(),
        })
    }
}

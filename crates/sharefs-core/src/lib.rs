//! sharefs core - filesystem adapter over a remote file share.
//!
//! This crate adapts a path-addressed remote file share (explicit
//! directories, no native "exists" call, one-level deletes) to a generic
//! filesystem contract with implicit parent creation, recursive directory
//! deletion and a uniform error taxonomy.
//!
//! # Architecture
//!
//! Each operation runs through a short pipeline:
//!
//! - [`path`]: resolves logical paths under the adapter's prefix
//! - [`directory`]: creates ancestor chains and deletes directory trees
//! - [`metadata`]: maps remote entries into generic metadata records
//! - [`error`]: the error taxonomy and the remote fault translation
//! - [`adapter`]: the operation adapter tying the above together
//! - [`filesystem`]: the generic contract the adapter implements
//! - [`config`]: the configuration bag adapters are built from
//!
//! # Example
//!
//! ```rust,ignore
//! use sharefs_core::{FilesystemAdapter, ShareConfig, ShareFileAdapter, WriteOptions};
//! use sharefs_remote::LocalShare;
//! use std::sync::Arc;
//!
//! let share = Arc::new(LocalShare::open("/srv/shares/assets").await?);
//! let config = ShareConfig::new("assets").with_prefix("tenant-a");
//! let fs = ShareFileAdapter::new(share, &config)?;
//!
//! fs.write("reports/q1.txt", "hello".into(), &WriteOptions::default()).await?;
//! for entry in fs.list_contents("reports", false).await? {
//!     println!("{} {}", entry.path, entry.size);
//! }
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod config;
pub mod directory;
pub mod error;
pub mod filesystem;
pub mod metadata;
pub mod path;

// Re-export core types for convenience
pub use adapter::ShareFileAdapter;
pub use config::ShareConfig;
pub use directory::{DeleteStats, DirectoryOperator};
pub use error::{AdapterError, AdapterResult};
pub use filesystem::{FilesystemAdapter, WriteOptions};
pub use metadata::{ItemType, MetadataMapper, MetadataRecord, Visibility};
pub use path::{PathPrefix, RemotePath};

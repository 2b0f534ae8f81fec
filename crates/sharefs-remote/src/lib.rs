//! sharefs-remote - the remote file share boundary.
//!
//! This crate describes what the adapter layer consumes from a network file
//! share: path-addressed directory and file resources, paged listings and
//! fault codes. It carries no adapter logic.
//!
//! - [`ShareClient`]: the path-addressed REST primitives
//! - [`RemoteFault`] / [`FaultCode`]: machine-readable failures
//! - [`MemoryShare`]: in-memory share for tests, with call recording and fault injection
//! - [`LocalShare`]: a local directory held to the share's rules

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod local;
pub mod memory;
pub mod types;

pub use client::ShareClient;
pub use error::{FaultCode, RemoteFault, RemoteResult};
pub use local::LocalShare;
pub use memory::{MemoryShare, ShareCall, ShareOp};
pub use types::{
    ByteStream, EntryKind, FileOptions, ListPage, RemoteEntry, join_path, parent_path,
};

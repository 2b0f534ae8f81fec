//! Error types for sharefs adapter operations.
//!
//! This module defines the generic filesystem error taxonomy callers see, and
//! the translation from remote share faults into it. All errors use
//! `thiserror`; the original remote fault is kept as the source of
//! [`AdapterError::Transport`] for diagnostics.

use sharefs_remote::{FaultCode, RemoteFault};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by filesystem operations on a share.
///
/// Paths carried by the variants are logical paths: the configured prefix is
/// never exposed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AdapterError {
    // Generic filesystem taxonomy
    /// Target file or directory does not exist.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Target already exists and the operation is create-only.
    #[error("path already exists: {0}")]
    AlreadyExists(String),

    /// Directory still has children and recursive delete is disabled.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// The share has no concept backing this operation.
    #[error("capability not supported: {0}")]
    CapabilityUnsupported(&'static str),

    /// Path is malformed or climbs above the root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Any remote failure not otherwise classified, including timeouts and cancellation.
    #[error("transport error on {path}: {source}")]
    Transport {
        /// Logical path the failed call addressed.
        path: String,
        /// Fault reported by the share.
        #[source]
        source: RemoteFault,
    },

    // Config errors
    /// Configuration file not found at the expected location.
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Error parsing configuration file.
    #[error("config parse error: {0}")]
    ConfigParseError(String),

    /// Invalid configuration detected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // IO errors
    /// Local IO error, e.g. from a caller-supplied stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Classifies a remote fault for the operation addressing `path`.
    ///
    /// `ResourceNotFound` and `ParentNotFound` both mean the target is absent;
    /// `ShareNotFound` is a misconfigured container, not a missing path, and
    /// stays a transport error.
    pub fn from_fault(fault: RemoteFault, path: impl Into<String>) -> Self {
        let path = path.into();
        match fault.code.clone() {
            FaultCode::ResourceNotFound | FaultCode::ParentNotFound => Self::NotFound(path),
            FaultCode::ResourceAlreadyExists => Self::AlreadyExists(path),
            FaultCode::DirectoryNotEmpty => Self::DirectoryNotEmpty(path),
            FaultCode::FeatureNotSupported => {
                Self::CapabilityUnsupported("feature not supported by share")
            }
            _ => Self::Transport {
                path,
                source: fault,
            },
        }
    }

    /// True if this is a [`AdapterError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias for sharefs operations.
///
/// All fallible adapter operations return this type, using [`AdapterError`] for error variants.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

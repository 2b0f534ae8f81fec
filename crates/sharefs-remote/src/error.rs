//! Faults reported by the remote file share.
//!
//! Every remote call either succeeds or fails with a [`RemoteFault`] carrying
//! the machine-readable condition code the service returned. Classifying those
//! codes into the generic filesystem taxonomy is the adapter's job; this crate
//! only transports them.

use std::fmt;
use thiserror::Error;

/// Machine-readable condition codes returned by the file service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FaultCode {
    /// The addressed file or directory does not exist.
    ResourceNotFound,
    /// A parent directory of the addressed resource does not exist.
    ParentNotFound,
    /// The share (container) itself does not exist.
    ShareNotFound,
    /// The resource already exists and the call required it not to.
    ResourceAlreadyExists,
    /// The directory still has children.
    DirectoryNotEmpty,
    /// The service does not support the requested feature.
    FeatureNotSupported,
    /// The request timed out before the service answered.
    OperationTimedOut,
    /// The request was cancelled by the caller.
    OperationCancelled,
    /// Any other code, kept verbatim.
    Other(String),
}

impl FaultCode {
    /// Returns the service's string form of this code.
    pub fn as_str(&self) -> &str {
        match self {
            FaultCode::ResourceNotFound => "ResourceNotFound",
            FaultCode::ParentNotFound => "ParentNotFound",
            FaultCode::ShareNotFound => "ShareNotFound",
            FaultCode::ResourceAlreadyExists => "ResourceAlreadyExists",
            FaultCode::DirectoryNotEmpty => "DirectoryNotEmpty",
            FaultCode::FeatureNotSupported => "FeatureNotSupported",
            FaultCode::OperationTimedOut => "OperationTimedOut",
            FaultCode::OperationCancelled => "OperationCancelled",
            FaultCode::Other(code) => code,
        }
    }

    /// True for the two codes that mean "the addressed path is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, FaultCode::ResourceNotFound | FaultCode::ParentNotFound)
    }
}

impl From<&str> for FaultCode {
    fn from(code: &str) -> Self {
        match code {
            "ResourceNotFound" => FaultCode::ResourceNotFound,
            "ParentNotFound" => FaultCode::ParentNotFound,
            "ShareNotFound" => FaultCode::ShareNotFound,
            "ResourceAlreadyExists" => FaultCode::ResourceAlreadyExists,
            "DirectoryNotEmpty" => FaultCode::DirectoryNotEmpty,
            "FeatureNotSupported" => FaultCode::FeatureNotSupported,
            "OperationTimedOut" => FaultCode::OperationTimedOut,
            "OperationCancelled" => FaultCode::OperationCancelled,
            other => FaultCode::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteFault {
    /// Condition code reported by the service.
    pub code: FaultCode,
    /// Human-readable detail, usually naming the remote path.
    pub message: String,
}

impl RemoteFault {
    /// Creates a fault with the given code and message.
    pub fn new(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a `ResourceNotFound` fault for `path`.
    pub fn not_found(path: &str) -> Self {
        Self::new(FaultCode::ResourceNotFound, format!("not found: {path}"))
    }

    /// Creates a `ParentNotFound` fault for `path`.
    pub fn parent_not_found(path: &str) -> Self {
        Self::new(
            FaultCode::ParentNotFound,
            format!("parent directory missing: {path}"),
        )
    }

    /// Creates a `ResourceAlreadyExists` fault for `path`.
    pub fn already_exists(path: &str) -> Self {
        Self::new(
            FaultCode::ResourceAlreadyExists,
            format!("already exists: {path}"),
        )
    }

    /// Creates a `DirectoryNotEmpty` fault for `path`.
    pub fn directory_not_empty(path: &str) -> Self {
        Self::new(
            FaultCode::DirectoryNotEmpty,
            format!("directory not empty: {path}"),
        )
    }
}

/// Result type alias for remote share calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteFault>;

//! Logical-to-remote path resolution.
//!
//! Callers address files with logical paths relative to the adapter's root.
//! Before any remote call the path is normalized and the configured prefix is
//! prepended, producing a [`RemotePath`]. Two adapters with different prefixes
//! therefore never address the same remote resource.

use std::fmt;

use crate::error::{AdapterError, AdapterResult};

/// Splits `path` into normalized segments.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment.
/// A `..` with nothing left to remove would leave the root and is rejected.
fn normalize_segments(path: &str) -> AdapterResult<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(AdapterError::InvalidPath(format!(
                        "{path} escapes the filesystem root"
                    )));
                }
            }
            other => {
                if other.contains('\0') {
                    return Err(AdapterError::InvalidPath(format!(
                        "{path} contains a NUL byte"
                    )));
                }
                segments.push(other.to_string());
            }
        }
    }
    Ok(segments)
}

/// A fully resolved path on the share: prefix plus normalized logical path.
///
/// Never has a leading or trailing slash; the empty path is the share root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    /// The share root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Wraps a path already in remote form (as returned by a listing).
    pub(crate) fn from_remote(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as sent to the share.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the share root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent directory; `None` for the root.
    pub fn parent(&self) -> Option<RemotePath> {
        sharefs_remote::parent_path(&self.0).map(|p| Self(p.to_string()))
    }

    /// Final segment; empty for the root.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Appends a single segment.
    pub fn join(&self, name: &str) -> RemotePath {
        Self(sharefs_remote::join_path(&self.0, name))
    }

    /// Every directory above this path, root-to-leaf.
    ///
    /// Excludes the share root (which always exists) and the path itself:
    /// `a/b/c.txt` yields `a` then `a/b`.
    pub fn ancestors(&self) -> Vec<RemotePath> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(dir) = current {
            if dir.is_root() {
                break;
            }
            current = dir.parent();
            ancestors.push(dir);
        }
        ancestors.reverse();
        ancestors
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path namespace an adapter is confined to.
///
/// Zero or more segments prepended to every logical path. Immutable for the
/// adapter's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathPrefix {
    segments: Vec<String>,
}

impl PathPrefix {
    /// No prefix: logical paths address the share root directly.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a prefix such as `tenant` or `level1/level2`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidPath` if the prefix climbs above the root.
    pub fn parse(prefix: &str) -> AdapterResult<Self> {
        Ok(Self {
            segments: normalize_segments(prefix)?,
        })
    }

    /// True if no prefix is applied.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The prefix as a remote path (the root when empty).
    pub fn as_remote(&self) -> RemotePath {
        RemotePath(self.segments.join("/"))
    }

    /// Resolves a logical path into the remote path it addresses.
    ///
    /// `a/b`, `/a//b/` and `a/./b` all resolve identically; the
    /// file/directory distinction is not encoded in the string.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidPath` if the path climbs above the
    /// logical root.
    pub fn resolve(&self, logical: &str) -> AdapterResult<RemotePath> {
        let mut segments = self.segments.clone();
        segments.extend(normalize_segments(logical)?);
        Ok(RemotePath(segments.join("/")))
    }

    /// Strips the prefix off a remote path, restoring the logical view.
    ///
    /// Returns `None` if `remote` lies outside this prefix.
    pub fn strip(&self, remote: &str) -> Option<String> {
        if self.is_empty() {
            return Some(remote.to_string());
        }
        let prefix = self.segments.join("/");
        if remote == prefix {
            return Some(String::new());
        }
        remote
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string)
    }

    /// Logical rendering of a remote path for messages; falls back to the remote form.
    pub fn logical_display(&self, remote: &RemotePath) -> String {
        self.strip(remote.as_str())
            .unwrap_or_else(|| remote.as_str().to_string())
    }
}

impl fmt::Display for PathPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_prefix() {
        let prefix = PathPrefix::none();
        assert_eq!(prefix.resolve("a/b.txt").unwrap().as_str(), "a/b.txt");
        assert!(prefix.resolve("").unwrap().is_root());
        assert!(prefix.resolve("/").unwrap().is_root());
    }

    #[test]
    fn test_equivalent_inputs_resolve_identically() {
        let prefix = PathPrefix::parse("p1").unwrap();
        let expected = prefix.resolve("a/b").unwrap();
        for input in ["a/b/", "/a//b", "a/./b", "./a/b/.", "a/c/../b"] {
            assert_eq!(prefix.resolve(input).unwrap(), expected, "input {input}");
        }
        assert_eq!(expected.as_str(), "p1/a/b");
    }

    #[test]
    fn test_two_level_prefix() {
        let prefix = PathPrefix::parse("/level1//level2/").unwrap();
        assert_eq!(prefix.to_string(), "level1/level2");
        assert_eq!(
            prefix.resolve("x.txt").unwrap().as_str(),
            "level1/level2/x.txt"
        );
        assert_eq!(prefix.resolve("").unwrap().as_str(), "level1/level2");
    }

    #[test]
    fn test_escaping_the_root_is_rejected() {
        let prefix = PathPrefix::parse("p1").unwrap();
        assert!(matches!(
            prefix.resolve("../p2/secret.txt"),
            Err(AdapterError::InvalidPath(_))
        ));
        assert!(matches!(
            prefix.resolve("a/../../b"),
            Err(AdapterError::InvalidPath(_))
        ));
        assert!(PathPrefix::parse("..").is_err());
    }

    #[test]
    fn test_prefixes_isolate() {
        let one = PathPrefix::parse("test-prefix").unwrap();
        let two = PathPrefix::parse("test-prefix-level1/test-prefix-level2").unwrap();
        for path in ["a.txt", "test-prefix/a.txt", ""] {
            assert_ne!(one.resolve(path).unwrap(), two.resolve(path).unwrap());
        }
    }

    #[test]
    fn test_strip_restores_logical_path() {
        let prefix = PathPrefix::parse("p1/p2").unwrap();
        assert_eq!(prefix.strip("p1/p2/a/b.txt").as_deref(), Some("a/b.txt"));
        assert_eq!(prefix.strip("p1/p2").as_deref(), Some(""));
        assert_eq!(prefix.strip("p1/p2x/a"), None);
        assert_eq!(prefix.strip("other/a"), None);

        assert_eq!(PathPrefix::none().strip("a/b").as_deref(), Some("a/b"));
    }

    #[test]
    fn test_ancestors_root_to_leaf() {
        let path = PathPrefix::parse("p")
            .unwrap()
            .resolve("a/b/c.txt")
            .unwrap();
        let ancestors: Vec<_> = path.ancestors().iter().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["p", "p/a", "p/a/b"]);

        assert!(RemotePath::from_remote("top.txt").ancestors().is_empty());
        assert!(RemotePath::root().ancestors().is_empty());
    }

    #[test]
    fn test_parent_join_file_name() {
        let path = RemotePath::from_remote("a/b");
        assert_eq!(path.parent().unwrap().as_str(), "a");
        assert_eq!(path.file_name(), "b");
        assert_eq!(path.join("c").as_str(), "a/b/c");
        assert_eq!(RemotePath::root().join("x").as_str(), "x");
        assert!(RemotePath::root().parent().is_none());
    }
}

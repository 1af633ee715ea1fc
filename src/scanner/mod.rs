//! Scanner module for directory traversal.
//!
//! The scanner is the traversal collaborator of the duplicate finder: it
//! visits every regular file under one or more roots and reports a
//! [`ScannedFile`] tuple of path, size, device and inode for each. It never
//! reads file contents.
//!
//! # Example
//!
//! ```no_run
//! use finddups::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;

use crate::duplicates::FileIdentity;

pub use walker::Walker;

/// One regular file reported by traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Path the file was found at
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Device the file lives on
    pub device_id: u64,
    /// Inode number on that device
    pub inode_id: u64,
}

impl ScannedFile {
    /// Create a new scanned file tuple.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, size: u64, device_id: u64, inode_id: u64) -> Self {
        Self {
            path: path.into(),
            size,
            device_id,
            inode_id,
        }
    }

    /// Split into the identity filed by the size index and the size it is
    /// filed under.
    #[must_use]
    pub fn into_parts(self) -> (FileIdentity, u64) {
        (
            FileIdentity::new(self.path, self.device_id, self.inode_id),
            self.size,
        )
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Skip files of size zero.
    pub exclude_empty: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Also apply the `.gitignore` file at the root, if there is one.
    /// Off by default so every regular file is a candidate.
    pub respect_gitignore: bool,
}

impl WalkerConfig {
    /// Skip hidden files and directories.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Skip empty files.
    #[must_use]
    pub fn with_exclude_empty(mut self, exclude: bool) -> Self {
        self.exclude_empty = exclude;
        self
    }

    /// Only include files of at least `min` bytes.
    #[must_use]
    pub fn with_min_size(mut self, min: Option<u64>) -> Self {
        self.min_size = min;
        self
    }

    /// Only include files of at most `max` bytes.
    #[must_use]
    pub fn with_max_size(mut self, max: Option<u64>) -> Self {
        self.max_size = max;
        self
    }

    /// Set gitignore-style patterns to skip.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Honor the root `.gitignore`.
    #[must_use]
    pub fn with_respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }
}

/// Errors that can occur during directory scanning.
///
/// Scan errors are reported per entry; they never stop traversal.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanned_file_into_parts() {
        let file = ScannedFile::new("/data/a.txt", 1024, 3, 77);
        let (identity, size) = file.into_parts();

        assert_eq!(size, 1024);
        assert_eq!(identity.path, PathBuf::from("/data/a.txt"));
        assert_eq!(identity.device_id, 3);
        assert_eq!(identity.inode_id, 77);
    }

    #[test]
    fn test_walker_config_default() {
        let config = WalkerConfig::default();

        assert!(!config.skip_hidden);
        assert!(!config.exclude_empty);
        assert!(config.min_size.is_none());
        assert!(config.max_size.is_none());
        assert!(config.ignore_patterns.is_empty());
        assert!(!config.respect_gitignore);
    }

    #[test]
    fn test_walker_config_builder() {
        let config = WalkerConfig::default()
            .with_skip_hidden(true)
            .with_exclude_empty(true)
            .with_min_size(Some(1024))
            .with_max_size(Some(1_000_000))
            .with_ignore_patterns(vec!["*.tmp".to_string()])
            .with_respect_gitignore(true);

        assert!(config.skip_hidden);
        assert!(config.respect_gitignore);
        assert!(config.exclude_empty);
        assert_eq!(config.min_size, Some(1024));
        assert_eq!(config.max_size, Some(1_000_000));
        assert_eq!(config.ignore_patterns, vec!["*.tmp".to_string()]);
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::PermissionDenied(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "Permission denied: /test");

        let err = ScanError::NotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "Path not found: /missing");
    }
}

//! Confirmed duplicate groups.

use std::path::PathBuf;

use serde::Serialize;

use super::index::FileIdentity;

/// Files whose contents were confirmed byte-identical.
///
/// Always holds at least two files. The first file is the one the others
/// were compared against; the rest follow in bucket order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// File size in bytes (shared by all files in the group)
    pub size: u64,
    /// Identical files
    pub files: Vec<FileIdentity>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `size` - File size in bytes
    /// * `files` - Identical files
    #[must_use]
    pub fn new(size: u64, files: Vec<FileIdentity>) -> Self {
        debug_assert!(files.len() >= 2, "a duplicate group needs two files");
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}

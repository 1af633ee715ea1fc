//! Size index: files bucketed by exact byte size.
//!
//! # Overview
//!
//! Files with different sizes can never be duplicates, so the index is the
//! first filter of the pipeline. Every traversal tuple is filed under its
//! size; only buckets holding two or more distinct files ever reach the
//! content comparison stage.
//!
//! Within a bucket, entries sharing `(device_id, inode_id)` are hard links to
//! the same underlying file. Only the first one seen is kept, so a file is
//! never compared against itself.
//!
//! # Example
//!
//! ```
//! use finddups::duplicates::{FileIdentity, SizeIndex};
//!
//! let mut index = SizeIndex::new();
//! index.insert(FileIdentity::new("/a", 1, 10), 100);
//! index.insert(FileIdentity::new("/b", 1, 11), 100);
//! index.insert(FileIdentity::new("/c", 1, 12), 50);
//! // Hard link of /a: same device and inode
//! assert!(!index.insert(FileIdentity::new("/a-link", 1, 10), 100));
//!
//! let sizes: Vec<u64> = index.drain_ordered().map(|bucket| bucket.size).collect();
//! assert_eq!(sizes, vec![100, 50]);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

/// One filesystem entry as reported by traversal.
///
/// Two identities with equal `(device_id, inode_id)` refer to the same
/// underlying file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileIdentity {
    /// Path the file was found at
    pub path: PathBuf,
    /// Device the file lives on
    pub device_id: u64,
    /// Inode number on that device
    pub inode_id: u64,
}

impl FileIdentity {
    /// Create a new file identity.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, device_id: u64, inode_id: u64) -> Self {
        Self {
            path: path.into(),
            device_id,
            inode_id,
        }
    }

    /// Whether both identities name the same underlying file.
    #[must_use]
    pub fn same_file(&self, other: &Self) -> bool {
        self.device_id == other.device_id && self.inode_id == other.inode_id
    }
}

/// All distinct files of one size, in arrival order.
///
/// Arrival order is the comparison order of the resolver, and the skip-ahead
/// inference depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes shared by every entry
    pub size: u64,
    /// Distinct files, no two sharing `(device_id, inode_id)`
    pub files: Vec<FileIdentity>,
}

impl SizeBucket {
    /// Create an empty bucket for `size`.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            files: Vec::new(),
        }
    }

    /// Append `identity` unless it is a hard link of an entry already here.
    ///
    /// Returns `true` if the identity was appended.
    pub fn push_distinct(&mut self, identity: FileIdentity) -> bool {
        if self.files.iter().any(|f| f.same_file(&identity)) {
            return false;
        }
        self.files.push(identity);
        true
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether this bucket can produce a duplicate group at all.
    #[must_use]
    pub fn has_candidates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Ordered mapping from file size to [`SizeBucket`].
///
/// Lookups go through a `BTreeMap`, so inserting is `O(log B)` in the
/// number of distinct sizes.
#[derive(Debug, Default)]
pub struct SizeIndex {
    buckets: BTreeMap<u64, SizeBucket>,
    files: usize,
    hardlinks_skipped: usize,
}

impl SizeIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File `identity` under `size`.
    ///
    /// Creates the bucket if this is the first file of that size. If the
    /// bucket already holds an entry with the same `(device_id, inode_id)`
    /// the new identity is discarded.
    ///
    /// Returns `true` if the identity was retained.
    pub fn insert(&mut self, identity: FileIdentity, size: u64) -> bool {
        let bucket = self
            .buckets
            .entry(size)
            .or_insert_with(|| SizeBucket::new(size));

        if bucket.push_distinct(identity) {
            self.files += 1;
            true
        } else {
            self.hardlinks_skipped += 1;
            log::trace!("Hard link discarded from {} byte bucket", size);
            false
        }
    }

    /// Number of retained files across all buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files
    }

    /// Check if no file has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files == 0
    }

    /// Number of distinct sizes seen.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of identities discarded as hard links.
    #[must_use]
    pub fn hardlinks_skipped(&self) -> usize {
        self.hardlinks_skipped
    }

    /// Number of buckets holding two or more files.
    #[must_use]
    pub fn candidate_buckets(&self) -> usize {
        self.buckets.values().filter(|b| b.has_candidates()).count()
    }

    /// Bucket for `size`, if any file of that size was inserted.
    #[must_use]
    pub fn bucket(&self, size: u64) -> Option<&SizeBucket> {
        self.buckets.get(&size)
    }

    /// Consume the index bucket by bucket, largest size first.
    ///
    /// Each bucket is removed from the index as it is yielded. Dropping the
    /// iterator early leaves the remaining buckets in place.
    pub fn drain_ordered(&mut self) -> Drain<'_> {
        Drain { index: self }
    }
}

/// Lazy draining iterator returned by [`SizeIndex::drain_ordered`].
#[derive(Debug)]
pub struct Drain<'a> {
    index: &'a mut SizeIndex,
}

impl Iterator for Drain<'_> {
    type Item = SizeBucket;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, bucket) = self.index.buckets.pop_last()?;
        self.index.files -= bucket.files.len();
        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.index.buckets.len();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Drain<'_> {}

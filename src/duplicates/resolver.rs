//! Duplicate resolution by incremental pairwise content comparison.
//!
//! # Overview
//!
//! The resolver drains a [`SizeIndex`] bucket by bucket, largest size first,
//! and turns each bucket into zero or more [`DuplicateGroup`]s:
//!
//! - Buckets with fewer than two files are discarded.
//! - Empty files are trivially identical, so a bucket of size 0 becomes one
//!   group without any I/O.
//! - Every other bucket is resolved by comparing files pairwise, chunk by
//!   chunk, in bucket order. A [`ComparisonLedger`] records how far each
//!   compared pair agreed, which lets later pairs either be ruled out without
//!   reading them or start reading past a prefix already known to match.
//!
//! Any open, seek or read failure aborts the whole run. A partial duplicate
//! report would be misleading, so no groups are returned in that case.
//!
//! # Example
//!
//! ```no_run
//! use finddups::duplicates::{FileIdentity, Resolver, ResolverConfig, SizeIndex};
//!
//! let mut index = SizeIndex::new();
//! index.insert(FileIdentity::new("/data/a.bin", 1, 1), 4096);
//! index.insert(FileIdentity::new("/data/b.bin", 1, 2), 4096);
//!
//! let resolver = Resolver::new(ResolverConfig::default().with_chunk_size(8192));
//! let (groups, stats) = resolver.resolve(index).unwrap();
//! println!("{} groups after {} comparisons", groups.len(), stats.comparisons);
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::groups::DuplicateGroup;
use super::index::{FileIdentity, SizeBucket, SizeIndex};
use super::ledger::{ComparisonLedger, Inference};
use crate::progress::ProgressCallback;

/// Default number of bytes read from each file per comparison step.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Configuration for duplicate resolution.
#[derive(Clone)]
pub struct ResolverConfig {
    /// Bytes read from each file per comparison step.
    pub chunk_size: usize,
    /// Number of buckets resolved concurrently. Files inside one bucket are
    /// always compared sequentially.
    pub jobs: usize,
    /// Optional shutdown flag for aborting the run.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverConfig")
            .field("chunk_size", &self.chunk_size)
            .field("jobs", &self.jobs)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            jobs: 1,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl ResolverConfig {
    /// Set the comparison chunk size (at least 1 byte).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the number of buckets resolved concurrently (at least 1).
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Set the shutdown flag for aborting the run.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Counters describing the work done by the resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Buckets consumed from the index
    pub buckets: usize,
    /// File pairs actually opened and read
    pub comparisons: usize,
    /// File pairs ruled out by the ledger without any I/O
    pub inferred_differences: usize,
    /// Bytes per file not read because the ledger proved them identical
    pub bytes_skipped: u64,
    /// Bytes per file read during comparisons
    pub bytes_compared: u64,
    /// Duplicate groups produced
    pub groups: usize,
    /// Files in duplicate groups beyond the first of each group
    pub duplicate_files: usize,
}

impl ResolveStats {
    fn merge(&mut self, other: &Self) {
        self.buckets += other.buckets;
        self.comparisons += other.comparisons;
        self.inferred_differences += other.inferred_differences;
        self.bytes_skipped += other.bytes_skipped;
        self.bytes_compared += other.bytes_compared;
        self.groups += other.groups;
        self.duplicate_files += other.duplicate_files;
    }

    fn count_groups(&mut self, groups: &[DuplicateGroup]) {
        self.groups += groups.len();
        self.duplicate_files += groups.iter().map(DuplicateGroup::duplicate_count).sum::<usize>();
    }
}

/// Errors that abort duplicate resolution.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// A file could not be opened for comparison.
    #[error("Error opening {path}: {source}")]
    Open {
        /// File that failed to open
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Seeking past an already confirmed prefix failed.
    #[error("Error seeking in {path}: {source}")]
    Seek {
        /// File that failed to seek
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Reading a chunk failed.
    #[error("Error reading {path}: {source}")]
    Read {
        /// File that failed to read
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The run was aborted by a shutdown request.
    #[error("Comparison interrupted by user")]
    Interrupted,
}

impl ResolveError {
    /// Path of the file the failure is about, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Open { path, .. } | Self::Seek { path, .. } | Self::Read { path, .. } => {
                Some(path)
            }
            Self::Interrupted => None,
        }
    }
}

/// Result of comparing one pair of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairOutcome {
    /// Both files reached end of file with identical content
    identical: bool,
    /// Exact number of leading bytes the files share
    common_prefix: u64,
    /// Bytes read from each file
    bytes_read: u64,
}

/// Scratch buffers reused across all pairs of one bucket.
struct ChunkBuffers {
    left: Vec<u8>,
    right: Vec<u8>,
}

impl ChunkBuffers {
    fn new(chunk_size: usize) -> Self {
        Self {
            left: vec![0; chunk_size],
            right: vec![0; chunk_size],
        }
    }
}

/// Turns a [`SizeIndex`] into duplicate groups.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Create a resolver with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Consume `index` and return every duplicate group in it.
    ///
    /// Groups of larger files come first. The output is the same whether
    /// buckets are resolved sequentially or concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`] hit; no groups are returned then.
    pub fn resolve(
        &self,
        mut index: SizeIndex,
    ) -> Result<(Vec<DuplicateGroup>, ResolveStats), ResolveError> {
        let total = index.bucket_count();
        log::info!(
            "Resolving {} files in {} size buckets ({} with candidates)",
            index.len(),
            total,
            index.candidate_buckets()
        );

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("comparing", total);
        }

        let result = if self.config.jobs > 1 {
            let buckets: Vec<SizeBucket> = index.drain_ordered().collect();
            self.resolve_parallel(buckets)
        } else {
            self.resolve_sequential(index.drain_ordered())
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("comparing");
        }

        let (groups, stats) = result?;
        log::info!(
            "Resolution complete: {} groups, {} comparisons, {} inferred differences, {} bytes skipped",
            stats.groups,
            stats.comparisons,
            stats.inferred_differences,
            stats.bytes_skipped
        );
        Ok((groups, stats))
    }

    fn resolve_sequential(
        &self,
        buckets: impl Iterator<Item = SizeBucket>,
    ) -> Result<(Vec<DuplicateGroup>, ResolveStats), ResolveError> {
        let mut all_groups = Vec::new();
        let mut stats = ResolveStats::default();

        for (idx, bucket) in buckets.enumerate() {
            self.report_bucket(idx + 1, bucket.size);
            let (groups, bucket_stats) = self.resolve_bucket(bucket)?;
            stats.merge(&bucket_stats);
            all_groups.extend(groups);
        }

        Ok((all_groups, stats))
    }

    fn resolve_parallel(
        &self,
        buckets: Vec<SizeBucket>,
    ) -> Result<(Vec<DuplicateGroup>, ResolveStats), ResolveError> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("Failed to create thread pool, resolving sequentially: {}", e);
                return self.resolve_sequential(buckets.into_iter());
            }
        };

        let done = AtomicUsize::new(0);
        let per_bucket: Vec<(Vec<DuplicateGroup>, ResolveStats)> = pool.install(|| {
            buckets
                .into_par_iter()
                .map(|bucket| {
                    let size = bucket.size;
                    let result = self.resolve_bucket(bucket);
                    self.report_bucket(done.fetch_add(1, Ordering::SeqCst) + 1, size);
                    result
                })
                .collect::<Result<Vec<_>, ResolveError>>()
        })?;

        let mut all_groups = Vec::new();
        let mut stats = ResolveStats::default();
        for (groups, bucket_stats) in per_bucket {
            stats.merge(&bucket_stats);
            all_groups.extend(groups);
        }
        Ok((all_groups, stats))
    }

    fn report_bucket(&self, current: usize, size: u64) {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_progress(current, &format!("{size} byte files"));
        }
    }

    /// Resolve a single bucket.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if any file in the bucket cannot be opened,
    /// seeked or read, or if shutdown was requested.
    pub fn resolve_bucket(
        &self,
        bucket: SizeBucket,
    ) -> Result<(Vec<DuplicateGroup>, ResolveStats), ResolveError> {
        if self.config.is_shutdown_requested() {
            return Err(ResolveError::Interrupted);
        }

        let mut stats = ResolveStats {
            buckets: 1,
            ..Default::default()
        };

        if !bucket.has_candidates() {
            log::trace!("Discarding {} byte bucket with a single file", bucket.size);
            return Ok((Vec::new(), stats));
        }

        if bucket.size == 0 {
            log::debug!("{} empty files grouped without comparison", bucket.len());
            let groups = vec![DuplicateGroup::new(0, bucket.files)];
            stats.count_groups(&groups);
            return Ok((groups, stats));
        }

        let member_lists = self.compare_bucket(&bucket, &mut stats)?;

        let size = bucket.size;
        let mut slots: Vec<Option<FileIdentity>> = bucket.files.into_iter().map(Some).collect();
        let groups: Vec<DuplicateGroup> = member_lists
            .into_iter()
            .map(|members| {
                let files = members.iter().filter_map(|&k| slots[k].take()).collect();
                DuplicateGroup::new(size, files)
            })
            .collect();

        for group in &groups {
            log::debug!(
                "Duplicate group: {} files, {} bytes each",
                group.len(),
                group.size
            );
        }
        stats.count_groups(&groups);
        Ok((groups, stats))
    }

    /// Pairwise comparison over one bucket, returning bucket positions of
    /// each group's members.
    fn compare_bucket(
        &self,
        bucket: &SizeBucket,
        stats: &mut ResolveStats,
    ) -> Result<Vec<Vec<usize>>, ResolveError> {
        let files = &bucket.files;
        let cnt = files.len();
        let mut grouped = vec![false; cnt];
        let mut ledger = ComparisonLedger::new(cnt);
        let mut buffers = ChunkBuffers::new(self.config.chunk_size);
        let mut member_lists = Vec::new();

        log::debug!("Comparing {} files of {} bytes", cnt, bucket.size);

        for i in 0..cnt - 1 {
            if grouped[i] {
                continue;
            }

            let mut members = Vec::new();
            for j in i + 1..cnt {
                if grouped[j] {
                    continue;
                }

                let skip = match ledger.infer(i, j) {
                    Inference::Differ => {
                        log::trace!(
                            "Skipping {} vs {}: earlier prefixes disagree",
                            files[i].path.display(),
                            files[j].path.display()
                        );
                        stats.inferred_differences += 1;
                        continue;
                    }
                    Inference::Skip(n) => n,
                };

                if self.config.is_shutdown_requested() {
                    return Err(ResolveError::Interrupted);
                }

                if skip > 0 {
                    log::trace!(
                        "Skipping ahead {} bytes in {} and {}",
                        skip,
                        files[i].path.display(),
                        files[j].path.display()
                    );
                }

                let outcome = compare_pair(&files[i].path, &files[j].path, skip, &mut buffers)?;
                stats.comparisons += 1;
                stats.bytes_skipped += skip;
                stats.bytes_compared += outcome.bytes_read;
                ledger.record(i, j, outcome.common_prefix);

                // Files that grew since the walk no longer have this size
                if outcome.identical && outcome.common_prefix != bucket.size {
                    log::debug!(
                        "{} and {} changed size since traversal",
                        files[i].path.display(),
                        files[j].path.display()
                    );
                } else if outcome.identical {
                    if members.is_empty() {
                        members.push(i);
                    }
                    members.push(j);
                    grouped[i] = true;
                    grouped[j] = true;
                }
            }

            if !members.is_empty() {
                member_lists.push(members);
            }
        }

        Ok(member_lists)
    }
}

/// Compare two files from byte `skip` onward.
///
/// Both files are closed when this returns, on every path.
fn compare_pair(
    left: &Path,
    right: &Path,
    skip: u64,
    buffers: &mut ChunkBuffers,
) -> Result<PairOutcome, ResolveError> {
    let mut left_file = open(left)?;
    let mut right_file = open(right)?;

    if skip > 0 {
        seek(&mut left_file, left, skip)?;
        seek(&mut right_file, right, skip)?;
    }

    let mut common_prefix = skip;
    let mut bytes_read = 0u64;
    loop {
        let left_len = read_chunk(&mut left_file, &mut buffers.left).map_err(|source| {
            ResolveError::Read {
                path: left.to_path_buf(),
                source,
            }
        })?;
        let right_len = read_chunk(&mut right_file, &mut buffers.right).map_err(|source| {
            ResolveError::Read {
                path: right.to_path_buf(),
                source,
            }
        })?;
        bytes_read += left_len.max(right_len) as u64;

        let a = &buffers.left[..left_len];
        let b = &buffers.right[..right_len];
        if a == b {
            common_prefix += left_len as u64;
            if left_len == 0 {
                return Ok(PairOutcome {
                    identical: true,
                    common_prefix,
                    bytes_read,
                });
            }
            continue;
        }

        common_prefix += mismatch_offset(a, b) as u64;
        return Ok(PairOutcome {
            identical: false,
            common_prefix,
            bytes_read,
        });
    }
}

fn open(path: &Path) -> Result<File, ResolveError> {
    File::open(path).map_err(|source| ResolveError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn seek(file: &mut File, path: &Path, offset: u64) -> Result<(), ResolveError> {
    file.seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|source| ResolveError::Seek {
            path: path.to_path_buf(),
            source,
        })
}

/// Fill `buf` from `reader`, stopping early only at end of file.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Index of the first differing byte; the shorter length if one slice is a
/// prefix of the other.
fn mismatch_offset(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

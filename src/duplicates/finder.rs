//! Duplicate finder orchestrating traversal, size indexing and resolution.
//!
//! # Overview
//!
//! [`DuplicateFinder`] runs the whole pipeline:
//! 1. **Walk** - visit every root with a [`Walker`] and collect regular files
//! 2. **Index** - file each one into a [`SizeIndex`], dropping hard links
//! 3. **Resolve** - compare same-size files with the [`Resolver`]
//!
//! Traversal problems are warnings collected in the [`ScanSummary`] unless
//! strict mode is on. Resolution problems always abort the run.
//!
//! # Example
//!
//! ```no_run
//! use finddups::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_strict(true));
//! let (groups, summary) = finder
//!     .find_duplicates_in_paths(&[PathBuf::from(".")])
//!     .unwrap();
//!
//! println!("Found {} duplicate groups", groups.len());
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::groups::DuplicateGroup;
use super::index::SizeIndex;
use super::resolver::{ResolveError, ResolveStats, Resolver, ResolverConfig};
use crate::progress::ProgressCallback;
use crate::scanner::{ScanError, ScannedFile, Walker, WalkerConfig};

/// Configuration for the duplicate finder.
#[derive(Clone, Default)]
pub struct FinderConfig {
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Resolver configuration for content comparison.
    pub resolver_config: ResolverConfig,
    /// Fail on the first traversal error instead of collecting it.
    pub strict: bool,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("walker_config", &self.walker_config)
            .field("resolver_config", &self.resolver_config)
            .field("strict", &self.strict)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl FinderConfig {
    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the resolver configuration.
    #[must_use]
    pub fn with_resolver_config(mut self, config: ResolverConfig) -> Self {
        self.resolver_config = config;
        self
    }

    /// Fail on the first traversal error.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the shutdown flag for graceful termination.
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

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Files filed into the size index (hard links counted once)
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Extra names of already filed inodes that were dropped
    pub hardlinks_skipped: usize,
    /// Number of distinct file sizes seen
    pub distinct_sizes: usize,
    /// Files ruled out because no other file shares their size
    pub eliminated_by_size: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, not counting the first of each group
    pub duplicate_files: usize,
    /// Space that removing every duplicate would free
    pub reclaimable_space: u64,
    /// Work done while comparing contents
    pub resolve_stats: ResolveStats,
    /// Time spent walking
    pub walk_duration: Duration,
    /// Time spent comparing
    pub compare_duration: Duration,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Traversal errors that did not stop the scan
    pub scan_errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Percentage of the scanned bytes taken up by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        format_size(self.reclaimable_space)
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        format_size(self.total_size)
    }

    /// Whether any traversal error was collected.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.scan_errors.is_empty()
    }

    fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Format a byte size as a human-readable string (IEC units).
pub(crate) fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A traversal error in strict mode.
    #[error(transparent)]
    ScanError(#[from] ScanError),

    /// Content comparison failed.
    #[error(transparent)]
    Resolve(ResolveError),
}

impl From<ResolveError> for FinderError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::Interrupted => Self::Interrupted,
            other => Self::Resolve(other),
        }
    }
}

/// Duplicate finder that drives traversal and resolution.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find duplicates under a single root directory.
    ///
    /// # Errors
    ///
    /// See [`DuplicateFinder::find_duplicates_in_paths`].
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        self.find_duplicates_in_paths(&[path.to_path_buf()])
    }

    /// Find duplicates across one or more root directories.
    ///
    /// All roots feed one size index, so a file under one root can be a
    /// duplicate of a file under another.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - A root does not exist or is not a directory
    /// - Strict mode is on and traversal hits an error
    /// - A file cannot be opened, seeked or read during comparison
    /// - The scan is interrupted by shutdown signal
    pub fn find_duplicates_in_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        for path in paths {
            if !path.exists() {
                return Err(FinderError::PathNotFound(path.clone()));
            }
            if !path.is_dir() {
                return Err(FinderError::NotADirectory(path.clone()));
            }
        }

        if paths.is_empty() {
            log::warn!("No paths provided for scanning");
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {} path(s)", paths.len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
        }

        let mut index = SizeIndex::new();
        for path in paths {
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_message(&format!("Walking {}", path.display()));
            }
            let walker = self.walker(path);
            for result in walker.walk() {
                match result {
                    Ok(file) => file_into(&mut index, &mut summary, file),
                    Err(e) if self.config.strict => return Err(FinderError::ScanError(e)),
                    Err(e) => summary.scan_errors.push(e),
                }
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }
        summary.walk_duration = start_time.elapsed();

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted during walking");
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files ({}), {} hard links skipped, {} warnings",
            summary.total_files,
            format_size(summary.total_size),
            summary.hardlinks_skipped,
            summary.scan_errors.len()
        );

        let groups = self.resolve(index, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Find duplicates among an already collected stream of files.
    ///
    /// No traversal happens; every item is filed as-is.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if comparison fails or the scan is interrupted.
    pub fn find_duplicates_from_files(
        &self,
        files: impl IntoIterator<Item = ScannedFile>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary::default();

        let mut index = SizeIndex::new();
        for file in files {
            if self.config.is_shutdown_requested() {
                return Err(FinderError::Interrupted);
            }
            file_into(&mut index, &mut summary, file);
        }
        summary.walk_duration = start_time.elapsed();

        let groups = self.resolve(index, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    fn walker(&self, path: &Path) -> Walker {
        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }
        walker
    }

    /// Resolver config with the finder's flag and callback filled in where
    /// the resolver config has none of its own.
    fn resolver_config(&self) -> ResolverConfig {
        let mut config = self.config.resolver_config.clone();
        if config.shutdown_flag.is_none() {
            config.shutdown_flag = self.config.shutdown_flag.clone();
        }
        if config.progress_callback.is_none() {
            config.progress_callback = self.config.progress_callback.clone();
        }
        config
    }

    fn resolve(
        &self,
        index: SizeIndex,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        summary.distinct_sizes = index.bucket_count();
        summary.eliminated_by_size = index.bucket_count() - index.candidate_buckets();

        let compare_start = Instant::now();
        let resolver = Resolver::new(self.resolver_config());
        let (groups, stats) = resolver.resolve(index)?;
        summary.compare_duration = compare_start.elapsed();

        summary.resolve_stats = stats;
        summary.record_groups(&groups);

        log::info!(
            "Found {} duplicate groups ({} duplicate files, {} reclaimable)",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );
        Ok(groups)
    }
}

fn file_into(index: &mut SizeIndex, summary: &mut ScanSummary, file: ScannedFile) {
    let (identity, size) = file.into_parts();
    if index.insert(identity, size) {
        summary.total_files += 1;
        summary.total_size += size;
    } else {
        summary.hardlinks_skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn names(group: &DuplicateGroup) -> Vec<String> {
        group
            .files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_finder_config_builder() {
        let flag = Arc::new(AtomicBool::new(false));
        let config = FinderConfig::default()
            .with_strict(true)
            .with_walker_config(WalkerConfig::default().with_skip_hidden(true))
            .with_resolver_config(ResolverConfig::default().with_chunk_size(4096))
            .with_shutdown_flag(flag);

        assert!(config.strict);
        assert!(config.walker_config.skip_hidden);
        assert_eq!(config.resolver_config.chunk_size, 4096);
        assert!(config.shutdown_flag.is_some());
        assert!(format!("{:?}", config).contains("FinderConfig"));
    }

    #[test]
    fn test_find_duplicates_basic() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", &[b'X'; 100]);
        write(dir.path(), "b.txt", &[b'X'; 100]);
        write(dir.path(), "c.txt", &[b'Y'; 100]);
        write(dir.path(), "d.txt", &[b'X'; 50]);

        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].size, 100);
        assert_eq!(names(&groups[0]), vec!["a.txt", "b.txt"]);

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.total_size, 350);
        assert_eq!(summary.distinct_sizes, 2);
        assert_eq!(summary.eliminated_by_size, 1);
        assert_eq!(summary.duplicate_groups, 1);
        assert_eq!(summary.duplicate_files, 1);
        assert_eq!(summary.reclaimable_space, 100);
        assert!(!summary.has_warnings());
    }

    #[test]
    fn test_find_duplicates_across_roots() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        write(first.path(), "one.bin", b"shared content");
        write(second.path(), "two.bin", b"shared content");

        let finder = DuplicateFinder::with_defaults();
        let (groups, _) = finder
            .find_duplicates_in_paths(&[first.path().to_path_buf(), second.path().to_path_buf()])
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["one.bin", "two.bin"]);
    }

    #[test]
    fn test_find_duplicates_missing_root() {
        let dir = TempDir::new().unwrap();
        let finder = DuplicateFinder::with_defaults();

        let result = finder.find_duplicates(&dir.path().join("nope"));
        assert!(matches!(result, Err(FinderError::PathNotFound(_))));
    }

    #[test]
    fn test_find_duplicates_root_is_file() {
        let dir = TempDir::new().unwrap();
        let file = write(dir.path(), "file.txt", b"x");
        let finder = DuplicateFinder::with_defaults();

        let result = finder.find_duplicates(&file);
        assert!(matches!(result, Err(FinderError::NotADirectory(_))));
    }

    #[test]
    fn test_find_duplicates_no_paths() {
        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates_in_paths(&[]).unwrap();
        assert!(groups.is_empty());
        assert_eq!(summary.total_files, 0);
    }

    #[test]
    fn test_find_duplicates_interrupted() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a", b"same");
        write(dir.path(), "b", b"same");

        let flag = Arc::new(AtomicBool::new(true));
        let finder = DuplicateFinder::new(FinderConfig::default().with_shutdown_flag(flag));

        let result = finder.find_duplicates(dir.path());
        assert!(matches!(result, Err(FinderError::Interrupted)));
    }

    #[test]
    fn test_from_files_reports_vanished_file() {
        let dir = TempDir::new().unwrap();
        let present = write(dir.path(), "here", b"abcd");
        let gone = dir.path().join("gone");

        let files = vec![
            ScannedFile::new(present, 4, 1, 1),
            ScannedFile::new(gone.clone(), 4, 1, 2),
        ];
        let finder = DuplicateFinder::with_defaults();

        match finder.find_duplicates_from_files(files) {
            Err(FinderError::Resolve(e)) => assert_eq!(e.path(), Some(gone.as_path())),
            other => panic!("expected resolve error, got {:?}", other.map(|(g, _)| g)),
        }
    }

    #[test]
    fn test_from_files_counts_hardlinks() {
        let dir = TempDir::new().unwrap();
        let a = write(dir.path(), "a", b"data");
        let b = write(dir.path(), "b", b"data");

        let files = vec![
            ScannedFile::new(a.clone(), 4, 1, 10),
            ScannedFile::new(a, 4, 1, 10),
            ScannedFile::new(b, 4, 1, 11),
        ];
        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates_from_files(files).unwrap();

        assert_eq!(summary.hardlinks_skipped, 1);
        assert_eq!(summary.total_files, 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn test_from_files_empty_files_group_without_io() {
        let files = vec![
            ScannedFile::new("/nonexistent/e1", 0, 1, 1),
            ScannedFile::new("/nonexistent/e2", 0, 1, 2),
            ScannedFile::new("/nonexistent/e3", 0, 1, 3),
        ];
        let finder = DuplicateFinder::with_defaults();
        let (groups, summary) = finder.find_duplicates_from_files(files).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 3);
        assert_eq!(summary.reclaimable_space, 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_strict_mode_fails_on_traversal_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        write(&locked, "inner", b"x");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root can read anything; nothing to observe then
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let lenient = DuplicateFinder::with_defaults();
        let (_, summary) = lenient.find_duplicates(dir.path()).unwrap();
        assert!(summary.has_warnings());

        let strict = DuplicateFinder::new(FinderConfig::default().with_strict(true));
        let result = strict.find_duplicates(dir.path());
        assert!(matches!(result, Err(FinderError::ScanError(_))));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_summary_percentages() {
        let summary = ScanSummary {
            total_size: 1000,
            reclaimable_space: 250,
            ..Default::default()
        };
        assert!((summary.wasted_percentage() - 25.0).abs() < f64::EPSILON);
        assert_eq!(ScanSummary::default().wasted_percentage(), 0.0);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert!(format_size(2048).contains("KiB"));
    }

    #[test]
    fn test_resolve_error_interrupted_maps_to_interrupted() {
        let err: FinderError = ResolveError::Interrupted.into();
        assert!(matches!(err, FinderError::Interrupted));
    }
}

//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! [`Walker`] traverses one root directory and yields a [`ScannedFile`] for
//! every regular file it finds. The walk is physical: symbolic links are
//! never followed, so link cycles cannot occur.
//!
//! # Features
//!
//! - Children sorted by name, giving the same order on every run
//! - Gitignore-style pattern matching via the `ignore` crate; ignored
//!   directories are pruned, not descended into. The root `.gitignore` is
//!   only consulted when [`WalkerConfig::respect_gitignore`] is set
//! - Size filtering (min/max, empty files)
//! - Hidden file filtering
//! - Graceful shutdown via atomic flag; traversal ends at the next entry
//!
//! Per-entry problems (permission denied, entries vanishing mid-walk) are
//! yielded as [`ScanError`] values and do not stop the walk.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{ScanError, ScannedFile, WalkerConfig};
use crate::progress::ProgressCallback;

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use finddups::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback, notified once per file found.
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

    /// Build gitignore matcher from config patterns and, when enabled, the
    /// root .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if self.config.respect_gitignore && gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if size == 0 && self.config.exclude_empty {
            return false;
        }
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding one [`ScannedFile`] per regular file.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use finddups::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<ScannedFile, ScanError>> + '_ {
        let gitignore = self.build_gitignore().map(Arc::new);
        let prune_root = self.root.clone();
        let mut found = 0usize;
        #[cfg(not(unix))]
        let mut synthetic_inode = 0u64;

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if let Some(ref gi) = gitignore {
                    children.retain(|child| match child {
                        Ok(entry) => {
                            let path = entry.path();
                            let relative = path.strip_prefix(&prune_root).unwrap_or(&path);
                            let ignored = gi
                                .matched(relative, entry.file_type().is_dir())
                                .is_ignore();
                            if ignored {
                                log::trace!("Ignoring: {}", path.display());
                            }
                            !ignored
                        }
                        Err(_) => true,
                    });
                }

                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping traversal");
                }
                !stop
            })
            .filter_map(move |entry_result| {
                let entry = match entry_result {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                        return Some(Err(self.handle_jwalk_error(path, e)));
                    }
                };

                let file_type = entry.file_type();
                if file_type.is_dir() {
                    return None;
                }
                let path = entry.path();
                if file_type.is_symlink() {
                    log::trace!("Skipping symlink: {}", path.display());
                    return None;
                }

                let metadata = match std::fs::symlink_metadata(&path) {
                    Ok(m) => m,
                    Err(e) => return Some(Err(self.handle_io_error(&path, e))),
                };

                // Sockets, fifos and devices are not candidates
                if !metadata.is_file() {
                    return None;
                }

                let size = metadata.len();
                if !self.passes_size_filter(size) {
                    log::trace!(
                        "Skipping file due to size filter ({}): {}",
                        size,
                        path.display()
                    );
                    return None;
                }

                #[cfg(unix)]
                let (device_id, inode_id) = file_id(&metadata);
                #[cfg(not(unix))]
                let (device_id, inode_id) = {
                    let _ = &metadata;
                    synthetic_inode += 1;
                    (0, synthetic_inode)
                };

                found += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(found, path.to_string_lossy().as_ref());
                }

                Some(Ok(ScannedFile {
                    path,
                    size,
                    device_id,
                    inode_id,
                }))
            })
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(&self, path: PathBuf, error: jwalk::Error) -> ScanError {
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => {
                log::warn!("Walker error for {}: {}", path.display(), error);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(error.to_string()),
                }
            }
        }
    }
}

/// Device and inode of a file.
#[cfg(unix)]
fn file_id(metadata: &Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (metadata.dev(), metadata.ino())
}

//! Duplicate detection module.
//!
//! This module provides:
//! - The size index that partitions files into same-size buckets
//! - The comparison ledger that lets earlier comparisons prune later ones
//! - The resolver that turns buckets into confirmed duplicate groups
//! - The finder that drives traversal, indexing and resolution end to end

pub mod finder;
pub mod groups;
pub mod index;
pub mod ledger;
pub mod resolver;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::DuplicateGroup;
pub use index::{Drain, FileIdentity, SizeBucket, SizeIndex};
pub use ledger::{ComparisonLedger, Inference};
pub use resolver::{
    ResolveError, ResolveStats, Resolver, ResolverConfig, DEFAULT_CHUNK_SIZE,
};

//! finddups - byte-identical duplicate file finder.
//!
//! Files found under one or more directory trees are partitioned by size;
//! same-size files are then compared chunk by chunk, reusing what earlier
//! comparisons proved about shared prefixes to skip reads. Hard links to one
//! file are reported once.
//!
//! ```no_run
//! use finddups::duplicates::DuplicateFinder;
//! use std::path::Path;
//!
//! let (groups, _) = DuplicateFinder::with_defaults()
//!     .find_duplicates(Path::new("."))
//!     .unwrap();
//! for group in &groups {
//!     println!("duplicates of size {}", group.size);
//! }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

pub use app::run_app;

//! Report formatters for duplicate scan results.
//!
//! - [`TextOutput`]: a `duplicates of size N` header per group, then one
//!   path per line
//! - [`JsonOutput`]: groups plus scan summary for scripting
//! - [`CsvOutput`]: one row per file for spreadsheets
//!
//! Paths are written exactly as traversal found them.
//!
//! # Example
//!
//! ```no_run
//! use finddups::duplicates::DuplicateFinder;
//! use finddups::output::TextOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _) = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! TextOutput::new(&groups).write_to(&mut std::io::stdout().lock()).unwrap();
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;

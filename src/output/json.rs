//! JSON report.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     { "size": 1024, "files": ["/data/a", "/data/b"] }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "hardlinks_skipped": 0,
//!     "distinct_sizes": 80,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "comparisons": 12,
//!     "inferred_differences": 3,
//!     "bytes_skipped": 0,
//!     "bytes_compared": 40960,
//!     "warnings": 0,
//!     "scan_duration_ms": 1234,
//!     "walk_duration_ms": 100,
//!     "compare_duration_ms": 1100,
//!     "exit_code": 0,
//!     "exit_code_name": "FD000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// File size in bytes
    pub size: u64,
    /// Paths of the identical files, in group order
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            size: group.size,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Files filed into the size index
    pub total_files: usize,
    /// Total size of those files in bytes
    pub total_size: u64,
    /// Extra hard-link names dropped
    pub hardlinks_skipped: usize,
    /// Distinct file sizes seen
    pub distinct_sizes: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, excluding the first of each group
    pub duplicate_files: usize,
    /// Bytes freed by removing every duplicate
    pub reclaimable_space: u64,
    /// File pairs actually read
    pub comparisons: usize,
    /// File pairs ruled out without reading
    pub inferred_differences: usize,
    /// Bytes per file skipped because already known identical
    pub bytes_skipped: u64,
    /// Bytes per file read while comparing
    pub bytes_compared: u64,
    /// Traversal errors that did not stop the scan
    pub warnings: usize,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Duration of the walking phase in milliseconds
    pub walk_duration_ms: u64,
    /// Duration of the comparison phase in milliseconds
    pub compare_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "FD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let stats = &summary.resolve_stats;
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            hardlinks_skipped: summary.hardlinks_skipped,
            distinct_sizes: summary.distinct_sizes,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            comparisons: stats.comparisons,
            inferred_differences: stats.inferred_differences,
            bytes_skipped: stats.bytes_skipped,
            bytes_compared: stats.bytes_compared,
            warnings: summary.scan_errors.len(),
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            walk_duration_ms: summary.walk_duration.as_millis() as u64,
            compare_duration_ms: summary.compare_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups, largest size first
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// ```
    /// use finddups::duplicates::{DuplicateGroup, FileIdentity, ScanSummary};
    /// use finddups::output::json::JsonOutput;
    /// use finddups::error::ExitCode;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     1024,
    ///     vec![FileIdentity::new("/file1", 1, 1), FileIdentity::new("/file2", 1, 2)],
    /// )];
    ///
    /// let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        if pretty {
            serde_json::to_writer_pretty(&mut *writer, self)?;
        } else {
            serde_json::to_writer(&mut *writer, self)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::{FileIdentity, ResolveStats};
    use std::time::Duration;

    fn sample_groups() -> Vec<DuplicateGroup> {
        vec![DuplicateGroup::new(
            1024,
            vec![
                FileIdentity::new("/data/one", 1, 1),
                FileIdentity::new("/data/two", 1, 2),
                FileIdentity::new("/data/three", 1, 3),
            ],
        )]
    }

    fn sample_summary() -> ScanSummary {
        ScanSummary {
            total_files: 10,
            total_size: 20_480,
            hardlinks_skipped: 1,
            distinct_sizes: 4,
            duplicate_groups: 1,
            duplicate_files: 2,
            reclaimable_space: 2048,
            resolve_stats: ResolveStats {
                comparisons: 2,
                inferred_differences: 1,
                ..ResolveStats::default()
            },
            scan_duration: Duration::from_millis(1234),
            walk_duration: Duration::from_millis(100),
            compare_duration: Duration::from_millis(900),
            ..ScanSummary::default()
        }
    }

    #[test]
    fn test_json_structure() {
        let output = JsonOutput::new(&sample_groups(), &sample_summary(), ExitCode::Success);
        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        let dup = &value["duplicates"][0];
        assert_eq!(dup["size"], 1024);
        assert_eq!(dup["files"][0], "/data/one");
        assert_eq!(dup["files"][2], "/data/three");

        let summary = &value["summary"];
        assert_eq!(summary["total_files"], 10);
        assert_eq!(summary["hardlinks_skipped"], 1);
        assert_eq!(summary["reclaimable_space"], 2048);
        assert_eq!(summary["comparisons"], 2);
        assert_eq!(summary["inferred_differences"], 1);
        assert_eq!(summary["scan_duration_ms"], 1234);
        assert_eq!(summary["exit_code_name"], "FD000");
    }

    #[test]
    fn test_json_partial_success_code() {
        let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::PartialSuccess);
        assert_eq!(output.summary.exit_code, 3);
        assert_eq!(output.summary.exit_code_name, "FD003");
        assert!(output.duplicates.is_empty());
    }

    #[test]
    fn test_write_to_pretty() {
        let output = JsonOutput::new(&sample_groups(), &sample_summary(), ExitCode::Success);
        let mut buf = Vec::new();
        output.write_to(&mut buf, true).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n  \"duplicates\""));
    }
}

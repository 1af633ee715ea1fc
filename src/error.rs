//! Exit codes and structured error reporting.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Exit codes for the finddups binary.
///
/// - 0: Completed normally (with or without duplicates)
/// - 1: General error (bad arguments, unreadable file during comparison)
/// - 3: Completed, but some paths could not be traversed
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed.
    Success = 0,
    /// An error stopped the scan.
    GeneralError = 1,
    /// Scan completed with traversal warnings.
    PartialSuccess = 3,
    /// Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "FD000",
            Self::GeneralError => "FD001",
            Self::PartialSuccess => "FD003",
            Self::Interrupted => "FD130",
        }
    }

    /// Exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "FD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Path the failure is about, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let path = match err.downcast_ref::<FinderError>() {
            Some(FinderError::Resolve(e)) => e.path().map(|p| p.display().to_string()),
            Some(FinderError::PathNotFound(p) | FinderError::NotADirectory(p)) => {
                Some(p.display().to_string())
            }
            _ => None,
        };
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            path,
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicates::ResolveError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Interrupted.code_prefix(), "FD130");
    }

    #[test]
    fn test_for_error() {
        let interrupted = anyhow::Error::new(FinderError::Interrupted);
        assert_eq!(ExitCode::for_error(&interrupted), ExitCode::Interrupted);

        let other = anyhow::anyhow!("boom");
        assert_eq!(ExitCode::for_error(&other), ExitCode::GeneralError);
    }

    #[test]
    fn test_structured_error_names_path() {
        let err = anyhow::Error::new(FinderError::Resolve(ResolveError::Open {
            path: PathBuf::from("/data/x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }));
        let structured = StructuredError::new(&err, ExitCode::GeneralError);

        assert_eq!(structured.code, "FD001");
        assert_eq!(structured.path.as_deref(), Some("/data/x"));
        assert!(structured.message.contains("Error opening /data/x"));
        assert!(!structured.interrupted);
    }
}

//! Error types for the hierarchy store.
//!
//! [`StoreError`] is what fallible store operations return. Relationship
//! edits on unresolvable records are not errors at all: they are silent
//! no-ops, reported only through their `bool` return value.
//!
//! [`ErrorCode`] gives every error a stable `E####` identifier so the CLI
//! and scripted callers can branch on it without parsing messages.

use std::fmt;

use crate::store::Violation;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidRecord,
    DuplicateUid,
    ReservedUid,
    UnsupportedVersion,
    InconsistentSnapshot,
    SnapshotParseError,
    RecordNotFound,
    LockContention,
    LockFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidRecord => "E2001",
            Self::RecordNotFound => "E2002",
            Self::DuplicateUid => "E3001",
            Self::ReservedUid => "E3002",
            Self::UnsupportedVersion => "E3003",
            Self::InconsistentSnapshot => "E3004",
            Self::SnapshotParseError => "E3005",
            Self::LockContention => "E4001",
            Self::LockFailed => "E4002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidRecord => "Invalid record",
            Self::RecordNotFound => "Record not found",
            Self::DuplicateUid => "Duplicate record identifier",
            Self::ReservedUid => "Reserved identifier used by a record",
            Self::UnsupportedVersion => "Unsupported snapshot version",
            Self::InconsistentSnapshot => "Snapshot relationships are inconsistent",
            Self::SnapshotParseError => "Snapshot parse error",
            Self::LockContention => "Snapshot is locked by another process",
            Self::LockFailed => "Snapshot lock could not be taken",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in thicket.toml and retry."),
            Self::InvalidRecord => Some(
                "Give every record a non-empty `name` and keep payload keys clear of name, uid, children and parents.",
            ),
            Self::RecordNotFound => None,
            Self::DuplicateUid | Self::ReservedUid | Self::InconsistentSnapshot => {
                Some("Repair the snapshot file or re-export it from a healthy store.")
            }
            Self::UnsupportedVersion => Some("Upgrade thicket to read this snapshot."),
            Self::SnapshotParseError => Some("Check that the snapshot file is valid JSON."),
            Self::LockContention => Some("Wait for the other `tk` command to finish, then retry."),
            Self::LockFailed => Some("Check permissions on the directory holding the snapshot."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record offered to `add` failed validation. `position` is the
    /// zero-based offset of the failing item within the flattened batch.
    #[error("invalid record at position {position}: {reason}")]
    Validation { position: usize, reason: String },

    /// A payload field would shadow a schema key.
    #[error("field '{0}' is reserved")]
    ReservedField(String),

    /// A snapshot lists the same identifier twice.
    #[error("duplicate record identifier in snapshot: '{0}'")]
    DuplicateUid(String),

    /// A snapshot stores a record under the root sentinel.
    #[error("record uses the reserved identifier '{0}'")]
    ReservedUid(String),

    /// A snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Loaded relationships break the store invariants.
    #[error("snapshot relationships are inconsistent ({} violation(s))", .0.len())]
    Inconsistent(Vec<Violation>),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } | Self::ReservedField(_) => ErrorCode::InvalidRecord,
            Self::DuplicateUid(_) => ErrorCode::DuplicateUid,
            Self::ReservedUid(_) => ErrorCode::ReservedUid,
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
            Self::Inconsistent(_) => ErrorCode::InconsistentSnapshot,
            Self::Json(_) => ErrorCode::SnapshotParseError,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, StoreError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigParseError,
            ErrorCode::InvalidRecord,
            ErrorCode::DuplicateUid,
            ErrorCode::ReservedUid,
            ErrorCode::UnsupportedVersion,
            ErrorCode::InconsistentSnapshot,
            ErrorCode::SnapshotParseError,
            ErrorCode::RecordNotFound,
            ErrorCode::LockContention,
            ErrorCode::LockFailed,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidRecord.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn validation_error_maps_to_invalid_record() {
        let err = StoreError::Validation {
            position: 2,
            reason: "name is required".into(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidRecord);
        assert_eq!(
            err.to_string(),
            "invalid record at position 2: name is required"
        );
    }
}

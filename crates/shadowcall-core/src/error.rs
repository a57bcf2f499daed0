//! Shared error type across shadowcall crates.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sub-reason of a policy violation (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// A direct call was armed for one object but another object reached the check.
    TargetMismatch,
    /// A one-shot bypass was requested while another one was still pending.
    DoubleOneShot,
    /// Completion hook observed a full-stack depth below zero.
    NegativeDepth,
    /// The outermost completion of a full-stack bypass ran on a different object.
    UnwindMismatch,
    /// Installing over a policy the new one does not know how to replace.
    UnexpectedState,
}

impl ViolationKind {
    /// String representation used in metrics labels and test vectors.
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::TargetMismatch => "TARGET_MISMATCH",
            ViolationKind::DoubleOneShot => "DOUBLE_ONE_SHOT",
            ViolationKind::NegativeDepth => "NEGATIVE_DEPTH",
            ViolationKind::UnwindMismatch => "UNWIND_MISMATCH",
            ViolationKind::UnexpectedState => "UNEXPECTED_STATE",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PolicyViolation,
    BadConfig,
    UnsupportedVersion,
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::PolicyViolation => "POLICY_VIOLATION",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ShadowError>;

/// Unified error type used by core and runtime.
#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("policy violation ({kind}): {msg}")]
    PolicyViolation { kind: ViolationKind, msg: String },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ShadowError {
    pub fn violation(kind: ViolationKind, msg: impl Into<String>) -> Self {
        ShadowError::PolicyViolation { kind, msg: msg.into() }
    }

    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ShadowError::PolicyViolation { .. } => ErrorCode::PolicyViolation,
            ShadowError::BadConfig(_) => ErrorCode::BadConfig,
            ShadowError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            ShadowError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Sub-reason, if this is a policy violation.
    pub fn violation_kind(&self) -> Option<ViolationKind> {
        match self {
            ShadowError::PolicyViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

//! shadowcall core: the direct-call policy state machine and error types.
//!
//! This crate holds the pure decision logic that tells an interception
//! mechanism whether an invocation runs the shadow or the real implementation.
//! It has no knowledge of threads or of how calls are redirected; the runtime
//! crate owns both.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every illegal transition surfaces as `ShadowError::PolicyViolation`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod policy;

/// Shared result type.
pub use error::{Result, ShadowError, ViolationKind};
pub use policy::{DirectCallPolicy, PolicyKind, TargetRef};

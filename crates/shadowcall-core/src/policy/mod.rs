//! Direct-call policy state machine.
//!
//! A policy decides, per intercepted invocation, whether the real
//! implementation runs instead of the shadow. The variant set is closed:
//! - `NoOp`: always intercepted.
//! - `OneShot`: the next invocation on one target is direct.
//! - `FullStack`: the whole call stack rooted at one target is direct.
//!
//! The redirection mechanism drives every policy through the same contract:
//! `should_call_directly` before the invocation, `on_method_invocation_finished`
//! on every exit path, and `check_for_change` when a new policy is installed.

pub mod full_stack;
pub mod one_shot;
pub mod target;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShadowError, ViolationKind};

pub use full_stack::FullStack;
pub use one_shot::OneShot;
pub use target::TargetRef;

use target::describe;

/// Variant tag without state (metrics labels, vectors, logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    NoOp,
    OneShot,
    FullStack,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::NoOp => "no_op",
            PolicyKind::OneShot => "one_shot",
            PolicyKind::FullStack => "full_stack",
        }
    }
}

/// Current direct-call policy of one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectCallPolicy {
    NoOp,
    OneShot(OneShot),
    FullStack(FullStack),
}

impl Default for DirectCallPolicy {
    fn default() -> Self {
        Self::NOP
    }
}

impl DirectCallPolicy {
    /// Stateless "no bypass" policy, shared by every thread.
    pub const NOP: DirectCallPolicy = DirectCallPolicy::NoOp;

    pub fn one_shot(target: TargetRef) -> Self {
        DirectCallPolicy::OneShot(OneShot::new(target))
    }

    pub fn full_stack(target: TargetRef) -> Self {
        DirectCallPolicy::FullStack(FullStack::new(target))
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            DirectCallPolicy::NoOp => PolicyKind::NoOp,
            DirectCallPolicy::OneShot(_) => PolicyKind::OneShot,
            DirectCallPolicy::FullStack(_) => PolicyKind::FullStack,
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, DirectCallPolicy::NoOp)
    }

    /// Decide whether the invocation about to run on `target` must bypass the shadow.
    pub fn should_call_directly(&mut self, target: TargetRef) -> Result<bool> {
        match self {
            DirectCallPolicy::NoOp => Ok(false),
            DirectCallPolicy::OneShot(p) => p.should_call_directly(target),
            DirectCallPolicy::FullStack(p) => p.should_call_directly(target),
        }
    }

    /// Completion hook, run after every invocation attempt on `target`.
    /// Returns the policy that replaces this one.
    pub fn on_method_invocation_finished(&mut self, target: TargetRef) -> Result<DirectCallPolicy> {
        match self {
            DirectCallPolicy::NoOp => Ok(Self::NOP),
            DirectCallPolicy::OneShot(_) => Ok(Self::NOP),
            DirectCallPolicy::FullStack(p) => {
                if p.finish(target)? {
                    Ok(Self::NOP)
                } else {
                    Ok(DirectCallPolicy::FullStack(*p))
                }
            }
        }
    }

    /// Validate replacing `previous` with `self`.
    ///
    /// `Ok(true)` applies the change, `Ok(false)` keeps `previous` (an active
    /// full-stack bypass owns the thread), `Err` is a programming error.
    pub fn check_for_change(&self, previous: &DirectCallPolicy) -> Result<bool> {
        match (self, previous) {
            (DirectCallPolicy::NoOp, _) => Ok(true),

            (DirectCallPolicy::OneShot(_), DirectCallPolicy::NoOp) => Ok(true),
            (DirectCallPolicy::OneShot(new), DirectCallPolicy::OneShot(old)) => {
                Err(ShadowError::violation(
                    ViolationKind::DoubleOneShot,
                    format!(
                        "already expecting a direct call on <{}> but here's a new request for <{}>",
                        describe(old.expected),
                        describe(new.expected)
                    ),
                ))
            }
            (DirectCallPolicy::OneShot(_), DirectCallPolicy::FullStack(_)) => Ok(false),

            (DirectCallPolicy::FullStack(_), DirectCallPolicy::NoOp) => Ok(true),
            (DirectCallPolicy::FullStack(_), DirectCallPolicy::FullStack(_)) => Ok(false),
            (DirectCallPolicy::FullStack(_), DirectCallPolicy::OneShot(_)) => {
                Err(ShadowError::violation(
                    ViolationKind::UnexpectedState,
                    format!("direct call policy is already set to {previous}"),
                ))
            }
        }
    }
}

impl fmt::Display for DirectCallPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectCallPolicy::NoOp => f.write_str("no_op"),
            DirectCallPolicy::OneShot(p) => write!(f, "one_shot(<{}>)", describe(p.expected)),
            DirectCallPolicy::FullStack(p) => {
                write!(f, "full_stack(<{}>, depth={})", describe(p.expected), p.depth())
            }
        }
    }
}

/// First-level identity check shared by the bypass variants.
///
/// Clears `expected` on mismatch so the reference can never be reused.
fn match_expected(expected: &mut Option<TargetRef>, target: TargetRef) -> Result<bool> {
    let Some(armed) = *expected else {
        return Ok(false);
    };
    if armed != target {
        *expected = None;
        return Err(ShadowError::violation(
            ViolationKind::TargetMismatch,
            format!("expected to perform direct call on <{armed}> but got <{target}>"),
        ));
    }
    Ok(true)
}

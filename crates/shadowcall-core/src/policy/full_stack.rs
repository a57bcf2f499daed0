//! Full-stack bypass: every invocation inside the stack rooted at the first
//! direct call on the target is direct, until that stack unwinds.
//!
//! Depth bookkeeping:
//! - `-1` means not yet entered.
//! - Each accepted query increments, each completion decrements.
//! - Target identity is checked only on entry and on the outermost completion.

use crate::error::{Result, ShadowError, ViolationKind};

use super::target::{describe, TargetRef};

/// Depth value of a stack that has not been entered.
pub const NOT_ENTERED: i32 = -1;

/// Direct call is performed within the invocation full stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullStack {
    pub(crate) expected: Option<TargetRef>,
    depth: i32,
}

impl FullStack {
    pub fn new(target: TargetRef) -> Self {
        Self {
            expected: Some(target),
            depth: NOT_ENTERED,
        }
    }

    pub fn expected(&self) -> Option<TargetRef> {
        self.expected
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Whether the stack has been entered and not yet unwound.
    pub fn is_entered(&self) -> bool {
        self.depth >= 0
    }

    pub(crate) fn should_call_directly(&mut self, target: TargetRef) -> Result<bool> {
        let direct = if self.depth == NOT_ENTERED {
            super::match_expected(&mut self.expected, target)?
        } else {
            true
        };
        if direct {
            self.depth += 1;
            tracing::trace!(depth = self.depth, %target, "full-stack enter");
        }
        Ok(direct)
    }

    /// Returns `true` when the outermost call finished and the stack is gone.
    pub(crate) fn finish(&mut self, target: TargetRef) -> Result<bool> {
        if self.depth < 0 {
            return Err(ShadowError::violation(
                ViolationKind::NegativeDepth,
                format!(
                    "stack depth is negative: {}, target: <{}>",
                    self.depth,
                    describe(self.expected)
                ),
            ));
        }

        self.depth -= 1;
        tracing::trace!(depth = self.depth, %target, "full-stack leave");
        if self.depth != NOT_ENTERED {
            return Ok(false);
        }

        if self.expected != Some(target) {
            return Err(ShadowError::violation(
                ViolationKind::UnwindMismatch,
                format!(
                    "stack should have been collapsed on <{}>, but got <{}>",
                    describe(self.expected),
                    target
                ),
            ));
        }
        Ok(true)
    }
}

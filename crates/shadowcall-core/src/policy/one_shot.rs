//! One-shot bypass: the next invocation on the target is direct, then revert.

use crate::error::Result;

use super::target::TargetRef;

/// Direct call is performed once only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneShot {
    pub(crate) expected: Option<TargetRef>,
}

impl OneShot {
    pub fn new(target: TargetRef) -> Self {
        Self { expected: Some(target) }
    }

    /// Target still armed; `None` once consumed or invalidated.
    pub fn expected(&self) -> Option<TargetRef> {
        self.expected
    }

    pub(crate) fn should_call_directly(&mut self, target: TargetRef) -> Result<bool> {
        let direct = super::match_expected(&mut self.expected, target)?;
        // consumed either way
        self.expected = None;
        Ok(direct)
    }
}

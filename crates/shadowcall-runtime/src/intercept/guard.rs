//! Scoped completion obligation for one intercepted invocation.

use std::time::Instant;

use shadowcall_core::error::Result;
use shadowcall_core::{DirectCallPolicy, TargetRef};

use crate::holder::PolicyHolder;
use crate::obs::{InvocationMode, RuntimeMetrics};

/// An invocation between its direct-call check and its completion.
///
/// `finish` runs the completion hook and reports its error. If the guard is
/// dropped without `finish` (early return, panic unwind) the hook still runs;
/// a violation at that point can only be logged.
#[must_use = "dropping the guard completes the invocation immediately"]
pub struct Invocation<'a> {
    holder: &'a PolicyHolder,
    metrics: &'a RuntimeMetrics,
    target: TargetRef,
    mode: InvocationMode,
    started: Instant,
    armed: bool,
}

impl<'a> Invocation<'a> {
    pub(crate) fn arm(
        holder: &'a PolicyHolder,
        metrics: &'a RuntimeMetrics,
        target: TargetRef,
        mode: InvocationMode,
    ) -> Self {
        Self {
            holder,
            metrics,
            target,
            mode,
            started: Instant::now(),
            armed: true,
        }
    }

    /// Whether the real implementation must run.
    pub fn is_direct(&self) -> bool {
        self.mode == InvocationMode::Direct
    }

    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    pub fn target(&self) -> TargetRef {
        self.target
    }

    /// Complete the invocation; returns the policy now installed.
    pub fn finish(mut self) -> Result<DirectCallPolicy> {
        self.armed = false;
        self.complete()
    }

    fn complete(&self) -> Result<DirectCallPolicy> {
        self.metrics.record_invocation(self.mode, self.started.elapsed());
        self.holder
            .on_method_invocation_finished(self.target)
            .map_err(|e| {
                if let Some(kind) = e.violation_kind() {
                    self.metrics.record_violation(kind);
                }
                tracing::warn!(target_ref = %self.target, error = %e, "invocation completion rejected");
                e
            })
    }
}

impl Drop for Invocation<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(e) = self.complete() {
            tracing::error!(target_ref = %self.target, error = %e, "completion failed while unwinding");
        }
    }
}

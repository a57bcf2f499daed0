use std::sync::Arc;

use shadowcall_core::error::{Result, ShadowError};
use shadowcall_core::TargetRef;

use crate::config::ShadowConfig;
use crate::holder::PolicyHolder;
use crate::obs::{InvocationMode, RuntimeMetrics};

use super::guard::Invocation;

/// Behavior switches taken from `runtime` config.
#[derive(Debug, Clone, Copy)]
pub struct InterceptOptions {
    pub reset_on_check_failure: bool,
    pub trace_invocations: bool,
}

impl Default for InterceptOptions {
    fn default() -> Self {
        Self {
            reset_on_check_failure: true,
            trace_invocations: false,
        }
    }
}

impl From<&ShadowConfig> for InterceptOptions {
    fn from(cfg: &ShadowConfig) -> Self {
        Self {
            reset_on_check_failure: cfg.runtime.reset_on_check_failure,
            trace_invocations: cfg.runtime.trace_invocations,
        }
    }
}

/// Routes invocations to the shadow or the real implementation according to
/// the calling thread's policy. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Interceptor {
    holder: Arc<PolicyHolder>,
    metrics: Arc<RuntimeMetrics>,
    opts: InterceptOptions,
}

impl Interceptor {
    pub fn new(holder: Arc<PolicyHolder>, metrics: Arc<RuntimeMetrics>, opts: InterceptOptions) -> Self {
        Self { holder, metrics, opts }
    }

    pub fn holder(&self) -> &PolicyHolder {
        &self.holder
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    /// Run the direct-call check for `target` and arm the completion guard.
    ///
    /// A failed check never arms a guard. Depending on
    /// `reset_on_check_failure` the thread is either reset to no-op or the
    /// completion hook runs right away, as it would for any other attempt.
    pub fn enter(&self, target: TargetRef, method: &str) -> Result<Invocation<'_>> {
        let direct = match self.holder.should_call_directly(target) {
            Ok(direct) => direct,
            Err(e) => return Err(self.check_failed(target, method, e)),
        };

        let mode = InvocationMode::from(direct);
        if self.opts.trace_invocations {
            tracing::debug!(target_ref = %target, method, mode = mode.as_str(), "intercepted invocation");
        }
        Ok(Invocation::arm(&self.holder, &self.metrics, target, mode))
    }

    /// Invoke `method` on `target`: `direct` runs the real implementation,
    /// `shadow` the substitute. Completion runs on every exit path.
    pub fn invoke<T, R, D, S>(&self, target: &T, method: &str, direct: D, shadow: S) -> Result<R>
    where
        T: ?Sized + 'static,
        D: FnOnce(&T) -> R,
        S: FnOnce(&T) -> R,
    {
        let call = self.enter(TargetRef::of(target), method)?;
        let out = if call.is_direct() { direct(target) } else { shadow(target) };
        call.finish()?;
        Ok(out)
    }

    fn check_failed(&self, target: TargetRef, method: &str, err: ShadowError) -> ShadowError {
        if let Some(kind) = err.violation_kind() {
            self.metrics.record_violation(kind);
        }
        tracing::warn!(target_ref = %target, method, error = %err, "direct call check failed");

        if self.opts.reset_on_check_failure {
            let dropped = self.holder.reset();
            tracing::debug!(%dropped, "policy reset after failed check");
        } else if let Err(e) = self.holder.on_method_invocation_finished(target) {
            tracing::warn!(target_ref = %target, error = %e, "completion after failed check rejected");
        }
        err
    }
}

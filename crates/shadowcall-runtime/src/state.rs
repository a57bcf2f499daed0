//! Shared runtime state for the interception runtime.
//!
//! Wires the thread-scoped holder, metrics, and interceptor from one config
//! and routes install requests through metrics and logging.

use std::sync::Arc;

use shadowcall_core::error::Result;
use shadowcall_core::{DirectCallPolicy, TargetRef};

use crate::config::ShadowConfig;
use crate::holder::PolicyHolder;
use crate::intercept::{InterceptOptions, Interceptor};
use crate::obs::metrics::{RuntimeMetrics, INSTALL_APPLIED, INSTALL_IGNORED, INSTALL_REJECTED};

#[derive(Clone)]
pub struct ShadowRuntime {
    inner: Arc<ShadowRuntimeInner>,
    interceptor: Interceptor,
}

struct ShadowRuntimeInner {
    cfg: ShadowConfig,
}

impl ShadowRuntime {
    /// Build a runtime with its own holder.
    pub fn new(cfg: ShadowConfig) -> Self {
        Self::with_holder(cfg, Arc::new(PolicyHolder::new()))
    }

    /// Build a runtime over an existing holder (e.g. `PolicyHolder::global()`).
    pub fn with_holder(cfg: ShadowConfig, holder: Arc<PolicyHolder>) -> Self {
        let metrics = Arc::new(RuntimeMetrics::new(cfg.metrics.enabled));
        let interceptor = Interceptor::new(holder, metrics, InterceptOptions::from(&cfg));
        Self {
            inner: Arc::new(ShadowRuntimeInner { cfg }),
            interceptor,
        }
    }

    pub fn cfg(&self) -> &ShadowConfig {
        &self.inner.cfg
    }

    pub fn interceptor(&self) -> Interceptor {
        self.interceptor.clone()
    }

    pub fn holder(&self) -> &PolicyHolder {
        self.interceptor.holder()
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        self.interceptor.metrics()
    }

    /// Install `policy` on the calling thread.
    ///
    /// `Ok(false)`: ignored because a full-stack bypass owns the thread.
    /// `Err`: malformed request (e.g. a second pending one-shot).
    pub fn install(&self, policy: DirectCallPolicy) -> Result<bool> {
        let kind = policy.kind();
        match self.holder().install(policy) {
            Ok(true) => {
                self.metrics().record_install(kind, INSTALL_APPLIED);
                Ok(true)
            }
            Ok(false) => {
                self.metrics().record_install(kind, INSTALL_IGNORED);
                Ok(false)
            }
            Err(e) => {
                self.metrics().record_install(kind, INSTALL_REJECTED);
                if let Some(v) = e.violation_kind() {
                    self.metrics().record_violation(v);
                }
                tracing::warn!(policy = %policy, error = %e, "direct call request rejected");
                Err(e)
            }
        }
    }

    /// Next invocation on `target` from this thread runs the real implementation.
    pub fn direct_on<T: ?Sized + 'static>(&self, target: &T) -> Result<bool> {
        self.install(DirectCallPolicy::one_shot(TargetRef::of(target)))
    }

    /// The whole call stack rooted at the next invocation on `target` runs
    /// the real implementation.
    pub fn direct_on_full_stack<T: ?Sized + 'static>(&self, target: &T) -> Result<bool> {
        self.install(DirectCallPolicy::full_stack(TargetRef::of(target)))
    }

    pub fn render_metrics(&self) -> String {
        let active = self.holder().active_threads() as u64;
        self.metrics().render(&[("shadowcall_threads_active", active)])
    }
}

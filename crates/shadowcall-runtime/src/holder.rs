//! Thread-scoped policy holder.
//!
//! One entry per thread, keyed by `ThreadId` and resolved explicitly on every
//! access. A missing entry is the no-op policy; entries that fall back to
//! no-op are removed so finished threads leave nothing behind. Only the
//! calling thread's entry is ever read or written.

use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use dashmap::DashMap;

use shadowcall_core::error::Result;
use shadowcall_core::{DirectCallPolicy, TargetRef};

/// Process-wide registry: `thread -> current policy`.
#[derive(Default)]
pub struct PolicyHolder {
    entries: DashMap<ThreadId, DirectCallPolicy>,
}

static GLOBAL: OnceLock<Arc<PolicyHolder>> = OnceLock::new();

impl PolicyHolder {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Shared instance for hosts that do not wire their own.
    pub fn global() -> Arc<PolicyHolder> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(PolicyHolder::new())))
    }

    fn key() -> ThreadId {
        thread::current().id()
    }

    /// Policy of the calling thread.
    pub fn current(&self) -> DirectCallPolicy {
        self.entries
            .get(&Self::key())
            .map(|e| *e.value())
            .unwrap_or(DirectCallPolicy::NOP)
    }

    /// Install `policy` on the calling thread if `check_for_change` allows it.
    ///
    /// `Ok(false)` means the request was ignored and the previous policy kept.
    pub fn install(&self, policy: DirectCallPolicy) -> Result<bool> {
        let key = Self::key();
        let previous = self.current();
        if !policy.check_for_change(&previous)? {
            tracing::debug!(%previous, requested = %policy, "direct call request ignored");
            return Ok(false);
        }
        self.store(key, policy);
        tracing::debug!(%previous, installed = %policy, "direct call policy installed");
        Ok(true)
    }

    /// Query half of the contract, run against the calling thread's entry.
    pub fn should_call_directly(&self, target: TargetRef) -> Result<bool> {
        let Some(mut entry) = self.entries.get_mut(&Self::key()) else {
            return Ok(false);
        };
        entry.value_mut().should_call_directly(target)
    }

    /// Completion half of the contract: runs the hook and stores its result.
    ///
    /// On error the entry keeps whatever state the hook left behind.
    pub fn on_method_invocation_finished(&self, target: TargetRef) -> Result<DirectCallPolicy> {
        let key = Self::key();
        let next = {
            let Some(mut entry) = self.entries.get_mut(&key) else {
                return Ok(DirectCallPolicy::NOP);
            };
            entry.value_mut().on_method_invocation_finished(target)?
        };
        self.store(key, next);
        Ok(next)
    }

    /// Force the calling thread back to no-op; returns what was installed.
    pub fn reset(&self) -> DirectCallPolicy {
        self.entries
            .remove(&Self::key())
            .map(|(_, p)| p)
            .unwrap_or(DirectCallPolicy::NOP)
    }

    /// Number of threads currently holding a bypass policy.
    pub fn active_threads(&self) -> usize {
        self.entries.len()
    }

    fn store(&self, key: ThreadId, policy: DirectCallPolicy) {
        if policy.is_noop() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, policy);
        }
    }
}

/// Arm a one-shot bypass for `target` on the calling thread (global holder).
pub fn direct_on<T: ?Sized + 'static>(target: &T) -> Result<bool> {
    PolicyHolder::global().install(DirectCallPolicy::one_shot(TargetRef::of(target)))
}

/// Arm a full-stack bypass for `target` on the calling thread (global holder).
pub fn direct_on_full_stack<T: ?Sized + 'static>(target: &T) -> Result<bool> {
    PolicyHolder::global().install(DirectCallPolicy::full_stack(TargetRef::of(target)))
}

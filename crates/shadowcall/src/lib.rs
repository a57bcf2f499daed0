//! Top-level facade crate for shadowcall.
//!
//! Re-exports the policy core and the runtime so users can depend on a single crate.

pub mod core {
    pub use shadowcall_core::*;
}

pub mod runtime {
    pub use shadowcall_runtime::*;
}

pub use shadowcall_core::{DirectCallPolicy, Result, ShadowError, TargetRef, ViolationKind};
pub use shadowcall_runtime::{direct_on, direct_on_full_stack, Interceptor, PolicyHolder, ShadowRuntime};

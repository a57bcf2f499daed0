//! Reference redirection mechanism.
//!
//! The interceptor drives the policy contract around each invocation:
//! query before, completion on every exit path. Hosts with their own dispatch
//! can call `Interceptor::enter` and hold the returned guard instead of
//! passing closures to `invoke`.

pub mod guard;
pub mod interceptor;

pub use guard::Invocation;
pub use interceptor::{InterceptOptions, Interceptor};

//! shadowcall runtime library entry.
//!
//! This crate wires the thread-scoped policy holder, the reference
//! interceptor, config loading, and in-process metrics around the policy state
//! machine from `shadowcall-core`. It is consumed by the demo binary
//! (`main.rs`) and by integration tests.

pub mod config;
pub mod demo;
pub mod holder;
pub mod intercept;
pub mod obs;
pub mod state;

pub use holder::{direct_on, direct_on_full_stack, PolicyHolder};
pub use intercept::{Invocation, Interceptor};
pub use state::ShadowRuntime;

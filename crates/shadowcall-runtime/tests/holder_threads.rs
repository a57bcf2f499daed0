//! Thread-scoped holder lifecycle and isolation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Barrier;
use std::thread;

use shadowcall_core::{DirectCallPolicy, PolicyKind, TargetRef, ViolationKind};
use shadowcall_runtime::{direct_on, direct_on_full_stack, PolicyHolder};

struct Target(#[allow(dead_code)] u32);

#[test]
fn fresh_thread_reads_no_op() {
    let holder = PolicyHolder::new();
    assert!(holder.current().is_noop());
    assert!(!holder.should_call_directly(TargetRef::of(&Target(0))).unwrap());
    assert!(holder.on_method_invocation_finished(TargetRef::of(&Target(0))).unwrap().is_noop());
    assert_eq!(holder.active_threads(), 0);
}

#[test]
fn install_validates_against_current() {
    let holder = PolicyHolder::new();
    let (a, b) = (Target(1), Target(2));

    assert!(holder.install(DirectCallPolicy::one_shot(TargetRef::of(&a))).unwrap());
    let err = holder
        .install(DirectCallPolicy::one_shot(TargetRef::of(&b)))
        .unwrap_err();
    assert_eq!(err.violation_kind(), Some(ViolationKind::DoubleOneShot));

    // rejected request leaves the pending one-shot in place
    assert_eq!(holder.current(), DirectCallPolicy::one_shot(TargetRef::of(&a)));
}

#[test]
fn one_shot_ignored_under_full_stack() {
    let holder = PolicyHolder::new();
    let (a, b) = (Target(1), Target(2));

    assert!(holder.install(DirectCallPolicy::full_stack(TargetRef::of(&a))).unwrap());
    assert!(holder.should_call_directly(TargetRef::of(&a)).unwrap());

    assert!(!holder.install(DirectCallPolicy::one_shot(TargetRef::of(&b))).unwrap());
    assert!(!holder.install(DirectCallPolicy::full_stack(TargetRef::of(&b))).unwrap());
    assert_eq!(holder.current().kind(), PolicyKind::FullStack);

    assert!(holder.on_method_invocation_finished(TargetRef::of(&a)).unwrap().is_noop());
    assert!(holder.current().is_noop());
    assert_eq!(holder.active_threads(), 0);
}

#[test]
fn completion_error_keeps_entry() {
    let holder = PolicyHolder::new();
    let a = Target(1);

    holder.install(DirectCallPolicy::full_stack(TargetRef::of(&a))).unwrap();
    let err = holder.on_method_invocation_finished(TargetRef::of(&a)).unwrap_err();
    assert_eq!(err.violation_kind(), Some(ViolationKind::NegativeDepth));
    assert_eq!(holder.current().kind(), PolicyKind::FullStack);

    assert_eq!(holder.reset().kind(), PolicyKind::FullStack);
    assert!(holder.current().is_noop());
}

#[test]
fn threads_see_only_their_own_policy() {
    let holder = PolicyHolder::new();
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        for id in 0..2u32 {
            let (holder, barrier) = (&holder, &barrier);
            s.spawn(move || {
                let mine = Target(id);
                let other = Target(id + 100);

                assert!(holder.install(DirectCallPolicy::one_shot(TargetRef::of(&mine))).unwrap());
                barrier.wait();

                // both installed: each thread still sees its own one-shot only
                assert_eq!(holder.current(), DirectCallPolicy::one_shot(TargetRef::of(&mine)));
                assert_eq!(holder.active_threads(), 2);
                barrier.wait();

                assert!(holder.should_call_directly(TargetRef::of(&mine)).unwrap());
                assert!(!holder.should_call_directly(TargetRef::of(&other)).unwrap());
                assert!(holder.on_method_invocation_finished(TargetRef::of(&mine)).unwrap().is_noop());
                assert!(holder.current().is_noop());
            });
        }
    });

    assert_eq!(holder.active_threads(), 0);
}

#[test]
fn global_helpers_arm_calling_thread() {
    let a = Target(7);
    let global = PolicyHolder::global();

    assert!(direct_on(&a).unwrap());
    assert_eq!(global.current().kind(), PolicyKind::OneShot);
    assert!(global.should_call_directly(TargetRef::of(&a)).unwrap());
    global.on_method_invocation_finished(TargetRef::of(&a)).unwrap();

    assert!(direct_on_full_stack(&a).unwrap());
    assert_eq!(global.current().kind(), PolicyKind::FullStack);

    // other threads never observe this thread's entry
    thread::spawn(|| assert!(PolicyHolder::global().current().is_noop()))
        .join()
        .unwrap();

    assert_eq!(global.reset().kind(), PolicyKind::FullStack);
}

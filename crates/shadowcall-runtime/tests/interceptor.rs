//! Reference interceptor driving the policy contract.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use shadowcall_core::error::Result;
use shadowcall_core::{PolicyKind, TargetRef, ViolationKind};
use shadowcall_runtime::config::{self, ShadowConfig};
use shadowcall_runtime::demo::{self, Countdown};
use shadowcall_runtime::obs::InvocationMode;
use shadowcall_runtime::ShadowRuntime;

fn runtime() -> ShadowRuntime {
    ShadowRuntime::new(ShadowConfig::default())
}

fn countdown(name: &str) -> Countdown {
    Countdown { name: name.into() }
}

fn invocations(rt: &ShadowRuntime, mode: InvocationMode) -> u64 {
    rt.metrics().invocations.get(&[("mode", mode.as_str())])
}

fn violations(rt: &ShadowRuntime, kind: ViolationKind) -> u64 {
    rt.metrics().policy_violations.get(&[("kind", kind.as_str())])
}

#[test]
fn shadow_runs_without_policy() {
    let rt = runtime();
    let obj = countdown("plain");
    assert_eq!(obj.countdown(&rt.interceptor(), 5).unwrap(), 0);
    assert_eq!(invocations(&rt, InvocationMode::Shadow), 1);
    assert_eq!(invocations(&rt, InvocationMode::Direct), 0);
}

#[test]
fn one_shot_directs_only_outermost_call() {
    let rt = runtime();
    let obj = countdown("once");

    assert!(rt.direct_on(&obj).unwrap());
    assert_eq!(obj.countdown(&rt.interceptor(), 5).unwrap(), 1);
    assert!(rt.holder().current().is_noop());
    assert_eq!(invocations(&rt, InvocationMode::Direct), 1);
    assert_eq!(invocations(&rt, InvocationMode::Shadow), 1);

    // consumed: the next call is intercepted again
    assert_eq!(obj.countdown(&rt.interceptor(), 5).unwrap(), 0);
}

#[test]
fn full_stack_directs_whole_recursion() {
    let rt = runtime();
    let obj = countdown("stack");

    assert!(rt.direct_on_full_stack(&obj).unwrap());
    assert_eq!(obj.countdown(&rt.interceptor(), 6).unwrap(), 6);
    assert!(rt.holder().current().is_noop());
    assert_eq!(invocations(&rt, InvocationMode::Direct), 7);
    assert_eq!(rt.metrics().invocation_duration.count(&[("mode", "direct")]), 7);
}

#[test]
fn requests_inside_full_stack_are_ignored() {
    let rt = runtime();
    let icp = rt.interceptor();
    let obj = countdown("outer");
    let other = countdown("other");

    rt.direct_on_full_stack(&obj).unwrap();
    let seen = icp
        .invoke(
            &obj,
            "probe",
            |_| {
                let one_shot = rt.direct_on(&other).unwrap();
                let full_stack = rt.direct_on_full_stack(&other).unwrap();
                (one_shot, full_stack, rt.holder().current().kind())
            },
            |_| panic!("shadow must not run"),
        )
        .unwrap();

    assert_eq!(seen, (false, false, PolicyKind::FullStack));
    assert!(rt.holder().current().is_noop());
    assert_eq!(
        rt.metrics()
            .policy_installs
            .get(&[("policy", "one_shot"), ("outcome", "ignored")]),
        1
    );
}

#[test]
fn mismatched_target_fails_before_running_anything() {
    let rt = runtime();
    let (armed, intruder) = (countdown("armed"), countdown("intruder"));

    let ran = Cell::new(false);

    rt.direct_on(&armed).unwrap();
    let err = rt
        .interceptor()
        .invoke(&intruder, "countdown", |_| ran.set(true), |_| ran.set(true))
        .unwrap_err();

    assert_eq!(err.violation_kind(), Some(ViolationKind::TargetMismatch));
    assert!(!ran.get());
    assert!(rt.holder().current().is_noop());
    assert_eq!(violations(&rt, ViolationKind::TargetMismatch), 1);

    // thread is usable again
    assert!(rt.direct_on(&armed).unwrap());
    assert_eq!(armed.countdown(&rt.interceptor(), 2).unwrap(), 1);
}

#[test]
fn mismatch_without_reset_runs_completion() {
    let cfg = config::load_from_str(
        "version: 1\nruntime:\n  reset_on_check_failure: false\n",
    )
    .unwrap();
    let rt = ShadowRuntime::new(cfg);
    let (armed, intruder) = (countdown("armed"), countdown("intruder"));

    // one-shot completion restores no-op on its own
    rt.direct_on(&armed).unwrap();
    let err = rt.interceptor().invoke(&intruder, "m", |_| (), |_| ()).unwrap_err();
    assert_eq!(err.violation_kind(), Some(ViolationKind::TargetMismatch));
    assert!(rt.holder().current().is_noop());

    // a full-stack that was never entered stays installed
    rt.direct_on_full_stack(&armed).unwrap();
    rt.interceptor().invoke(&intruder, "m", |_| (), |_| ()).unwrap_err();
    assert_eq!(rt.holder().current().kind(), PolicyKind::FullStack);
    rt.holder().reset();
}

#[test]
fn panic_in_direct_call_still_unwinds_policy() {
    let rt = runtime();
    let obj = countdown("boom");
    let icp = rt.interceptor();

    rt.direct_on_full_stack(&obj).unwrap();
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        icp.invoke(
            &obj,
            "explode",
            |o| -> Result<u32> {
                o.countdown(&icp, 2)?;
                panic!("real implementation failed");
            },
            |_| Ok(0),
        )
    }));

    assert!(caught.is_err());
    assert!(rt.holder().current().is_noop());
    assert_eq!(rt.holder().active_threads(), 0);
}

#[test]
fn out_of_order_completion_surfaces_unwind_mismatch() {
    let rt = runtime();
    let icp = rt.interceptor();
    let (a, b) = (countdown("a"), countdown("b"));

    rt.direct_on_full_stack(&a).unwrap();
    let outer = icp.enter(TargetRef::of(&a), "outer").unwrap();
    let inner = icp.enter(TargetRef::of(&b), "inner").unwrap();
    assert!(outer.is_direct() && inner.is_direct());

    assert_eq!(outer.finish().unwrap().kind(), PolicyKind::FullStack);
    let err = inner.finish().unwrap_err();
    assert_eq!(err.violation_kind(), Some(ViolationKind::UnwindMismatch));
    assert_eq!(violations(&rt, ViolationKind::UnwindMismatch), 1);
    rt.holder().reset();
}

#[test]
fn metrics_render_prometheus_text() {
    let rt = runtime();
    let obj = countdown("m");
    rt.direct_on(&obj).unwrap();
    obj.countdown(&rt.interceptor(), 1).unwrap();

    let out = rt.render_metrics();
    assert!(out.contains("# TYPE shadowcall_invocations_total counter"));
    assert!(out.contains("shadowcall_invocations_total{mode=\"direct\"} 1"));
    assert!(out.contains("shadowcall_policy_installs_total{outcome=\"applied\",policy=\"one_shot\"} 1"));
    assert!(out.contains("shadowcall_invocation_duration_micros_count{mode=\"shadow\"} 1"));
    assert!(out.contains("shadowcall_threads_active 0"));
}

#[test]
fn disabled_metrics_record_nothing() {
    let cfg = config::load_from_str("version: 1\nmetrics:\n  enabled: false\n").unwrap();
    let rt = ShadowRuntime::new(cfg);
    let obj = countdown("quiet");
    obj.countdown(&rt.interceptor(), 3).unwrap();
    assert_eq!(invocations(&rt, InvocationMode::Shadow), 0);
}

#[test]
fn demo_runs_clean_across_threads() {
    let mut cfg = ShadowConfig::default();
    cfg.demo.threads = 8;
    cfg.demo.depth = 5;
    let rt = ShadowRuntime::new(cfg.clone());

    let report = demo::run(&rt, &cfg.demo).unwrap();
    assert_eq!(report.threads, 8);
    assert_eq!(report.mismatches, 0);
    assert_eq!(report.ignored_installs, 8);
    assert_eq!(rt.holder().active_threads(), 0);
}

#[test]
fn demo_rejects_zero_depth() {
    let mut cfg = ShadowConfig::default();
    cfg.demo.depth = 0;
    let rt = ShadowRuntime::new(cfg.clone());

    let err = demo::run(&rt, &cfg.demo).unwrap_err();
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
    assert_eq!(invocations(&rt, InvocationMode::Shadow), 0);
}

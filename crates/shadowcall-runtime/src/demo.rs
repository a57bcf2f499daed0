//! Multi-thread walkthrough used by the `shadowcall-demo` binary.
//!
//! Every thread owns a recursive `Countdown` object whose real implementation
//! recurses through the interceptor and whose shadow returns zero. Per thread:
//! - no policy: the shadow answers (0)
//! - one-shot: only the outermost call is real (1)
//! - full-stack: the whole recursion is real (`depth`)

use std::thread;

use shadowcall_core::error::{Result, ShadowError};

use crate::config::DemoSection;
use crate::intercept::Interceptor;
use crate::state::ShadowRuntime;

/// Object whose `countdown` method is intercepted.
#[derive(Debug)]
pub struct Countdown {
    pub name: String,
}

impl Countdown {
    /// Real implementation: one plus the (intercepted) countdown below.
    pub fn countdown(&self, icp: &Interceptor, n: u32) -> Result<u32> {
        icp.invoke(
            self,
            "countdown",
            |real| {
                if n == 0 {
                    Ok(0)
                } else {
                    real.countdown(icp, n - 1).map(|v| v + 1)
                }
            },
            |_shadow| Ok(0),
        )?
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DemoReport {
    pub threads: usize,
    pub depth: u32,
    /// Phases whose result differed from what the installed policy implies.
    pub mismatches: usize,
    /// Install requests silently ignored while a full-stack bypass was active.
    pub ignored_installs: usize,
}

pub fn run(runtime: &ShadowRuntime, demo: &DemoSection) -> Result<DemoReport> {
    demo.validate()?;
    let depth = demo.depth;

    let results: Vec<Result<(usize, usize)>> = thread::scope(|s| {
        let mut handles = Vec::with_capacity(demo.threads);
        for i in 0..demo.threads {
            let rt = runtime.clone();
            let spawned = thread::Builder::new()
                .name(format!("demo-{i}"))
                .spawn_scoped(s, move || run_thread(&rt, i, depth));
            handles.push(spawned);
        }
        handles
            .into_iter()
            .map(|h| match h {
                Ok(h) => h
                    .join()
                    .unwrap_or_else(|_| Err(ShadowError::Internal("demo thread panicked".into()))),
                Err(e) => Err(ShadowError::Internal(format!("spawn demo thread failed: {e}"))),
            })
            .collect()
    });

    let mut report = DemoReport {
        threads: demo.threads,
        depth,
        ..DemoReport::default()
    };
    for r in results {
        let (mismatches, ignored) = r?;
        report.mismatches += mismatches;
        report.ignored_installs += ignored;
    }
    tracing::info!(?report, "demo finished");
    Ok(report)
}

fn run_thread(rt: &ShadowRuntime, idx: usize, depth: u32) -> Result<(usize, usize)> {
    let icp = rt.interceptor();
    let obj = Countdown { name: format!("countdown-{idx}") };
    let mut mismatches = 0;
    let mut ignored = 0;

    let mut expect = |phase: &str, got: u32, want: u32| {
        if got != want {
            tracing::warn!(object = %obj.name, phase, got, want, "unexpected demo result");
            mismatches += 1;
        }
    };

    expect("shadow", obj.countdown(&icp, depth)?, 0);

    rt.direct_on(&obj)?;
    expect("one_shot", obj.countdown(&icp, depth)?, 1);

    rt.direct_on_full_stack(&obj)?;
    expect("full_stack", obj.countdown(&icp, depth)?, depth);

    // A one-shot request arriving inside an active full-stack is ignored.
    rt.direct_on_full_stack(&obj)?;
    let inner = icp.invoke(
        &obj,
        "countdown",
        |real| -> Result<u32> {
            if !rt.direct_on(real)? {
                ignored += 1;
            }
            real.countdown(&icp, depth - 1).map(|v| v + 1)
        },
        |_| Ok(0),
    )??;
    expect("full_stack_nested_request", inner, depth);

    if !rt.holder().current().is_noop() {
        return Err(ShadowError::Internal(format!(
            "thread {idx} finished with an active policy: {}",
            rt.holder().current()
        )));
    }
    Ok((mismatches, ignored))
}

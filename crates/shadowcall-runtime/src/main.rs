//! shadowcall demo
//!
//! Runs the multi-thread countdown walkthrough against a fresh runtime and
//! prints the resulting metrics.
//! - Config: first argument, else `shadowcall.yaml` if present, else defaults
//! - Logging: `RUST_LOG`, else `runtime.log_filter`

use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use shadowcall_runtime::{config, demo, ShadowRuntime};

fn main() -> ExitCode {
    let path = std::env::args().nth(1);
    let cfg = match config::load_or_default(path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config load failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.runtime.log_filter));
    fmt().with_env_filter(filter).init();

    let runtime = ShadowRuntime::new(cfg.clone());
    tracing::info!(threads = cfg.demo.threads, depth = cfg.demo.depth, "shadowcall-demo starting");

    match demo::run(&runtime, &cfg.demo) {
        Ok(report) => {
            print!("{}", runtime.render_metrics());
            if report.mismatches > 0 {
                tracing::error!(mismatches = report.mismatches, "demo observed unexpected results");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

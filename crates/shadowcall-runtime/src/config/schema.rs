use serde::Deserialize;
use shadowcall_core::error::{Result, ShadowError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShadowConfig {
    pub version: u32,

    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub demo: DemoSection,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            version: 1,
            runtime: RuntimeSection::default(),
            metrics: MetricsSection::default(),
            demo: DemoSection::default(),
        }
    }
}

impl ShadowConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ShadowError::UnsupportedVersion);
        }

        self.runtime.validate()?;
        self.demo.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeSection {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Restore no-op on the calling thread when a direct-call check fails.
    #[serde(default = "default_true")]
    pub reset_on_check_failure: bool,

    /// Emit a debug event for every intercepted invocation.
    #[serde(default)]
    pub trace_invocations: bool,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            reset_on_check_failure: true,
            trace_invocations: false,
        }
    }
}

impl RuntimeSection {
    pub fn validate(&self) -> Result<()> {
        if self.log_filter.trim().is_empty() {
            return Err(ShadowError::BadConfig(
                "runtime.log_filter must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoSection {
    #[serde(default = "default_threads")]
    pub threads: usize,

    #[serde(default = "default_depth")]
    pub depth: u32,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            depth: default_depth(),
        }
    }
}

impl DemoSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.threads) {
            return Err(ShadowError::BadConfig(
                "demo.threads must be between 1 and 64".into(),
            ));
        }
        if !(1..=1024).contains(&self.depth) {
            return Err(ShadowError::BadConfig(
                "demo.depth must be between 1 and 1024".into(),
            ));
        }
        Ok(())
    }
}

fn default_log_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}
fn default_threads() -> usize {
    4
}
fn default_depth() -> u32 {
    3
}

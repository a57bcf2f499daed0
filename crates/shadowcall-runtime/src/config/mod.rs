//! Runtime config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use shadowcall_core::error::{Result, ShadowError};

pub use schema::{DemoSection, MetricsSection, RuntimeSection, ShadowConfig};

/// File picked up when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "shadowcall.yaml";

pub fn load_from_file(path: &str) -> Result<ShadowConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ShadowError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ShadowConfig> {
    let cfg: ShadowConfig = serde_yaml::from_str(s)
        .map_err(|e| ShadowError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Explicit path must exist; otherwise fall back to defaults when the
/// default file is absent.
pub fn load_or_default(path: Option<&str>) -> Result<ShadowConfig> {
    match path {
        Some(p) => load_from_file(p),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH),
        None => Ok(ShadowConfig::default()),
    }
}

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use common::config::SimConfig;

const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// Logging
// ============================================================================

// An explicit filter wins over RUST_LOG; without either, log at info.
pub fn init_tracing(filter: Option<&str>) {
    let filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        EnvFilter::new,
    );
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

// ============================================================================
// Config Loading
// ============================================================================

// Read a partial JSON config; missing fields keep their defaults. Not yet sanitized.
pub fn load_config(path: &Path) -> Result<SimConfig> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SimConfig::from_json_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

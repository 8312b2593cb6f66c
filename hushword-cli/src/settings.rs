//! Runtime configuration: JSON file in the app data directory plus env overrides.

use std::path::{Path, PathBuf};

use anyhow::Context;
use hushword_core::config::load_config;
use hushword_core::RedactConfig;
use tracing::{info, warn};

pub const ENV_MAX_JOBS: &str = "HUSHWORD_MAX_JOBS";
pub const ENV_SHRINK_RATIO: &str = "HUSHWORD_SHRINK_RATIO";

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hushword")
            .join("config.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("hushword")
            .join("config.json")
    }
}

/// Load `path` (or the default location), then apply `HUSHWORD_*` overrides.
pub fn load_runtime_config(path: Option<&Path>) -> anyhow::Result<RedactConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let mut config =
        load_config(&path).with_context(|| format!("loading config {}", path.display()))?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    info!(
        path = %path.display(),
        max_jobs = config.max_concurrent_jobs,
        shrink_ratio = config.mute_shrink_ratio,
        "config ready"
    );
    Ok(config)
}

/// Apply env-style overrides read through `lookup`. Unparseable values are ignored.
pub fn apply_env_overrides(config: &mut RedactConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(raw) = lookup(ENV_MAX_JOBS) {
        match raw.trim().parse::<usize>() {
            Ok(v) => config.max_concurrent_jobs = v,
            Err(_) => warn!(key = ENV_MAX_JOBS, value = %raw, "ignoring invalid override"),
        }
    }
    if let Some(raw) = lookup(ENV_SHRINK_RATIO) {
        match raw.trim().parse::<f64>() {
            Ok(v) => config.mute_shrink_ratio = v,
            Err(_) => warn!(key = ENV_SHRINK_RATIO, value = %raw, "ignoring invalid override"),
        }
    }
    config.normalize();
}

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExecError, ExecResult};
use crate::shape::Ppt;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_usize(profile: &str, key: &str, default: usize) -> usize {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_nonzero(profile: &str, key: &str, default: usize) -> usize {
    match profiled_env_usize(profile, key, default) {
        0 => default,
        v => v,
    }
}

/// Execution engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Active profile name (empty = default).
    #[serde(default)]
    pub profile: String,
    /// Number of pool workers. 0 = available parallelism.
    #[serde(default)]
    pub workers: usize,
    /// Partition threshold for elementwise work and fold stripes.
    #[serde(default = "default_large_ppt")]
    pub large_ppt: usize,
    /// Partition threshold for row-wise folds.
    #[serde(default = "default_small_ppt")]
    pub small_ppt: usize,
    /// Target stripes per worker in the first phase of a parallel fold.
    #[serde(default = "default_stripes_per_worker")]
    pub stripes_per_worker: usize,
    /// Chunks seeded per worker before the partition threshold applies.
    #[serde(default = "default_splits_per_worker")]
    pub splits_per_worker: usize,
}

/// Default target stripes per worker for parallel folds.
pub const DEFAULT_STRIPES_PER_WORKER: usize = 16;
/// Default number of chunks seeded per worker.
pub const DEFAULT_SPLITS_PER_WORKER: usize = 4;

fn default_large_ppt() -> usize { 16384 }
fn default_small_ppt() -> usize { 64 }
fn default_stripes_per_worker() -> usize { DEFAULT_STRIPES_PER_WORKER }
fn default_splits_per_worker() -> usize { DEFAULT_SPLITS_PER_WORKER }

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            profile: String::new(),
            workers: 0,
            large_ppt: default_large_ppt(),
            small_ppt: default_small_ppt(),
            stripes_per_worker: default_stripes_per_worker(),
            splits_per_worker: default_splits_per_worker(),
        }
    }
}

/// The two partition thresholds dispatches choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PptConfig {
    pub large: Ppt,
    pub small: Ppt,
}

impl Default for PptConfig {
    fn default() -> Self {
        ExecConfig::default().ppt()
    }
}

impl ExecConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `PARSKEL_PROFILE`. When set (e.g. `BENCH`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_opt("PARSKEL_PROFILE")
            .unwrap_or_default()
            .to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            workers: profiled_env_usize(p, "PARSKEL_WORKERS", 0),
            large_ppt: profiled_env_nonzero(p, "PARSKEL_LARGE_PPT", default_large_ppt()),
            small_ppt: profiled_env_nonzero(p, "PARSKEL_SMALL_PPT", default_small_ppt()),
            stripes_per_worker: profiled_env_nonzero(
                p,
                "PARSKEL_STRIPES_PER_WORKER",
                default_stripes_per_worker(),
            ),
            splits_per_worker: profiled_env_nonzero(
                p,
                "PARSKEL_SPLITS_PER_WORKER",
                default_splits_per_worker(),
            ),
        }
    }

    pub fn from_toml_str(text: &str) -> ExecResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ExecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> ExecResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExecError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Reject zero thresholds and splitting factors.
    pub fn validate(&self) -> ExecResult<()> {
        for (name, value) in [
            ("large_ppt", self.large_ppt),
            ("small_ppt", self.small_ppt),
            ("stripes_per_worker", self.stripes_per_worker),
            ("splits_per_worker", self.splits_per_worker),
        ] {
            if value == 0 {
                return Err(ExecError::Config(format!("{} must be >= 1", name)));
            }
        }
        Ok(())
    }

    /// Resolve worker count (0 means use available parallelism).
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.workers
        }
    }

    pub fn ppt(&self) -> PptConfig {
        PptConfig {
            large: Ppt::new(self.large_ppt).unwrap_or(Ppt::ONE),
            small: Ppt::new(self.small_ppt).unwrap_or(Ppt::ONE),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Exec config loaded (profile: {}):", self.profile_label());
        tracing::info!("  workers:     {}", self.resolved_workers());
        tracing::info!("  ppt:         large={}, small={}", self.large_ppt, self.small_ppt);
        tracing::info!(
            "  splitting:   stripes/worker={}, splits/worker={}",
            self.stripes_per_worker,
            self.splits_per_worker
        );
    }
}

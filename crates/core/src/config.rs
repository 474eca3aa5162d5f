//! Queue configuration, read from environment variables.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Tunables for the offline queue and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Scheduler tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Retries granted to a task unless overridden at enqueue.
    pub default_max_retries: u32,
    /// Terminal tasks older than this many days are eligible for cleanup.
    pub retention_days: i64,
    /// Result cache entry cap; oldest entries are evicted beyond it.
    pub cache_max_entries: usize,
    /// Upper bound for a single engine invocation, milliseconds.
    pub compute_timeout_ms: u64,
    /// Data directory for the file-backed durable store.
    pub data_dir: PathBuf,
}

impl QueueConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// All keys are prefixed `ZINSQ_`.
    pub fn from_env() -> Self {
        Self {
            tick_interval_ms: env_u64("ZINSQ_TICK_INTERVAL_MS", 1000),
            default_max_retries: env_u32("ZINSQ_MAX_RETRIES", 3),
            retention_days: env_u64("ZINSQ_RETENTION_DAYS", 30) as i64,
            cache_max_entries: env_usize("ZINSQ_CACHE_MAX_ENTRIES", 1000),
            compute_timeout_ms: env_u64("ZINSQ_COMPUTE_TIMEOUT_MS", 30_000),
            data_dir: PathBuf::from(env_or("ZINSQ_DATA_DIR", "./data")),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            default_max_retries: 3,
            retention_days: 30,
            cache_max_entries: 1000,
            compute_timeout_ms: 30_000,
            data_dir: PathBuf::from("./data"),
        }
    }
}

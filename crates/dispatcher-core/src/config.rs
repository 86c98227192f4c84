//! Typed configuration (C8, §4.8), loaded from `.env` and the process
//! environment. Both entry points load the same [`Settings`]; a binary simply
//! ignores the fields it doesn't need (mirroring how the source's
//! `WorkerSettings` extends a shared `BaseWorkerSettings`).

use serde::Deserialize;

fn default_queuer_run_interval() -> u64 {
    30
}
fn default_num_workers() -> usize {
    5
}
fn default_cluster_error_retry_attempts() -> u32 {
    3
}
fn default_lease_ttl_seconds() -> u64 {
    300
}
fn default_pop_timeout_seconds() -> u64 {
    120
}
fn default_pool_size() -> u32 {
    10
}
fn default_pool_max_overflow() -> u32 {
    20
}
fn default_pool_pre_ping() -> bool {
    true
}
fn default_loglevel() -> String {
    "INFO".to_string()
}
fn default_logfile_backup_count() -> u32 {
    3
}
fn default_logfile_maxsize() -> u64 {
    10_000_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_uri: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_pool_max_overflow")]
    pub pool_max_overflow: u32,
    #[serde(default = "default_pool_pre_ping")]
    pub pool_pre_ping: bool,

    pub redis_uri: String,
    #[serde(default = "default_cluster_error_retry_attempts")]
    pub cluster_error_retry_attempts: u32,

    #[serde(default = "default_queuer_run_interval")]
    pub queuer_run_interval: u64,
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    #[serde(default = "default_lease_ttl_seconds")]
    pub lease_ttl_seconds: u64,
    #[serde(default = "default_pop_timeout_seconds")]
    pub pop_timeout_seconds: u64,

    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    pub logfile: Option<String>,
    #[serde(default = "default_logfile_backup_count")]
    pub logfile_backup_count: u32,
    #[serde(default = "default_logfile_maxsize")]
    pub logfile_maxsize: u64,
}

impl Settings {
    /// Load settings from (in increasing priority) built-in defaults, a
    /// `.env` file in the working directory, and the process environment.
    pub fn load() -> anyhow::Result<Self> {
        // Ignore a missing .env file; it's a convenience for local dev only.
        let _ = dotenvy::dotenv();

        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        cfg.try_deserialize::<Settings>()
            .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))
    }

    pub fn lease_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lease_ttl_seconds)
    }

    pub fn pop_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pop_timeout_seconds)
    }
}

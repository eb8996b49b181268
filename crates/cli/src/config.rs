//! Command-line and environment configuration.
//!
//! Every setting can come from a flag or from the environment variable named
//! next to it; flags win.

use std::time::Duration;

use clap::Args;

use db::pool::PoolSettings;
use engine::WorkerConfig;
use nodes::HttpCallerConfig;

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Pool ceiling.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            ..PoolSettings::new(&self.database_url)
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct WorkerArgs {
    /// Independent poll loops to run in this process.
    #[arg(long, env = "WORKER_CONCURRENCY", default_value_t = 1)]
    pub concurrency: usize,

    /// Milliseconds to wait after finding the queue empty.
    #[arg(long, env = "WORKER_IDLE_MS", default_value_t = 500)]
    pub idle_ms: u64,

    /// Milliseconds to wait after a job fails on infrastructure.
    #[arg(long, env = "WORKER_ERROR_BACKOFF_MS", default_value_t = 1000)]
    pub error_backoff_ms: u64,

    /// Timeout for each `http_request` node.
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

impl WorkerArgs {
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            idle_interval: Duration::from_millis(self.idle_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
        }
    }

    pub fn http_config(&self) -> HttpCallerConfig {
        HttpCallerConfig {
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}

use std::path::PathBuf;

use tracing::trace;

/// Alarm store backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory store (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./alarms.db")
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Scheduler behavior (optional - defaults apply)
    pub scheduler: Option<SchedulerSettings>,

    /// Storage configuration (optional - defaults to in-memory)
    pub storage: Option<StorageConfig>,

    /// REST API settings (optional - defaults to localhost)
    pub api: Option<ApiSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: None,
            storage: None,
            api: None,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SchedulerSettings {
    /// Whether putMetricAlarm arms a fresh alarm immediately. When false
    /// (the default), a new alarm stays unscheduled until the next restart
    /// sweep picks it up.
    #[serde(default)]
    pub schedule_on_create: bool,

    /// Fallback poll interval while waiting for the host to report running
    /// before the post-load restart sweep.
    #[serde(default = "default_readiness_poll_secs")]
    pub readiness_poll_interval_secs: u64,

    /// Upper bound on the readiness wait. `None` (the default) means the
    /// sweep waits forever; a host that never reports running then leaves
    /// all alarms unscheduled, which is logged but never fatal.
    #[serde(default)]
    pub restart_sweep_timeout_secs: Option<u64>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            schedule_on_create: false,
            readiness_poll_interval_secs: default_readiness_poll_secs(),
            restart_sweep_timeout_secs: None,
        }
    }
}

fn default_readiness_poll_secs() -> u64 {
    1
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Optional bearer token; absent means the API is unauthenticated.
    pub auth_token: Option<String>,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth_token: None,
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_enable_cors() -> bool {
    true
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

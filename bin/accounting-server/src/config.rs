//! Configuration management for the block accounting server.
//!
//! Configuration is loaded from the base configuration file, overridden by environment
//! variables with the prefix `BLOCKACCOUNTING_`.

use core::{num::NonZeroUsize, time::Duration};

use block_accounting_engine::{DeploymentRuntimeConfig, TaskLimits};
use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// Loads the application configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `BLOCKACCOUNTING_CHAIN__HOST` corresponds to `chain.host`.
///
/// # Errors
///
/// If the configuration could not be loaded or parsed
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all application settings.
#[derive(Deserialize)]
pub struct Config {
    /// HTTP listener settings
    pub app: AppConfig,

    /// Database configuration
    pub db: DbConfig,

    /// Chain-execution service client configuration
    pub chain: ChainConfig,

    /// Deployment runtime sizing and job limits
    pub deployment: DeploymentConfig,
}

/// Application-specific configuration settings.
#[derive(Deserialize)]
pub struct AppConfig {
    /// The address to listen on (e.g., "0.0.0.0:8080")
    pub listen: String,

    /// CORS allowed origins. Use ["*"] to allow all origins
    pub cors_allowed_origins: Vec<String>,
}

/// Database configuration settings.
#[derive(Deserialize)]
pub struct DbConfig {
    /// The database connection URL
    pub db_url: String,

    /// Maximum number of database connections in the pool
    pub max_conn: NonZeroUsize,
}

/// Chain-execution service configuration settings.
#[derive(Deserialize)]
pub struct ChainConfig {
    /// Base URL of the service
    pub host: String,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// Deployment runtime configuration settings.
#[derive(Deserialize)]
pub struct DeploymentConfig {
    /// Number of worker tasks
    pub workers: NonZeroUsize,

    /// Jobs that may wait for a worker before requests are rejected
    pub queue_capacity: NonZeroUsize,

    /// How long finished jobs remain visible to pollers
    #[serde(with = "humantime_serde")]
    pub job_retention: Duration,

    pub multisig: TaskLimitsConfig,

    pub payroll: TaskLimitsConfig,

    pub set_salary: TaskLimitsConfig,
}

/// Deadline and stall threshold of one job kind.
#[derive(Deserialize)]
pub struct TaskLimitsConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(with = "humantime_serde")]
    pub stall_after: Duration,
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "BLOCKACCOUNTING";
}

impl From<TaskLimitsConfig> for TaskLimits {
    fn from(TaskLimitsConfig { timeout, stall_after }: TaskLimitsConfig) -> Self {
        TaskLimits::builder().timeout(timeout).stall_after(stall_after).build()
    }
}

impl From<DeploymentConfig> for DeploymentRuntimeConfig {
    fn from(config: DeploymentConfig) -> Self {
        DeploymentRuntimeConfig::builder()
            .workers(config.workers)
            .queue_capacity(config.queue_capacity)
            .job_retention(config.job_retention)
            .multisig(config.multisig.into())
            .payroll(config.payroll.into())
            .set_salary(config.set_salary.into())
            .build()
    }
}

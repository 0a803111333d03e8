use core_config::{AppInfo, FromEnv, app_info, cors::CorsConfig, env_optional, server::ServerConfig};

// Import database configs from the database library
use database::common::RetryConfig;
use database::postgres::PostgresConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    /// `None` when `DATABASE_URL` is unset: users are kept in memory
    pub database: Option<PostgresConfig>,
    pub retry: RetryConfig,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = env_optional("DATABASE_URL")
            .map(|_| PostgresConfig::from_env())
            .transpose()?;
        let retry = RetryConfig::from_env()?; // RETRY_* with 3 attempts, 2s initial delay
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let cors = CorsConfig::from_env()?; // Required in production

        Ok(Self {
            app: app_info!(),
            database,
            retry,
            server,
            cors,
            environment,
        })
    }
}

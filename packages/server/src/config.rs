use common::config::{ExecutionConfig, PoolConfig};
use common::retry::RetryConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Without a URL everything is kept in memory.
    #[serde(default)]
    pub url: Option<String>,
    /// Load the sample problems at start-up. Default: true.
    #[serde(default = "default_seed_samples")]
    pub seed_samples: bool,
}

fn default_seed_samples() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            seed_samples: default_seed_samples(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default(
                "server.cors.allow_origins",
                vec!["http://localhost:3000", "http://localhost:5000"],
            )?
            // Load from config/config.toml (or whatever JUDGE_CONFIG names)
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., JUDGE__EXECUTION__BASE_URL)
            .add_source(
                Environment::with_prefix("JUDGE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}

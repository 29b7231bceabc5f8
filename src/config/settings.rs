use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    /// Client backend ("memory")
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Upper bound on waiting for the service to confirm an open or a
    /// teardown, in seconds. 0 waits forever.
    #[serde(default = "default_confirmation_timeout")]
    pub confirmation_timeout_secs: u64,
    /// Capacity of the stream event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Accounts the sandbox backend accepts
    #[serde(default)]
    pub sandbox_accounts: Vec<SandboxAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SandboxAccount {
    pub access_token_key: String,
    pub id: u64,
    pub screen_name: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_confirmation_timeout() -> u64 {
    30
}

fn default_event_buffer() -> usize {
    1024
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8082)?
            .set_default("twitter.backend", "memory")?
            .set_default("twitter.confirmation_timeout_secs", 30)?
            .set_default("twitter.event_buffer", 1024)?
            .set_default("logging.format", "pretty")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // APP__SERVER__PORT, APP__TWITTER__CONFIRMATION_TIMEOUT_SECS, APP__API__KEY, ...
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl TwitterConfig {
    pub fn confirmation_timeout(&self) -> Option<Duration> {
        match self.confirmation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            confirmation_timeout_secs: default_confirmation_timeout(),
            event_buffer: default_event_buffer(),
            sandbox_accounts: vec![],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

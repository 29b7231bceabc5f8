mod settings;

pub use settings::{
    ApiConfig, LoggingConfig, SandboxAccount, ServerConfig, Settings, TwitterConfig,
};

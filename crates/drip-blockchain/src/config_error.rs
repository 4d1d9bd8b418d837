use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required secret: {0}")]
    MissingSecret(String),

    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

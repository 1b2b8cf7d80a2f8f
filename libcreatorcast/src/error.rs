//! Error types for Creatorcast

use thiserror::Error;

use crate::types::Platform;

pub type Result<T> = std::result::Result<T, CreatorcastError>;

#[derive(Error, Debug)]
pub enum CreatorcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Credential storage error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Platform not connected: {0}. Connect it first with 'cast-accounts connect {0} <URL>'")]
    PlatformNotConnected(Platform),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CreatorcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CreatorcastError::Validation(_)
            | CreatorcastError::InvalidUrl(_)
            | CreatorcastError::InvalidSchedule(_)
            | CreatorcastError::NotFound(_)
            | CreatorcastError::Auth(AuthError::InvalidSignup(_)) => 3,
            CreatorcastError::InvalidState(_) | CreatorcastError::PlatformNotConnected(_) => 4,
            CreatorcastError::Auth(_) => 2,
            CreatorcastError::Config(_)
            | CreatorcastError::Database(_)
            | CreatorcastError::Credential(_)
            | CreatorcastError::Generation(_)
            | CreatorcastError::Serialization(_) => 1,
        }
    }

    /// True for deterministic input-shape failures (`ValidationError` family)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CreatorcastError::Validation(_) | CreatorcastError::InvalidUrl(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

#[derive(Error, Debug, Clone)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Identity already registered: {0}")]
    DuplicateIdentity(String),

    #[error("Invalid signup: {0}")]
    InvalidSignup(String),

    #[error("Identity service unreachable: {0}")]
    Network(String),

    #[error("Not logged in. Run 'cast-auth login' first")]
    NotLoggedIn,
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("OS keyring unavailable: {0}")]
    KeyringUnavailable(String),

    #[error("Keyring operation failed: {0}")]
    Keyring(String),

    #[error("Token file error: {0}")]
    Io(#[from] std::io::Error),
}

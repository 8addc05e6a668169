//! Error types for ps-core
//!
//! One error enum covers every precondition a PathStore operation can
//! violate, plus transport failures surfaced by the object store. Each
//! variant maps to a process exit code for the CLI.

use thiserror::Error;

/// Result type alias for ps-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ps-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid credentials, region or endpoint
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced bucket, object or folder prefix does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destination of a create or rename is already present
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Bucket deletion attempted while objects remain
    #[error("Not empty: {0}")]
    NotEmpty(String),

    /// Local file or folder does not exist
    #[error("Local path not found: {0}")]
    LocalNotFound(String),

    /// Bucket name is claimed by another account
    #[error("Bucket name taken: {0}")]
    NameTaken(String),

    /// Caller already owns a bucket with this name
    #[error("Bucket already owned by you: {0}")]
    OwnedByCaller(String),

    /// Authentication or permission failure reported by the provider
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Any other transport or provider failure
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid argument value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Object body could not be decoded with the requested encoding
    #[error("Decode error: {0}")]
    Decode(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::InvalidArgument(_) => 2, // UsageError
            Error::Config(_) | Error::InvalidUrl(_) => 2,           // UsageError
            Error::Store(_) => 3,                                   // StoreError
            Error::Auth(_) => 4,                                    // AuthError
            Error::NotFound(_) | Error::LocalNotFound(_) | Error::ProfileNotFound(_) => 5,
            Error::AlreadyExists(_)
            | Error::NotEmpty(_)
            | Error::NameTaken(_)
            | Error::OwnedByCaller(_) => 6, // Conflict
            _ => 1,                         // GeneralError
        }
    }
}

/// Shared error type used across all leadbot crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure or non-2xx status from an outbound call.
    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The completion service answered with an error.
    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The conversation table rejected a read or write.
    #[error("store: {0}")]
    Store(String),

    #[error("config: {0}")]
    Config(String),

    /// Missing or unusable credentials.
    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

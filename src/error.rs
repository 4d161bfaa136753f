use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Feed Errors
    #[error("Feed subscription failed: {0}")]
    Subscription(String),

    #[error("Feed message could not be decoded: {0}")]
    FeedDecode(String),

    // Parsing Errors
    #[error("Invalid value for {field}: {raw_value:?}")]
    Parse {
        field: &'static str,
        raw_value: String,
    },

    #[error("Every record in a batch of {0} failed validation")]
    EmptyAggregate(usize),

    // Persistence Errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    // Transport Errors
    #[error("Transport error: {0}")]
    Transport(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub fn parse(field: &'static str, raw_value: &str) -> Self {
        Error::Parse {
            field,
            raw_value: raw_value.to_string(),
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::ConfigError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

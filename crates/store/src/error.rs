use std::time::Duration;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cache connection failed: {0}")]
    Connect(String),

    #[error("Cache connection is not open")]
    NotConnected,

    #[error("Cache command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

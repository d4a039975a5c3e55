#![warn(clippy::unwrap_used)]

pub mod backend;
pub mod client;
pub mod error;
pub mod local;
pub mod signal;
pub mod store;
pub mod token;

pub use backend::{CacheBackend, CacheStore};
pub use client::RedisBackend;
pub use error::{StoreError, StoreResult};
pub use local::LocalBackend;
pub use signal::{SignalOutcome, WriteListener, WriteSignal};
pub use store::JourneyStore;
pub use token::SystemTokenCache;

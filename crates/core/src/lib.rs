#![warn(clippy::unwrap_used)]

pub mod config;
pub mod types;

pub use config::AppConfig;
pub use types::{JourneyData, JourneyId, JourneyKey, Principal};

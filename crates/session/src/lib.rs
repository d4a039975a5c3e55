//! Per-journey session state for multi-page wizards.
//!
//! A journey is started by [`bootstrap`], which puts a fresh journey id in the
//! URL. Every journey-aware route runs [`loader::load_journey`], which reads
//! the stored state into a [`JourneySession`]. Handlers finish through a
//! [`ResponseFinalizer`], which writes the state back before the redirect or
//! render leaves the server.

#![warn(clippy::unwrap_used)]

pub mod bootstrap;
pub mod finalizer;
pub mod loader;
pub mod session;
pub mod views;

pub use bootstrap::{start_new_journey, JourneyBootstrap};
pub use finalizer::ResponseFinalizer;
pub use loader::{JourneyLoader, JOURNEY_ID_PARAM};
pub use session::{FlushOutcome, FlushPolicy, JourneySession};
pub use views::{JsonViews, ViewRenderer, Views};

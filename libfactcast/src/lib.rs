//! Factcast - a daily fact bot
//!
//! Once per period a language model is asked for a short fact, the fact is
//! kept in a local store, posted to X, and announced in a Slack channel.

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod generator;
pub mod logging;
pub mod notifier;
pub mod oauth;
pub mod publisher;
pub mod routine;
pub mod schedule;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credentials, OAuthCredentials};
pub use error::{FactcastError, Result};
pub use routine::{DailyRoutine, RoutineReport};
pub use store::FactStore;
pub use types::{Fact, FactStatus};

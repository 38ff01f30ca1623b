//! Core library for the `weather-etl` pipeline.
//!
//! This crate defines:
//! - Configuration loading and saving
//! - The four pipeline tasks (readiness check, extract, transform, save)
//! - Retry policy, failure notification and scheduling around them
//!
//! It is used by `weather-etl-cli`, but can also be driven by any other host process.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod notify;
pub mod persist;
pub mod pipeline;
pub mod retry;
pub mod schedule;
pub mod sensor;
pub mod transform;

pub use config::{Config, EmailConfig};
pub use error::PipelineError;
pub use model::{RawWeatherReading, RunOutcome, WeatherReport};
pub use notify::{Notifier, notifier_from_config};
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
pub use schedule::{Schedule, Scheduler};

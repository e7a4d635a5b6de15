//! Forecast Relay
//!
//! Resolves a location progressively (continent → country → province)
//! through AccuWeather's hierarchical location API, caching intermediate
//! results per client session, then relays the daily forecast for the
//! resolved location verbatim.

pub mod config;
pub mod error;
pub mod forecast;
pub mod location;
pub mod pipeline;
pub mod server;
pub mod upstream;

pub use config::{ForecastPeriod, ProviderConfig};
pub use error::RelayError;
pub use pipeline::{CountryRequest, ForecastRequest, Pipeline, RegionRequest};

/// Result type used throughout the relay.
pub type Result<T> = std::result::Result<T, RelayError>;

//! Provider configuration, loaded once at startup and shared read-only.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://dataservice.accuweather.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Daily forecast horizon requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForecastPeriod {
    #[serde(rename = "1day")]
    OneDay,
    #[default]
    #[serde(rename = "5day")]
    FiveDay,
    #[serde(rename = "10day")]
    TenDay,
    #[serde(rename = "15day")]
    FifteenDay,
}

impl ForecastPeriod {
    /// Path segment used by the daily forecast endpoint.
    pub fn as_path(&self) -> &'static str {
        match self {
            Self::OneDay => "1day",
            Self::FiveDay => "5day",
            Self::TenDay => "10day",
            Self::FifteenDay => "15day",
        }
    }
}

impl fmt::Display for ForecastPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

impl FromStr for ForecastPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1day" | "1" => Ok(Self::OneDay),
            "5day" | "5" => Ok(Self::FiveDay),
            "10day" | "10" => Ok(Self::TenDay),
            "15day" | "15" => Ok(Self::FifteenDay),
            _ => Err(format!(
                "Unknown period '{}'. Use one of: 1day, 5day, 10day, 15day.",
                s
            )),
        }
    }
}

/// Immutable settings injected into every component that talks to the provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub period: ForecastPeriod,
    pub base_url: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>, period: ForecastPeriod) -> Self {
        Self {
            api_key: api_key.into(),
            period,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject settings that would make every upstream call fail.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key is empty. Set --api-key or ACCUWEATHER_API_KEY.".into());
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(format!(
                "Base URL '{}' must be an HTTP or HTTPS URL",
                self.base_url
            ));
        }
        if self.timeout.is_zero() {
            return Err("Timeout must be at least one second".into());
        }
        if self.timeout > Duration::from_secs(MAX_TIMEOUT_SECS) {
            return Err(format!("Timeout cannot exceed {} seconds", MAX_TIMEOUT_SECS));
        }
        Ok(())
    }
}

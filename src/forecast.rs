//! Daily forecast retrieval for a resolved location key.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ForecastPeriod;
use crate::error::RelayError;
use crate::location::{ForecastReport, LocationKey};
use crate::upstream::Upstream;

pub struct ForecastFetcher {
    upstream: Arc<dyn Upstream>,
    period: ForecastPeriod,
}

impl ForecastFetcher {
    pub fn new(upstream: Arc<dyn Upstream>, period: ForecastPeriod) -> Self {
        Self { upstream, period }
    }

    /// Fetch the configured daily forecast. The payload is returned untouched.
    ///
    /// A missing or blank key yields `Ok(None)` without contacting the provider.
    pub fn fetch(&self, key: Option<&LocationKey>) -> Result<Option<ForecastReport>, RelayError> {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            debug!("no location key, skipping forecast lookup");
            return Ok(None);
        };

        let report = self.upstream.get_json(
            &format!("forecasts/v1/daily/{}/{}", self.period.as_path(), key),
            &[],
        )?;
        info!(%key, period = %self.period, "fetched forecast");
        Ok(Some(ForecastReport(report)))
    }
}

//! Pipeline orchestrator — the three public entry points.
//!
//! Region request:   continent → countries (cached) → English names
//! Country request:  cached countries → country id → admin areas (cached) → English names
//! Forecast request: cached country id → location key → daily forecast
//!
//! The caller owns the [`SessionCache`] and passes it into every call.
//! A failing stage aborts the rest; the session is only written after the
//! stage that produced the value succeeded.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::ProviderConfig;
use crate::error::RelayError;
use crate::forecast::ForecastFetcher;
use crate::location::{english_names, ForecastReport, RegionResolver, SessionCache};
use crate::upstream::{HttpUpstream, Upstream};

/// Body of a forecast request. All three fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(default)]
    pub continent: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
}

/// Body of a continent-only request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionRequest {
    #[serde(default)]
    pub continent: Option<String>,
}

/// Body of a country-only request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountryRequest {
    #[serde(default)]
    pub country: Option<String>,
}

pub struct Pipeline {
    resolver: RegionResolver,
    fetcher: ForecastFetcher,
}

impl Pipeline {
    /// Pipeline talking to the real provider over HTTP.
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::with_upstream(Arc::new(HttpUpstream::new(config)), config)
    }

    /// Pipeline over any transport (used by tests and alternative backends).
    pub fn with_upstream(upstream: Arc<dyn Upstream>, config: &ProviderConfig) -> Self {
        Self {
            resolver: RegionResolver::new(upstream.clone()),
            fetcher: ForecastFetcher::new(upstream, config.period),
        }
    }

    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    pub fn fetcher(&self) -> &ForecastFetcher {
        &self.fetcher
    }

    /// Resolve a province to its location key under the session's country and fetch its forecast.
    ///
    /// Requires a prior country request in the same session; the country
    /// code is never re-resolved here. `Ok(None)` when no city matches.
    #[instrument(skip(self, session))]
    pub fn route_forecast_request(
        &self,
        session: &mut SessionCache,
        request: &ForecastRequest,
    ) -> Result<Option<ForecastReport>, RelayError> {
        let (Some(_continent), Some(_country), Some(province)) = (
            present(&request.continent),
            present(&request.country),
            present(&request.province),
        ) else {
            return Err(RelayError::MissingInputData);
        };

        let country = session
            .country_code()
            .cloned()
            .ok_or_else(|| RelayError::precondition("resolve a country before requesting a forecast"))?;

        let Some(key) = self.resolver.location_key(Some(&country), province)? else {
            info!(%country, province, "no location key, nothing to forecast");
            return Ok(None);
        };
        session.set_location_key(key.clone());

        let report = self.fetcher.fetch(Some(&key))?;
        if report.is_some() {
            session.mark_forecast_fetched();
        }
        Ok(report)
    }

    /// Countries of a continent as English names; caches the raw list.
    #[instrument(skip(self, session))]
    pub fn resolve_country_list(
        &self,
        session: &mut SessionCache,
        continent: Option<&str>,
    ) -> Result<Vec<String>, RelayError> {
        let continent = continent
            .filter(|c| !c.is_empty())
            .ok_or(RelayError::MissingInputData)?;

        let countries = self.resolver.countries_by_region(continent)?;
        let names = english_names(&countries)?;
        session.set_countries(countries);
        Ok(names)
    }

    /// Provinces of a cached country as English names; caches the raw list.
    ///
    /// `Ok(None)` when the name matches no cached country, leaving the session untouched.
    #[instrument(skip(self, session))]
    pub fn resolve_province_list(
        &self,
        session: &mut SessionCache,
        country: Option<&str>,
    ) -> Result<Option<Vec<String>>, RelayError> {
        let country = country
            .filter(|c| !c.is_empty())
            .ok_or(RelayError::MissingInputData)?;
        let countries = session
            .countries()
            .ok_or_else(|| RelayError::precondition("resolve a continent before requesting provinces"))?;

        let Some(code) = RegionResolver::country_code(countries, country)? else {
            return Ok(None);
        };
        session.set_country_code(code.clone());

        let provinces = self.resolver.provinces_by_country(Some(&code))?;
        let names = english_names(&provinces)?;
        session.set_provinces(provinces);
        Ok(Some(names))
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

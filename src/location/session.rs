//! Per-session cache of intermediate resolution results.
//!
//! One instance per client session. Each successful step overwrites its slot;
//! nothing is merged and nothing is persisted.

use serde::Serialize;

use super::types::{AreaRecord, CountryId, LocationKey};

/// How far a session has progressed through the resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SessionState {
    Empty,
    CountriesResolved,
    CountryCodeSet,
    ProvincesResolved,
    LocationKeyResolved,
    ForecastFetched,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCache {
    countries: Option<Vec<AreaRecord>>,
    provinces: Option<Vec<AreaRecord>>,
    country_code: Option<CountryId>,
    location_key: Option<LocationKey>,
    forecast_fetched: bool,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached country list. An empty list reads back as nothing cached.
    pub fn countries(&self) -> Option<&[AreaRecord]> {
        self.countries.as_deref().filter(|c| !c.is_empty())
    }

    pub fn set_countries(&mut self, countries: Vec<AreaRecord>) {
        self.countries = Some(countries);
    }

    /// Cached province list. An empty list reads back as nothing cached.
    pub fn provinces(&self) -> Option<&[AreaRecord]> {
        self.provinces.as_deref().filter(|p| !p.is_empty())
    }

    pub fn set_provinces(&mut self, provinces: Vec<AreaRecord>) {
        self.provinces = Some(provinces);
    }

    pub fn country_code(&self) -> Option<&CountryId> {
        self.country_code.as_ref()
    }

    pub fn set_country_code(&mut self, code: CountryId) {
        self.country_code = Some(code);
    }

    pub fn location_key(&self) -> Option<&LocationKey> {
        self.location_key.as_ref()
    }

    pub fn set_location_key(&mut self, key: LocationKey) {
        self.location_key = Some(key);
        self.forecast_fetched = false;
    }

    pub fn mark_forecast_fetched(&mut self) {
        self.forecast_fetched = true;
    }

    /// The furthest state this session has reached.
    pub fn state(&self) -> SessionState {
        if self.location_key.is_some() {
            if self.forecast_fetched {
                SessionState::ForecastFetched
            } else {
                SessionState::LocationKeyResolved
            }
        } else if self.provinces().is_some() {
            SessionState::ProvincesResolved
        } else if self.country_code.is_some() {
            SessionState::CountryCodeSet
        } else if self.countries().is_some() {
            SessionState::CountriesResolved
        } else {
            SessionState::Empty
        }
    }
}

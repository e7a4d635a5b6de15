//! Region resolution — the dependent lookup chain.
//!
//! Region code → countries → (country name → country id) → admin areas,
//! and (country id, province name) → city search → location key.
//! Every match is exact and the first hit in provider order wins.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::types::{
    scalar_text, AreaRecord, CountryId, LocationKey, RegionCode, ID_FIELD, KEY_FIELD,
    ENGLISH_NAME, LOCALIZED_NAME,
};
use crate::error::RelayError;
use crate::upstream::Upstream;

pub struct RegionResolver {
    upstream: Arc<dyn Upstream>,
}

impl RegionResolver {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Countries of a continent-level region, verbatim.
    ///
    /// The code is validated before any lookup is issued.
    pub fn countries_by_region(&self, region: &str) -> Result<Vec<AreaRecord>, RelayError> {
        let region: RegionCode = region.parse()?;
        let body = self
            .upstream
            .get_json(&format!("locations/v1/countries/{}", region), &[])?;
        let countries = expect_list(body, "country list")?;
        info!(%region, count = countries.len(), "resolved countries");
        Ok(countries)
    }

    /// Id of the first country whose English or localized name equals `target`.
    ///
    /// `Ok(None)` when nothing matches.
    pub fn country_code(
        countries: &[AreaRecord],
        target: &str,
    ) -> Result<Option<CountryId>, RelayError> {
        for (i, entry) in countries.iter().enumerate() {
            let record = entry
                .as_object()
                .ok_or_else(|| RelayError::malformed(format!("country entry {} is not an object", i)))?;

            let matches = [ENGLISH_NAME, LOCALIZED_NAME]
                .iter()
                .any(|field| record.get(*field).and_then(Value::as_str) == Some(target));
            if !matches {
                continue;
            }

            let id = record
                .get(ID_FIELD)
                .and_then(scalar_text)
                .ok_or_else(|| RelayError::malformed(format!("country '{}' has no {}", target, ID_FIELD)))?;
            debug!(country = target, %id, "matched country");
            return Ok(Some(CountryId(id)));
        }
        debug!(country = target, "no country matched");
        Ok(None)
    }

    /// Admin areas (provinces) of a resolved country.
    pub fn provinces_by_country(
        &self,
        country: Option<&CountryId>,
    ) -> Result<Vec<AreaRecord>, RelayError> {
        let country = country.ok_or_else(|| RelayError::precondition("no country has been resolved"))?;
        let body = self
            .upstream
            .get_json(&format!("locations/v1/adminareas/{}", country), &[])?;
        let provinces = expect_list(body, "admin area list")?;
        info!(%country, count = provinces.len(), "resolved provinces");
        Ok(provinces)
    }

    /// Location key of the first city named `province` within a resolved country.
    ///
    /// An empty name or an empty search result is `Ok(None)`.
    pub fn location_key(
        &self,
        country: Option<&CountryId>,
        province: &str,
    ) -> Result<Option<LocationKey>, RelayError> {
        let country = country.ok_or_else(|| RelayError::precondition("no country has been resolved"))?;
        if province.is_empty() {
            return Ok(None);
        }

        let body = self.upstream.get_json(
            &format!("locations/v1/cities/{}/search", country),
            &[("q", province)],
        )?;
        let results = expect_list(body, "city search result")?;

        let key = results
            .iter()
            .filter_map(|record| record.get(KEY_FIELD))
            .find_map(scalar_text)
            .map(LocationKey);

        match &key {
            Some(k) => info!(%country, province, key = %k, "resolved location key"),
            None => debug!(%country, province, "city search returned no key"),
        }
        Ok(key)
    }
}

fn expect_list(body: Value, what: &str) -> Result<Vec<AreaRecord>, RelayError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(RelayError::InvalidResponse(format!(
            "expected a {} array, got {}",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

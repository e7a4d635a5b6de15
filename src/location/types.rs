//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// Provider field holding a record's display name in English.
pub const ENGLISH_NAME: &str = "EnglishName";
/// Provider field holding a record's name in the provider's locale.
pub const LOCALIZED_NAME: &str = "LocalizedName";
/// Provider field holding a country or admin-area identifier.
pub const ID_FIELD: &str = "ID";
/// Provider field holding a city's location key.
pub const KEY_FIELD: &str = "Key";

/// A raw provider record (country, admin area, or city), kept verbatim.
pub type AreaRecord = Value;

/// Continent-level region accepted by the first lookup stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionCode {
    #[serde(rename = "AFR")]
    Africa,
    #[serde(rename = "ANT")]
    Antarctica,
    #[serde(rename = "ARC")]
    Arctic,
    #[serde(rename = "ASI")]
    Asia,
    #[serde(rename = "CAC")]
    CentralAmerica,
    #[serde(rename = "EUR")]
    Europe,
    #[serde(rename = "MEA")]
    MiddleEast,
    #[serde(rename = "NAM")]
    NorthAmerica,
    #[serde(rename = "OCN")]
    Oceania,
    #[serde(rename = "SAM")]
    SouthAmerica,
}

impl RegionCode {
    pub const ALL: [RegionCode; 10] = [
        Self::Africa,
        Self::Antarctica,
        Self::Arctic,
        Self::Asia,
        Self::CentralAmerica,
        Self::Europe,
        Self::MiddleEast,
        Self::NorthAmerica,
        Self::Oceania,
        Self::SouthAmerica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Africa => "AFR",
            Self::Antarctica => "ANT",
            Self::Arctic => "ARC",
            Self::Asia => "ASI",
            Self::CentralAmerica => "CAC",
            Self::Europe => "EUR",
            Self::MiddleEast => "MEA",
            Self::NorthAmerica => "NAM",
            Self::Oceania => "OCN",
            Self::SouthAmerica => "SAM",
        }
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive: `"eur"` is not a region.
impl FromStr for RegionCode {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| RelayError::invalid_region(s))
    }
}

/// Provider identifier of a resolved country (e.g. "FR").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(pub String);

impl fmt::Display for CountryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token the forecast endpoint uses to identify a city.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationKey(pub String);

impl LocationKey {
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Forecast payload as returned by the provider. Never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastReport(pub Value);

/// Project records to their English names, in list order.
///
/// Every record must be an object carrying a string `EnglishName`.
pub fn english_names(records: &[AreaRecord]) -> Result<Vec<String>, RelayError> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            record
                .get(ENGLISH_NAME)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    RelayError::malformed(format!("record {} has no string {}", i, ENGLISH_NAME))
                })
        })
        .collect()
}

/// Render a scalar JSON field as text. Keys arrive as strings but numbers are tolerated.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

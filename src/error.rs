//! Relay error kinds and their uniform wire payloads.
//!
//! Every pipeline stage returns `Result<T, RelayError>`. The payload shapes
//! are what clients of the relay already parse, so they stay stable.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Trace metadata the provider attaches to error bodies. Never surfaced.
const TRACE_FIELD: &str = "Reference";

const MISSING_DATA_MESSAGE: &str = "continent, or country or province data is missing";

/// Everything that can go wrong while resolving a location or fetching a forecast.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    #[error("Region code is not valid: '{code}'")]
    InvalidRegionCode { code: String },

    #[error("Invalid input: continent, or country or province data is missing")]
    MissingInputData,

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Malformed upstream record: {0}")]
    MalformedUpstreamRecord(String),

    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16, body: Map<String, Value> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn invalid_region<S: Into<String>>(code: S) -> Self {
        Self::InvalidRegionCode { code: code.into() }
    }

    pub fn precondition<S: Into<String>>(what: S) -> Self {
        Self::MissingPrecondition(what.into())
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedUpstreamRecord(message.into())
    }

    /// Build an upstream error from a non-2xx status and its raw body text.
    ///
    /// JSON object bodies keep every field except the trace reference.
    /// Anything else is wrapped as `{"Message": <raw text>}`.
    pub fn upstream(status: u16, raw_body: &str) -> Self {
        let body = match serde_json::from_str::<Value>(raw_body) {
            Ok(Value::Object(map)) => strip_trace_fields(map),
            _ => {
                let mut map = Map::new();
                map.insert("Message".into(), Value::String(raw_body.trim().to_string()));
                map
            }
        };
        Self::Upstream { status, body }
    }

    /// True when the caller sent something unusable, false when the failure
    /// came from the provider, the network, or the relay itself.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRegionCode { .. } | Self::MissingInputData | Self::MissingPrecondition(_)
        )
    }

    /// The uniform JSON error body returned to clients.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::InvalidRegionCode { code } => json!({
                "ValueError": "Region code is not valid",
                "Region_Code": code,
            }),
            Self::MissingInputData => json!({ "InputError": MISSING_DATA_MESSAGE }),
            Self::MissingPrecondition(what) => json!({ "PreconditionError": what }),
            Self::MalformedUpstreamRecord(msg) | Self::InvalidResponse(msg) => {
                json!({ "RecordError": msg })
            }
            Self::Upstream { body, .. } => json!({
                "ACCUWEATHER_ERROR_RESPONSE": { "error": body }
            }),
            Self::Network(msg) => json!({ "NetworkError": msg }),
            Self::Internal(msg) => json!({ "InternalError": msg }),
        }
    }
}

/// Drop provider trace metadata from an error body, keeping everything else.
pub fn strip_trace_fields(mut body: Map<String, Value>) -> Map<String, Value> {
    body.remove(TRACE_FIELD);
    body
}

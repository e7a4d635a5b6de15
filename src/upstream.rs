//! Transport to the weather provider.
//!
//! Every lookup goes through [`Upstream::get_json`]: one blocking GET with
//! the API key attached and a fixed timeout. Non-2xx responses become
//! [`RelayError::Upstream`] with trace fields stripped; transport failures
//! (including timeouts) become [`RelayError::Network`]. No retries.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::RelayError;

const USER_AGENT: &str = concat!("ForecastRelay/", env!("CARGO_PKG_VERSION"));

/// A source of provider JSON, addressed by path relative to the base URL.
pub trait Upstream: Send + Sync {
    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RelayError>;
}

/// ureq-backed transport used in production.
pub struct HttpUpstream {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpUpstream {
    pub fn new(config: &ProviderConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Upstream for HttpUpstream {
    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RelayError> {
        let url = self.endpoint_url(path);
        debug!(%url, "upstream request");

        let mut request = self.agent.get(&url).query("apikey", &self.api_key);
        for (name, value) in query {
            request = request.query(name, value);
        }

        match request.call() {
            Ok(response) => response
                .into_json::<Value>()
                .map_err(|e| RelayError::InvalidResponse(e.to_string())),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                warn!(%url, status, "upstream returned an error status");
                Err(RelayError::upstream(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(%url, error = %transport, "upstream transport failure");
                Err(RelayError::Network(transport.to_string()))
            }
        }
    }
}

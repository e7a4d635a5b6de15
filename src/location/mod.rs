//! Location subsystem for the forecast relay.
//!
//! Resolves continent → country → province through the provider's
//! hierarchical lookup API and keeps per-session intermediate results.

pub mod resolver;
pub mod session;
pub mod types;

pub use resolver::RegionResolver;
pub use session::{SessionCache, SessionState};
pub use types::{english_names, AreaRecord, CountryId, ForecastReport, LocationKey, RegionCode};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::RelayError;
use crate::pipeline::{CountryRequest, ForecastRequest, RegionRequest};

use super::state::AppState;

/// Request header naming the client session. Every response echoes it, so a
/// client that sent none learns the id minted for it.
pub const SESSION_HEADER: &str = "x-session-id";

// ─── Error response ──────────────────────────────────────────────

pub(super) struct ApiError(RelayError);

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            return match self.0 {
                RelayError::MissingPrecondition(_) => StatusCode::CONFLICT,
                _ => StatusCode::BAD_REQUEST,
            };
        }
        match self.0 {
            RelayError::Network(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0.payload())).into_response()
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "NotFound": what }))).into_response()
}

fn respond<T: Serialize>(result: Result<Option<T>, RelayError>, missing: &str) -> Response {
    match result {
        Ok(Some(body)) => Json(body).into_response(),
        Ok(None) => not_found(missing),
        Err(e) => ApiError(e).into_response(),
    }
}

/// The caller's session id, or a fresh one when the header is absent or blank.
fn session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn with_session(mut response: Response, session: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(session) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

/// Malformed or mistyped JSON bodies get the same answer as missing fields.
fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RelayError> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        debug!(%rejection, "rejected request body");
        RelayError::MissingInputData
    })
}

fn log_outcome<T>(route: &str, session: &str, result: &Result<T, RelayError>, start: Instant) {
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(_) => info!(route, session, elapsed_ms, "ok"),
        Err(e) => info!(route, session, elapsed_ms, error = %e, "failed"),
    }
}

// ─── POST /weather-forecast ──────────────────────────────────────

pub async fn weather_forecast(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ForecastRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let session = session_id(&headers);

    let result = match read_body(payload) {
        Ok(request) => {
            state
                .run(&session, move |pipeline, cache| {
                    pipeline.route_forecast_request(cache, &request)
                })
                .await
        }
        Err(e) => Err(e),
    };

    log_outcome("/weather-forecast", &session, &result, start);
    with_session(
        respond(result, "no location key found for the requested province"),
        &session,
    )
}

// ─── POST /country_response ──────────────────────────────────────

pub async fn country_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<RegionRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let session = session_id(&headers);

    let result = match read_body(payload) {
        Ok(request) => {
            state
                .run(&session, move |pipeline, cache| {
                    pipeline.resolve_country_list(cache, request.continent.as_deref())
                })
                .await
        }
        Err(e) => Err(e),
    };

    log_outcome("/country_response", &session, &result, start);
    with_session(respond(result.map(Some), "no countries"), &session)
}

// ─── POST /province_response ─────────────────────────────────────

pub async fn province_list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CountryRequest>, JsonRejection>,
) -> Response {
    let start = Instant::now();
    let session = session_id(&headers);

    let result = match read_body(payload) {
        Ok(request) => {
            state
                .run(&session, move |pipeline, cache| {
                    pipeline.resolve_province_list(cache, request.country.as_deref())
                })
                .await
        }
        Err(e) => Err(e),
    };

    log_outcome("/province_response", &session, &result, start);
    with_session(
        respond(result, "country not found in the cached country list"),
        &session,
    )
}

//! Route-level tests for the relay's HTTP surface.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use forecast_relay::server::{build_router, SESSION_HEADER};
use forecast_relay::upstream::Upstream;
use forecast_relay::{ForecastPeriod, Pipeline, ProviderConfig, RelayError};
use serde_json::{json, Value};
use tower::ServiceExt;

/// In-memory provider keyed by `path` or `path?q=value`.
struct FakeProvider {
    replies: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl FakeProvider {
    fn accuweather() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            "locations/v1/countries/EUR".to_string(),
            json!([
                {"ID": "FR", "EnglishName": "France", "LocalizedName": "France"},
                {"ID": "IT", "EnglishName": "Italy", "LocalizedName": "Italia"}
            ]),
        );
        replies.insert(
            "locations/v1/adminareas/FR".to_string(),
            json!([{"ID": "IDF", "EnglishName": "Ile-de-France"}]),
        );
        replies.insert(
            "locations/v1/cities/FR/search?q=Paris".to_string(),
            json!([{"Key": "123"}]),
        );
        replies.insert(
            "locations/v1/cities/FR/search?q=Nowhere".to_string(),
            json!([]),
        );
        replies.insert(
            "forecasts/v1/daily/5day/123".to_string(),
            json!({"DailyForecasts": [{"Date": "2026-10-19"}]}),
        );
        Self {
            replies,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl Upstream for FakeProvider {
    fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, RelayError> {
        let mut request = path.to_string();
        if let Some((name, value)) = query.first() {
            request = format!("{}?{}={}", request, name, value);
        }
        self.calls.lock().unwrap().push(request.clone());
        self.replies.get(&request).cloned().ok_or_else(|| {
            RelayError::upstream(
                404,
                r#"{"Code":"ResourceNotFound","Message":"not here","Reference":"/x"}"#,
            )
        })
    }
}

fn app() -> (Router, Arc<FakeProvider>) {
    let provider = Arc::new(FakeProvider::accuweather());
    let config = ProviderConfig::new("test-key", ForecastPeriod::FiveDay);
    let pipeline = Pipeline::with_upstream(provider.clone(), &config);
    (build_router(pipeline), provider)
}

struct Reply {
    status: StatusCode,
    session: Option<String>,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let session = response
        .headers()
        .get(SESSION_HEADER)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply { status, session, body }
}

async fn post_raw(app: &Router, uri: &str, session: Option<&str>, body: Value) -> Reply {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = session {
        builder = builder.header(SESSION_HEADER, id);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

async fn post(app: &Router, uri: &str, session: Option<&str>, body: Value) -> (StatusCode, Value) {
    let reply = post_raw(app, uri, session, body).await;
    (reply.status, reply.body)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_three_step_flow() {
    let (app, provider) = app();
    let session = Some("tab-1");

    let (status, body) = post(&app, "/country_response", session, json!({"continent": "EUR"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["France", "Italy"]));

    let (status, body) = post(&app, "/province_response", session, json!({"country": "France"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Ile-de-France"]));

    let (status, body) = post(
        &app,
        "/weather-forecast",
        session,
        json!({"continent": "EUR", "country": "France", "province": "Paris"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"DailyForecasts": [{"Date": "2026-10-19"}]}));

    assert_eq!(provider.calls.lock().unwrap().len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_region() {
    let (app, provider) = app();
    let (status, body) = post(&app, "/country_response", None, json!({"continent": "XXX"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"ValueError": "Region code is not valid", "Region_Code": "XXX"})
    );
    assert!(provider.calls.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forecast_missing_province() {
    let (app, _) = app();
    let (status, body) = post(
        &app,
        "/weather-forecast",
        None,
        json!({"continent": "EUR", "country": "France"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"InputError": "continent, or country or province data is missing"})
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_province_before_continent_is_conflict() {
    let (app, _) = app();
    let (status, body) = post(&app, "/province_response", None, json!({"country": "France"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.get("PreconditionError").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_country_and_city_are_not_found() {
    let (app, _) = app();
    let session = Some("tab-2");
    post(&app, "/country_response", session, json!({"continent": "EUR"})).await;

    let (status, body) = post(&app, "/province_response", session, json!({"country": "Narnia"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("NotFound").is_some());

    post(&app, "/province_response", session, json!({"country": "France"})).await;
    let (status, _) = post(
        &app,
        "/weather-forecast",
        session,
        json!({"continent": "EUR", "country": "France", "province": "Nowhere"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upstream_error_is_bad_gateway() {
    let (app, _) = app();
    let (status, body) = post(&app, "/country_response", None, json!({"continent": "ASI"})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body,
        json!({
            "ACCUWEATHER_ERROR_RESPONSE": {
                "error": {"Code": "ResourceNotFound", "Message": "not here"}
            }
        })
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sessions_do_not_share_state() {
    let (app, _) = app();
    post(&app, "/country_response", Some("alice"), json!({"continent": "EUR"})).await;
    let (status, _) = post(&app, "/province_response", Some("alice"), json!({"country": "France"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/province_response", Some("bob"), json!({"country": "France"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(
        &app,
        "/weather-forecast",
        Some("bob"),
        json!({"continent": "EUR", "country": "France", "province": "Paris"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_headerless_clients_do_not_share_state() {
    let (app, _) = app();

    let reply = post_raw(&app, "/country_response", None, json!({"continent": "EUR"})).await;
    assert_eq!(reply.status, StatusCode::OK);
    let first = reply.session.expect("minted session id");

    let reply = post_raw(&app, "/province_response", None, json!({"country": "France"})).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    let second = reply.session.expect("minted session id");
    assert_ne!(first, second);

    let reply = post_raw(
        &app,
        "/weather-forecast",
        None,
        json!({"continent": "EUR", "country": "France", "province": "Paris"}),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    // The minted id resumes the first client's session.
    let reply = post_raw(&app, "/province_response", Some(&first), json!({"country": "France"})).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.session.as_deref(), Some(first.as_str()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_client_session_id_is_echoed() {
    let (app, _) = app();
    let reply = post_raw(&app, "/country_response", Some("tab-9"), json!({"continent": "XXX"})).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.session.as_deref(), Some("tab-9"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mistyped_body_is_input_error() {
    let (app, provider) = app();
    let (status, body) = post(&app, "/country_response", None, json!({"continent": 5})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"InputError": "continent, or country or province data is missing"})
    );
    assert!(provider.calls.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_body_without_json_content_type_is_input_error() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/weather-forecast")
        .body(Body::from(r#"{"continent":"EUR"}"#))
        .unwrap();
    let reply = send(&app, request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.get("InputError").is_some());
    assert!(reply.session.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unparseable_body_is_input_error() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/province_response")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let reply = send(&app, request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.get("InputError").is_some());
}

//! HttpTransport against an in-process axum controller stub.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use solarcfg_core::{ChangeSet, ResourceId, TransportError};
use solarcfg_engine::{ConfigScreen, HttpTransport, SaveOutcome, Transport};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Stub {
    battery_profile: Arc<Mutex<Value>>,
    patches: Arc<Mutex<Vec<Value>>>,
}

async fn get_profile(State(stub): State<Stub>) -> Json<Value> {
    Json(stub.battery_profile.lock().unwrap().clone())
}

async fn patch_profile(State(stub): State<Stub>, Json(body): Json<Value>) -> Json<Value> {
    stub.patches.lock().unwrap().push(body.clone());
    let mut record = stub.battery_profile.lock().unwrap();
    if let (Some(record), Some(body)) = (record.as_object_mut(), body.as_object()) {
        for (name, value) in body {
            record.insert(name.clone(), value.clone());
        }
    }
    Json(record.clone())
}

async fn get_parameters() -> Json<Value> {
    Json(solarcfg_engine::transport::memory::default_charging_parameters())
}

async fn rejected() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "voltage out of range"})),
    )
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn not_json() -> &'static str {
    "<html>ok</html>"
}

fn app(stub: Stub) -> Router {
    Router::new()
        .route(
            "/api/solar/battery-profile",
            get(get_profile).patch(patch_profile),
        )
        .route("/api/solar/charging-parameters", get(get_parameters))
        .route("/rejected", get(rejected).patch(rejected))
        .route("/unavailable", get(unavailable))
        .route("/not-json", get(not_json))
        .with_state(stub)
}

async fn serve(stub: Stub) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(stub)).await.unwrap();
    });
    format!("http://{}", addr)
}

fn stub() -> Stub {
    Stub {
        battery_profile: Arc::new(Mutex::new(
            json!({"batteryType": "sealed", "batteryCapacity": 100}),
        )),
        patches: Arc::default(),
    }
}

fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(base_url, Duration::from_secs(5)).unwrap()
}

fn change_set(changes: Value) -> ChangeSet {
    let Value::Object(changes) = changes else {
        panic!("changes must be an object");
    };
    ChangeSet {
        resource: "battery-profile".to_string(),
        changes,
        withheld: Vec::new(),
    }
}

#[tokio::test]
async fn test_fetch_returns_record() {
    let base = serve(stub()).await;

    let record = transport(&base)
        .fetch("/api/solar/battery-profile")
        .await
        .unwrap();

    assert_eq!(record, json!({"batteryType": "sealed", "batteryCapacity": 100}));
}

#[tokio::test]
async fn test_submit_sends_only_the_change_set() {
    let stub = stub();
    let base = serve(stub.clone()).await;

    let record = transport(&base)
        .submit(
            "/api/solar/battery-profile",
            &change_set(json!({"batteryCapacity": 200})),
        )
        .await
        .unwrap();

    assert_eq!(record["batteryCapacity"], json!(200));
    assert_eq!(*stub.patches.lock().unwrap(), [json!({"batteryCapacity": 200})]);
}

#[tokio::test]
async fn test_error_body_becomes_server_message() {
    let base = serve(stub()).await;

    let err = transport(&base)
        .submit("/rejected", &change_set(json!({"boostVoltage": 20.0})))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.server_message(), Some("voltage out of range"));
    assert_eq!(err.detail(), "voltage out of range");
}

#[tokio::test]
async fn test_status_line_without_body() {
    let base = serve(stub()).await;

    let err = transport(&base).fetch("/unavailable").await.unwrap_err();

    assert_eq!(
        err,
        TransportError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            server_message: None,
        }
    );
    assert_eq!(err.detail(), "503 Service Unavailable");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let base = serve(stub()).await;

    let err = transport(&base).fetch("/api/solar/nothing").await.unwrap_err();

    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_non_json_success_is_invalid_body() {
    let base = serve(stub()).await;

    let err = transport(&base).fetch("/not-json").await.unwrap_err();

    assert!(matches!(err, TransportError::InvalidBody { .. }));
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = transport(&format!("http://{}", addr))
        .fetch("/api/solar/battery-profile")
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_screen_round_trip_over_http() {
    let stub = stub();
    let base = serve(stub.clone()).await;
    let screen = ConfigScreen::new(
        Arc::new(transport(&base)),
        &solarcfg_engine::ClientConfig {
            base_url: base.clone(),
            ..Default::default()
        },
    );

    screen.mount().await.unwrap();
    screen
        .set_field(ResourceId::BatteryProfile, "batteryType", json!("userDefined"))
        .unwrap();
    let outcome = screen.save(ResourceId::BatteryProfile).await.unwrap();

    assert!(matches!(
        outcome,
        SaveOutcome::Saved { ref refreshed, .. } if refreshed == &[ResourceId::ChargingParameters]
    ));
    assert_eq!(
        *stub.patches.lock().unwrap(),
        [json!({"batteryType": "userDefined"})]
    );
    let gate = screen
        .view()
        .resource(ResourceId::ChargingParameters)
        .and_then(|r| r.gate.clone())
        .unwrap();
    assert!(gate.is_open());
}

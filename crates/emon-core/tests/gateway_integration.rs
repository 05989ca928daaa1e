//! End-to-end tests for the HTTP gateway against an in-process stub server.
//!
//! The stub speaks just enough of the monitoring API to exercise request
//! signing, error mapping and the view loaders over a real socket.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use emon_core::views::{assignable_users, load_admin_overview, load_house_view, load_sensor_view};
use emon_core::{
    AlertBoard, ApiGateway, Error, MemoryTokenStore, SensorMonitor, SessionManager, ViewState,
};
use emon_types::{AlertFilter, AlertFrequency, AlertStatus, NewHouse, UserSettings};

const TOKEN: &str = "tok-alice";

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: Option<String>,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Recorded>>>);

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    let entry = Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    recorder.0.lock().unwrap().push(entry);
    next.run(request).await
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Token {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid token."})),
    )
        .into_response()
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["username"] == "alice" && body["password"] == "secret" {
        Json(json!({"token": TOKEN})).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Unable to log in with provided credentials."]})),
        )
            .into_response()
    }
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "is_staff": true,
        "date_joined": "2024-01-01T10:00:00Z",
        "settings": {"id": 7, "live_refresh_interval": 5, "email_alerts": true, "alert_frequency": "daily"}
    }))
    .into_response()
}

async fn save_settings(Path(id): Path<i64>, Json(mut body): Json<Value>) -> Response {
    body["id"] = json!(id);
    // The server normalises the digest cadence.
    body["alert_frequency"] = json!("hourly");
    Json(body).into_response()
}

async fn house(Path(id): Path<i64>) -> Response {
    if id != 1 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response();
    }
    Json(json!({
        "id": 1, "name": "Home", "address": "Main 1", "price_per_kwh": "0.80",
        "sensors": [{"id": 3, "name": "Kitchen", "is_online": true}]
    }))
    .into_response()
}

async fn statistics(Path(_id): Path<i64>) -> Json<Value> {
    let cmp = json!({"current": 12.5, "previous": 10.0, "change_percent": 25.0});
    Json(json!({
        "day_comparison": cmp, "week_comparison": cmp, "month_comparison": cmp,
        "prediction": {"predicted_kwh": 300.0, "predicted_cost": 240.0, "daily_average": 10.0},
        "sensor_rankings": [{"sensor_id": 3, "sensor_name": "Kitchen", "location": null, "kwh": 4.2, "cost": 3.36}]
    }))
}

async fn sensor(Path(id): Path<i64>) -> Response {
    match id {
        3 => Json(json!({
            "id": 3, "name": "Kitchen", "house": {"id": 1, "name": "Home", "price_per_kwh": "0.80"},
            "is_online": true, "power_threshold": 2000.0
        }))
        .into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn history(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!([
        {"timestamp": "2024-05-01T12:00:00", "power": 100.0, "voltage": 230.0, "current": 0.43},
        {"timestamp": "2024-05-01T12:00:05", "power": 110.0, "voltage": 231.0, "current": 0.47}
    ]))
}

async fn live(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({
        "power": 230.5, "voltage": 231.0, "current": 1.0,
        "is_online": true, "timestamp": "2024-05-01T12:00:05Z"
    }))
}

async fn alerts(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let all = [
        json!({"id": 1, "severity": "critical", "alert_type": "power_high", "message": "Power above 2000 W",
               "value": 2400.0, "threshold": 2000.0, "house_name": "Home", "sensor_name": "Kitchen",
               "is_read": false, "is_resolved": false, "created_at": "2024-05-01T12:00:00Z"}),
        json!({"id": 2, "severity": "info", "alert_type": "sensor_offline", "message": "Sensor offline",
               "value": null, "threshold": null, "house_name": "Home", "sensor_name": null,
               "is_read": true, "is_resolved": false, "created_at": "2024-05-01T11:00:00Z"}),
    ];
    let list: Vec<Value> = match params.get("status").map(String::as_str) {
        Some("unread") => all.into_iter().filter(|a| a["is_read"] == false).collect(),
        _ => all.into_iter().collect(),
    };
    Json(Value::Array(list)).into_response()
}

async fn mark_read(Path(_id): Path<i64>) -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn create_house(Json(body): Json<Value>) -> Response {
    if body["name"].as_str().unwrap_or_default().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": ["This field is required."]})),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 9, "name": body["name"], "address": body["address"],
            "user": {"id": body["user"], "username": "bob"},
            "sensor_count": 0, "price_per_kwh": "0.80"
        })),
    )
        .into_response()
}

async fn admin_houses() -> Json<Value> {
    Json(json!([{"id": 1, "name": "Home", "user": {"id": 1, "username": "alice"}, "sensor_count": 2}]))
}

async fn admin_sensors() -> Json<Value> {
    Json(json!([
        {"id": 3, "name": "Kitchen", "house": 1, "is_online": true},
        {"id": 4, "name": "Garage", "house": 1, "is_online": false}
    ]))
}

async fn users() -> Json<Value> {
    Json(json!([
        {"id": 1, "username": "alice", "email": "alice@example.com"},
        {"id": 5, "username": "bob", "email": "bob@example.com"}
    ]))
}

struct Stub {
    addr: SocketAddr,
    recorder: Recorder,
}

impl Stub {
    async fn start() -> Self {
        let recorder = Recorder::default();
        let api = Router::new()
            .route("/user/me/", get(me))
            .route("/user/settings/{id}/", put(save_settings))
            .route("/user/houses/{id}/", get(house))
            .route("/user/houses/{id}/statistics/", get(statistics))
            .route("/user/sensors/{id}/", get(sensor))
            .route("/user/sensor/{id}/data/", get(history))
            .route("/user/sensor/{id}/live/", get(live))
            .route("/user/alerts/", get(alerts))
            .route("/user/alerts/{id}/mark_read/", post(mark_read))
            .route("/admin/houses/", get(admin_houses).post(create_house))
            .route("/admin/sensors/", get(admin_sensors))
            .route("/admin/users/", get(users));
        let app = Router::new()
            .route("/api-token-auth/", post(token))
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(recorder.clone(), record));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, recorder }
    }

    fn gateway(&self) -> ApiGateway {
        ApiGateway::new(
            &format!("http://{}/api", self.addr),
            &format!("http://{}/api-token-auth/", self.addr),
        )
        .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.recorder.0.lock().unwrap().clone()
    }

    fn last(&self, path: &str) -> Recorded {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.path == path)
            .unwrap_or_else(|| panic!("no request to {path}"))
    }
}

#[tokio::test]
async fn test_token_request_is_never_signed() {
    let stub = Stub::start().await;
    let gateway = stub.gateway().with_token("leftover");

    let token = gateway.obtain_token("alice", "secret").await.unwrap();
    assert_eq!(token, TOKEN);

    let request = stub.last("/api-token-auth/");
    assert_eq!(request.method, "POST");
    assert_eq!(request.authorization, None);
}

#[tokio::test]
async fn test_bad_credentials_map_to_validation() {
    let stub = Stub::start().await;
    let err = stub.gateway().obtain_token("alice", "nope").await.unwrap_err();
    assert!(matches!(err, Error::Validation { status: 400, .. }));
    assert_eq!(
        err.user_message(),
        "Unable to log in with provided credentials."
    );
}

#[tokio::test]
async fn test_resource_requests_carry_token() {
    let stub = Stub::start().await;
    let profile = stub.gateway().with_token(TOKEN).current_user().await.unwrap();
    assert_eq!(profile.username, "alice");
    assert_eq!(
        stub.last("/api/user/me/").authorization.as_deref(),
        Some("Token tok-alice")
    );

    let err = stub.gateway().current_user().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert_eq!(stub.last("/api/user/me/").authorization, None);
}

#[tokio::test]
async fn test_session_login_against_server() {
    let stub = Stub::start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionManager::new(Arc::new(stub.gateway()), store.clone());
    session.initialize();

    assert!(!session.login("alice", "wrong").await);
    assert!(!session.is_authenticated());

    assert!(session.login("alice", "secret").await);
    let state = session.wait_settled().await;
    assert!(state.is_admin());
    assert_eq!(state.settings.as_ref().map(|s| s.id), Some(7));

    let saved = session
        .save_settings(&UserSettings {
            id: 7,
            live_refresh_interval_secs: 10,
            email_alerts_enabled: false,
            alert_frequency: AlertFrequency::Daily,
        })
        .await
        .unwrap();
    assert_eq!(saved.alert_frequency, AlertFrequency::Hourly);
    let state = session.snapshot();
    assert_eq!(state.settings.as_ref(), Some(&saved));
    assert_eq!(
        state.user.as_ref().and_then(|u| u.settings.as_ref()),
        Some(&saved)
    );
    assert_eq!(stub.last("/api/user/settings/7/").method, "PUT");
}

#[tokio::test]
async fn test_restored_token_rejected_by_server() {
    let stub = Stub::start().await;
    let store = Arc::new(MemoryTokenStore::with_token("revoked"));
    let session = SessionManager::new(Arc::new(stub.gateway()), store.clone());

    session.initialize();
    assert!(session.snapshot().auth_loading);
    let state = session.wait_settled().await;
    assert!(!state.is_authenticated());
    assert!(!state.auth_loading);
    assert_eq!(emon_core::TokenStore::load(store.as_ref()).unwrap(), None);
}

#[tokio::test]
async fn test_house_view_joins_both_fetches() {
    let stub = Stub::start().await;
    let api = stub.gateway().with_token(TOKEN);

    let view = load_house_view(&api, 1).await;
    let view = view.ready().expect("house view should load");
    assert_eq!(view.house.sensors.len(), 1);
    assert!((view.house.price_per_kwh - 0.80).abs() < 1e-9);
    assert_eq!(view.statistics.sensor_rankings[0].sensor_name, "Kitchen");

    match load_house_view(&api, 2).await {
        ViewState::Failed(message) => assert!(message.contains("Not found")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sensor_view_and_server_errors() {
    let stub = Stub::start().await;
    let api = stub.gateway().with_token(TOKEN);

    let view = load_sensor_view(&api, 3).await;
    let view = view.ready().expect("sensor view should load");
    assert_eq!(view.sensor.house.as_ref().map(|h| h.id()), Some(1));
    assert_eq!(view.history.len(), 2);
    assert_eq!(view.history[0].timestamp.offset(), time::UtcOffset::UTC);

    let err = api.sensor(99).await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 500, .. }));
    assert!(matches!(
        load_sensor_view(&api, 99).await,
        ViewState::Failed(_)
    ));
}

#[tokio::test]
async fn test_alert_filter_refetches_without_residue() {
    let stub = Stub::start().await;
    let mut board = AlertBoard::new(stub.gateway().with_token(TOKEN));

    let unread = AlertFilter::all().with_status(Some(AlertStatus::Unread));
    let state = board.set_filter(unread).await;
    assert_eq!(state.ready().map(Vec::len), Some(1));
    assert_eq!(
        stub.last("/api/user/alerts/").query.as_deref(),
        Some("status=unread")
    );

    let state = board.set_filter(AlertFilter::all()).await;
    assert_eq!(state.ready().map(Vec::len), Some(2));
    assert_eq!(stub.last("/api/user/alerts/").query, None);

    // Same filter again still goes to the server.
    board.set_filter(AlertFilter::all()).await;
    let fetches = stub
        .requests()
        .iter()
        .filter(|r| r.path == "/api/user/alerts/")
        .count();
    assert_eq!(fetches, 3);
}

#[tokio::test]
async fn test_mark_read_patches_only_that_alert() {
    let stub = Stub::start().await;
    let mut board = AlertBoard::new(stub.gateway().with_token(TOKEN));
    board.refresh().await;
    assert_eq!(board.unread_count(), 1);

    board.mark_read(1).await.unwrap();
    let alerts = board.alerts().ready().unwrap();
    assert!(alerts.iter().all(|a| a.is_read));
    assert!(alerts.iter().all(|a| !a.is_resolved));
    assert_eq!(board.unread_count(), 0);
    assert_eq!(stub.last("/api/user/alerts/1/mark_read/").method, "POST");
}

#[tokio::test]
async fn test_admin_forms_and_listings() {
    let stub = Stub::start().await;
    let api = stub.gateway().with_token(TOKEN);

    let users = assignable_users(&api).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(stub.last("/api/admin/users/").method, "GET");

    let err = api.create_house(&NewHouse::new(5, "")).await.unwrap_err();
    assert_eq!(err.user_message(), "name: This field is required.");

    let created = api
        .create_house(&NewHouse::new(5, "Cottage"))
        .await
        .unwrap();
    assert_eq!(created.user.map(|u| u.username), Some("bob".to_string()));

    let overview = load_admin_overview(&api).await;
    let overview = overview.ready().expect("overview should load");
    assert_eq!(overview.houses.len(), 1);
    assert_eq!(overview.online_sensors(), 1);
    assert_eq!(overview.offline_sensors(), 1);
}

#[tokio::test]
async fn test_sensor_monitor_publishes_readings() {
    let stub = Stub::start().await;
    let mut monitor = SensorMonitor::new(stub.gateway().with_token(TOKEN), 3);
    let mut updates = monitor.subscribe();

    monitor.apply_settings(None);
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("first tick fires immediately")
        .unwrap();
    let reading = monitor.latest().unwrap();
    assert_eq!(reading.power, Some(230.5));
    assert!(reading.is_online);
    monitor.stop();

    assert_eq!(stub.last("/api/user/sensor/3/live/").method, "GET");
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = ApiGateway::new(
        &format!("http://{addr}/api"),
        &format!("http://{addr}/api-token-auth/"),
    )
    .unwrap();
    let err = gateway.houses().await.unwrap_err();
    assert!(matches!(err, Error::Network { .. }));
    assert!(err.is_transient());
}

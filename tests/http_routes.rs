use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sven_control::actuator::config::ServerConfig;
use sven_control::actuator::{
    Actuator, ActuatorController, ActuatorError, Command, CommandValidator, Motion,
};
use sven_control::comms::local_api::{create_router, AppState};
use sven_control::protocol::{SvenPosition, SvenState};
use tower::ServiceExt;

fn test_router() -> Router {
    let state = Arc::new(AppState::new(&ServerConfig::default()));
    create_router(state)
}

/// Driver that only honours absolute moves and counts what reaches it.
struct AbsoluteOnly {
    height_mm: u32,
    executed: Arc<AtomicUsize>,
}

impl Actuator for AbsoluteOnly {
    fn state(&self) -> SvenState {
        SvenState {
            height_mm: self.height_mm,
            position: SvenPosition::Custom,
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Motion, ActuatorError> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        match *command {
            Command::Absolute { height_mm } => {
                let from_mm = self.height_mm;
                self.height_mm = height_mm;
                Ok(Motion {
                    from_mm,
                    to_mm: height_mm,
                    duration: Duration::ZERO,
                })
            }
            _ => Err(ActuatorError::UnknownPreset(0)),
        }
    }
}

async fn post_command(app: &Router, body: &str) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/sven/command")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, headers, json)
}

async fn get_state(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sven/state")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_duration_command_success() {
    let app = test_router();

    let (status, headers, json) =
        post_command(&app, r#"{"command":"UpDuration","value":5000}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], json!(true));
    assert_eq!(json["message"], json!("Sven moving Up for 5000ms"));
    assert_eq!(json["data"]["height_mm"], json!(812));
    assert!(json["timestamp"].as_str().is_some());
    assert!(json.get("error").is_none());
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_legacy_body_accepted() {
    let app = test_router();

    let (status, _, json) = post_command(&app, r#"{"direction":"Up","duration":1000}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], json!("Sven moving Up for 1000ms"));
}

#[tokio::test]
async fn test_position_command_updates_state() {
    let app = test_router();

    let (status, _, json) = post_command(&app, r#"{"command":"Position","value":4}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], json!("Sven moving to Standing"));

    let state = get_state(&app).await;
    assert_eq!(state, json!({"height_mm": 1100, "position": "Standing"}));
}

#[tokio::test]
async fn test_relative_and_absolute_commands() {
    let app = test_router();

    let (status, _, json) = post_command(&app, r#"{"command":"AbsoluteHeight","value":1000}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], json!("Sven moving to 1000mm"));

    let (status, _, json) = post_command(&app, r#"{"command":"DownRelative","value":5}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], json!("Sven moving Down 5cm"));

    let state = get_state(&app).await;
    assert_eq!(state, json!({"height_mm": 950, "position": "Custom"}));
}

#[tokio::test]
async fn test_out_of_range_rejected() {
    let app = test_router();

    let (status, headers, json) =
        post_command(&app, r#"{"command":"AbsoluteHeight","value":5000}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], json!(false));
    assert!(json["error"].as_str().unwrap().contains("outside travel range"));
    assert_eq!(headers["access-control-allow-origin"], "*");

    let state = get_state(&app).await;
    assert_eq!(state["height_mm"], json!(622));
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = test_router();

    let (status, _, json) = post_command(&app, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], json!(false));
    assert!(json["error"].as_str().unwrap().starts_with("invalid request body"));

    let (status, _, _) = post_command(&app, r#"{"command":"Sideways","value":1}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_preset_rejected() {
    let app = test_router();

    let (status, _, json) = post_command(&app, r#"{"command":"Position","value":7}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], json!("unknown position preset 7"));
}

#[tokio::test]
async fn test_preflight_headers() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/sven/command")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");

    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(body_bytes.is_empty());
}

#[tokio::test]
async fn test_command_route_get_answers() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sven/command")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(json["message"], json!("API route is working"));
}

#[tokio::test]
async fn test_initial_state() {
    let app = test_router();
    let state = get_state(&app).await;
    assert_eq!(state, json!({"height_mm": 622, "position": "Bottom"}));
}

#[tokio::test]
async fn test_custom_actuator_behind_router() {
    let executed = Arc::new(AtomicUsize::new(0));
    let driver = AbsoluteOnly {
        height_mm: 700,
        executed: executed.clone(),
    };
    let controller = ActuatorController::new(Box::new(driver), CommandValidator::default(), false);
    let app = create_router(Arc::new(AppState::with_controller(controller)));

    let state = get_state(&app).await;
    assert_eq!(state, json!({"height_mm": 700, "position": "Custom"}));

    let (status, _, json) = post_command(&app, r#"{"command":"AbsoluteHeight","value":1000}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["height_mm"], json!(1000));

    // driver errors surface as a 400 failure body
    let (status, _, json) = post_command(&app, r#"{"command":"UpDuration","value":500}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], json!(false));

    // validation runs before the driver is touched
    let (status, _, _) = post_command(&app, r#"{"command":"AbsoluteHeight","value":5}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(executed.load(Ordering::SeqCst), 2);
    assert_eq!(get_state(&app).await["height_mm"], json!(1000));
}

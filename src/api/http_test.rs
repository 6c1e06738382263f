use std::collections::HashMap;
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use serde_json::json;

use super::*;

// =========================================================================
// Mock backend
// =========================================================================

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn api(base_url: &str) -> HttpApi {
    HttpApi::new(base_url, Timeouts::default()).unwrap()
}

fn quick_json() -> Value {
    json!({
        "identified_risks": ["Theft"],
        "unique_solutions": ["CCTV"],
        "risk_summary": "Analysis identified 1 risks with 1 possible solutions."
    })
}

// =========================================================================
// Session flow
// =========================================================================

#[tokio::test]
async fn start_session_parses_greeting() {
    let app = Router::new().route(
        "/api/start_session",
        post(|| async { Json(json!({ "session_id": "abc", "state": "q1", "message": "Hi" })) }),
    );
    let base = spawn_backend(app).await;

    let resp = api(&base).start_session().await.unwrap();
    assert_eq!(resp.session_id, "abc");
    assert_eq!(resp.state, "q1");
    assert_eq!(resp.message, "Hi");
}

#[tokio::test]
async fn send_message_posts_session_and_text() {
    let app = Router::new().route(
        "/api/message",
        post(|Json(body): Json<Value>| async move {
            let echoed = format!("{}:{}", body["session_id"].as_str().unwrap_or(""), body["message"].as_str().unwrap_or(""));
            Json(json!({ "state": "report", "message": echoed }))
        }),
    );
    let base = spawn_backend(app).await;

    let resp = api(&base).send_message("abc", "Y").await.unwrap();
    assert_eq!(resp.message, "abc:Y");
    assert_eq!(resp.state, "report");
    assert!(!resp.error);
}

#[tokio::test]
async fn get_report_passes_session_id_query() {
    let app = Router::new().route(
        "/api/get_report",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            if params.get("session_id").map(String::as_str) == Some("abc") {
                Json(json!({
                    "ready": true,
                    "quick_report": quick_json(),
                    "detailed_report": { "identified_risks": [ { "risk_type": "Theft" } ] }
                }))
            } else {
                Json(json!({ "ready": false }))
            }
        }),
    );
    let base = spawn_backend(app).await;
    let client = api(&base);

    assert!(matches!(client.get_report("abc").await.unwrap(), ReportStatus::Ready { .. }));
    assert_eq!(client.get_report("other").await.unwrap(), ReportStatus::Pending);
}

#[tokio::test]
async fn get_report_incomplete_ready_is_malformed() {
    let app = Router::new().route(
        "/api/get_report",
        get(|| async { Json(json!({ "ready": true, "quick_report": quick_json() })) }),
    );
    let base = spawn_backend(app).await;

    let err = api(&base).get_report("abc").await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn download_report_returns_bytes_for_kind() {
    let app = Router::new().route(
        "/api/download_report",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            let kind = params.get("type").cloned().unwrap_or_default();
            format!("%PDF-{kind}").into_bytes()
        }),
    );
    let base = spawn_backend(app).await;

    let bytes = api(&base).download_report("abc", ReportKind::Detailed).await.unwrap();
    assert_eq!(bytes, b"%PDF-detailed");
}

// =========================================================================
// Failure mapping
// =========================================================================

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let app = Router::new().route(
        "/api/message",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "error": "Missing session_id or message" }))) }),
    );
    let base = spawn_backend(app).await;

    let err = api(&base).send_message("", "").await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Missing session_id"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let app = Router::new().route("/api/start_session", post(|| async { "<html>oops</html>" }));
    let base = spawn_backend(app).await;

    let err = api(&base).start_session().await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let app = Router::new().route(
        "/api/start_session",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({ "session_id": "late", "state": "q1", "message": "Hi" }))
        }),
    );
    let base = spawn_backend(app).await;
    let timeouts = Timeouts { request: Duration::from_millis(50), connect: Duration::from_secs(1) };

    let err = HttpApi::new(base, timeouts).unwrap().start_session().await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = api(&format!("http://{addr}/api")).start_session().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

// =========================================================================
// Survey flow
// =========================================================================

#[tokio::test]
async fn survey_endpoints_round_trip() {
    let app = Router::new()
        .route(
            "/api/user",
            post(|Json(body): Json<Value>| async move {
                let ok = body["name"] == "Ann" && body["store_address"] == "1 High St" && body["post_code"] == "AB1 2CD";
                Json(json!({ "success": ok, "user_id": 42 }))
            }),
        )
        .route("/api/survey/question", get(|| async { Json(json!({ "question": "Do you have CCTV?" })) }))
        .route(
            "/api/survey",
            post(|Json(body): Json<Value>| async move {
                if body["user_id"] == "42" && body["answer"] == "Y" { StatusCode::OK } else { StatusCode::BAD_REQUEST }
            }),
        )
        .route(
            "/api/report/quick",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({ "report_url": format!("/files/quick-{}.pdf", params["user_id"]) }))
            }),
        );
    let base = spawn_backend(app).await;
    let client = api(&base);

    let profile = UserProfile { name: "Ann".into(), store_address: "1 High St".into(), post_code: "AB1 2CD".into() };
    let created = client.create_user(&profile).await.unwrap();
    assert!(created.success);
    assert_eq!(created.user_id.as_deref(), Some("42"));

    assert_eq!(client.survey_question().await.unwrap().as_deref(), Some("Do you have CCTV?"));
    client.submit_survey_answer("42", "Do you have CCTV?", "Y").await.unwrap();
    assert!(client.submit_survey_answer("42", "Do you have CCTV?", "maybe").await.is_err());
    assert_eq!(client.report_link(ReportKind::Quick, "42").await.unwrap(), "/files/quick-42.pdf");
}

#[tokio::test]
async fn blank_survey_question_means_complete() {
    let app = Router::new().route("/api/survey/question", get(|| async { Json(json!({ "question": "" })) }));
    let base = spawn_backend(app).await;

    assert_eq!(api(&base).survey_question().await.unwrap(), None);
}

#[test]
fn base_url_trailing_slash_trimmed() {
    let client = HttpApi::new("http://127.0.0.1:5000/api/", Timeouts::default()).unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:5000/api");
    assert_eq!(client.url("/message"), "http://127.0.0.1:5000/api/message");
}

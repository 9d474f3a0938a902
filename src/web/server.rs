use super::api::{audit_logs, health_check, ingest, test_logs, AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Build the service router.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/ingest", post(ingest))
        .route("/test-logs", get(test_logs))
        .route("/audit-logs", get(audit_logs))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `listener` until the shutdown flag flips to true.
///
/// In-flight requests are drained before this returns.
pub async fn run_server(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "HTTP server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&v| v).await;
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::Generator;
    use crate::sink::MemorySink;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Harness {
        received: Arc<MemorySink>,
        app_log: Arc<MemorySink>,
        router: Router,
    }

    fn harness(max_body_bytes: usize) -> Harness {
        let received = Arc::new(MemorySink::new());
        let app_log = Arc::new(MemorySink::new());
        let generator = Arc::new(Generator::new(app_log.clone(), GeneratorConfig::default()));
        let state = AppState {
            received: received.clone(),
            generator,
        };
        Harness {
            received,
            app_log,
            router: build_router(state, max_body_bytes),
        }
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_ingest(body: &str, content_type: &str) -> Request<Body> {
        Request::post("/ingest")
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let h = harness(1024);
        let (status, json) = call(h.router, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"status": "ok"}));
        assert!(h.received.lines().is_empty());
        assert!(h.app_log.lines().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_array() {
        let h = harness(1024);
        let (status, json) = call(
            h.router,
            post_ingest(r#"[{"log":"a"},{"log":"b"}]"#, "application/json"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["records_ingested"], 2);
        assert_eq!(h.received.lines(), vec![r#"{"log":"a"}"#, r#"{"log":"b"}"#]);
    }

    #[tokio::test]
    async fn test_ingest_malformed_is_client_error() {
        let h = harness(1024);
        let (status, json) = call(h.router, post_ingest("{nope", "application/json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["status"], "error");
        assert!(json["detail"].as_str().unwrap().contains("not valid JSON"));
        assert!(h.received.lines().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_sink_failure_is_server_error() {
        let h = harness(1024);
        h.received.set_failing(true);
        let (status, json) = call(h.router, post_ingest(r#"{"log":"a"}"#, "application/json")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn test_ingest_body_limit() {
        let h = harness(16);
        let body = format!(r#"[{{"log":"{}"}}]"#, "x".repeat(64));
        let (status, json) = call(h.router, post_ingest(&body, "application/json")).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["status"], "error");
        assert!(h.received.lines().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_ndjson() {
        let h = harness(1024);
        let (status, json) = call(
            h.router,
            post_ingest("{\"n\":1}\n{\"n\":2}\n", "application/x-ndjson"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["records_ingested"], 2);
    }

    #[tokio::test]
    async fn test_test_logs_default_burst() {
        let h = harness(1024);
        let (status, json) = call(
            h.router,
            Request::get("/test-logs").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["logs_generated"], 4);
        assert!(json["message"].is_string());
        assert_eq!(h.app_log.lines().len(), 4);
    }

    #[tokio::test]
    async fn test_audit_logs() {
        let h = harness(1024);
        let (status, json) = call(
            h.router,
            Request::get("/audit-logs").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["audit_logs"], 2);
        assert_eq!(json["non_audit_logs"], 2);
        assert_eq!(h.app_log.lines().len(), 4);
    }
}

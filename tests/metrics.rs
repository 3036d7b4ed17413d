// tests/metrics.rs
//
// The recorder is process-global, so this file holds a single test.

mod common;

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use common::*;
use wiki_trust_report::metrics::Metrics;
use wiki_trust_report::OrchestratorState;

#[tokio::test]
async fn metrics_endpoint_contains_report_series() {
    let m = Metrics::init().expect("install recorder");

    let fetcher = Arc::new(
        FakeFetcher::default()
            .route(
                "http://stats.test/top/Acme%20Corp",
                Ok(contributors_json(&["alice"])),
            )
            .route("http://wiki.test/user/alice", Ok(page_html("I was paid."))),
    );
    let session = orchestrator(fetcher, Arc::new(RecordingPresenter::default())).start("Acme Corp");
    let state = tokio::time::timeout(Duration::from_secs(5), session.settled())
        .await
        .expect("settles");
    assert_eq!(state, OrchestratorState::Settled);
    session.discard().await;

    let resp = m
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("report_tasks_spawned_total"), "{text}");
    assert!(text.contains(r#"kind="user_profile""#), "{text}");
    // history and talk pages are unrouted (404)
    assert!(text.contains("report_task_errors_total"), "{text}");
    assert!(text.contains("report_tasks_reaped_total"), "{text}");
    assert!(text.contains("report_task_ms"), "{text}");
}

use std::{collections::HashMap, time::Duration};

use alert_ingest::{AlertBackend, BackendConfig, FetchError, HttpBackend, ResolveError};
use axum::{
    Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, patch},
};
use incident_core::{AlertFilter, IncidentId};
use serde_json::{Value, json};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn backend(base_url: String) -> HttpBackend {
    HttpBackend::new(&BackendConfig {
        base_url,
        request_timeout: Duration::from_secs(2),
        ..BackendConfig::default()
    })
    .expect("backend")
}

fn id(raw: &str) -> IncidentId {
    IncidentId::new(raw).expect("id")
}

async fn filtered_alerts(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let all = vec![
        json!({
            "alert_uuid": "open-1",
            "temp_id": "T-1",
            "lat": 25.57,
            "lon": 91.88,
            "resolved": false
        }),
        json!({
            "alert_uuid": "done-1",
            "temp_id": "T-2",
            "resolved": true,
            "resolved_by": "kim"
        }),
    ];
    let wanted = |alert: &Value| {
        let resolved = alert["resolved"].as_bool().unwrap_or(false);
        if params.get("unresolved_only").map(String::as_str) == Some("true") {
            !resolved
        } else if params.get("resolved_only").map(String::as_str) == Some("true") {
            resolved
        } else {
            true
        }
    };
    Json(Value::Array(all.into_iter().filter(wanted).collect()))
}

#[tokio::test]
async fn filter_is_forwarded_as_query() {
    let base = serve(Router::new().route("/alerts/", get(filtered_alerts))).await;
    let backend = backend(base);

    let all = backend.list_alerts(AlertFilter::All).await.expect("all");
    assert_eq!(all.len(), 2);

    let open = backend
        .list_alerts(AlertFilter::UnresolvedOnly)
        .await
        .expect("open");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].incident_id.as_deref(), Some("open-1"));
    assert_eq!(open[0].lat, Some(25.57));

    let done = backend
        .list_alerts(AlertFilter::ResolvedOnly)
        .await
        .expect("done");
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].resolved_by.as_deref(), Some("kim"));
}

async fn subject_handler(
    Path(subject): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let unresolved_only = params.get("unresolved_only").map(String::as_str) == Some("true");
    let alerts = [
        json!({"alert_uuid": "s-1", "temp_id": "T-9", "resolved": false}),
        json!({"alert_uuid": "s-2", "temp_id": "T-9", "resolved": true}),
    ];
    Json(Value::Array(
        alerts
            .into_iter()
            .filter(|alert| alert["temp_id"] == subject.as_str())
            .filter(|alert| !unresolved_only || alert["resolved"] == false)
            .collect(),
    ))
}

#[tokio::test]
async fn subject_alerts_use_the_tourist_route() {
    let router = Router::new().route("/alerts/tourist/:temp_id", get(subject_handler));
    let backend = backend(serve(router).await);

    let all = backend.subject_alerts("T-9", false).await.expect("all");
    assert_eq!(all.len(), 2);

    let open = backend.subject_alerts("T-9", true).await.expect("open");
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].incident_id.as_deref(), Some("s-1"));
    assert_eq!(open[0].subject_id.as_deref(), Some("T-9"));

    let none = backend.subject_alerts("T-0", false).await.expect("none");
    assert!(none.is_empty());
}

#[tokio::test]
async fn server_error_is_a_transport_failure() {
    let router = Router::new().route(
        "/alerts/",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let backend = backend(serve(router).await);

    let err = backend.list_alerts(AlertFilter::All).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("HTTP 500"), "{err}");
}

#[tokio::test]
async fn non_list_body_is_a_parse_failure() {
    let router = Router::new().route(
        "/alerts/",
        get(|| async { Json(json!({"alerts": []})) }),
    );
    let backend = backend(serve(router).await);

    let err = backend.list_alerts(AlertFilter::All).await.unwrap_err();
    assert!(matches!(err, FetchError::Parse { .. }), "{err:?}");
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = backend(format!("http://{addr}"));
    let err = backend.list_alerts(AlertFilter::All).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert_eq!(err.status(), None);
}

async fn resolve_handler(
    Path(alert): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    match alert.as_str() {
        "locked" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "database is locked"})),
        ),
        "silent" => (StatusCode::NOT_FOUND, Json(Value::Null)),
        "busy" => (StatusCode::SERVICE_UNAVAILABLE, Json(Value::Null)),
        _ => (
            StatusCode::OK,
            Json(json!({
                "alert_uuid": alert,
                "resolved": true,
                "resolved_by": params.get("resolved_by"),
                "resolved_at": "2025-03-01T10:00:00Z",
                "blockchain_index": 7,
                "blockchain_hash": "ab12"
            })),
        ),
    }
}

#[tokio::test]
async fn resolve_returns_updated_record() {
    let router = Router::new().route("/alerts/:alert/resolve", patch(resolve_handler));
    let backend = backend(serve(router).await);

    let record = backend
        .resolve_alert(&id("a-42"), "officer bob")
        .await
        .expect("resolved");
    assert_eq!(record.incident_id.as_deref(), Some("a-42"));
    assert_eq!(record.resolved, Some(true));
    assert_eq!(record.resolved_by.as_deref(), Some("officer bob"));
    assert_eq!(record.ledger_index, Some(7));
}

#[tokio::test]
async fn resolve_rejection_carries_server_detail() {
    let router = Router::new().route("/alerts/:alert/resolve", patch(resolve_handler));
    let backend = backend(serve(router).await);

    let err = backend.resolve_alert(&id("locked"), "bob").await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::Rejected {
            status: 500,
            detail: "database is locked".into()
        }
    );

    let err = backend.resolve_alert(&id("silent"), "bob").await.unwrap_err();
    match err {
        ResolveError::Rejected { status, detail } => {
            assert_eq!(status, 404);
            assert!(detail.contains("HTTP 404"), "{detail}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn resolve_without_server_reason_is_a_transport_failure() {
    let router = Router::new().route("/alerts/:alert/resolve", patch(resolve_handler));
    let busy = backend(serve(router).await);

    let err = busy.resolve_alert(&id("busy"), "bob").await.unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert!(err.to_string().contains("HTTP 503"), "{err}");

    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let err = backend(format!("http://{addr}"))
        .resolve_alert(&id("a-1"), "bob")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn chain_verdicts() {
    let valid = Router::new().route(
        "/blockchain/validate",
        get(|| async { Json(json!({"valid": true})) }),
    );
    let verdict = backend(serve(valid).await)
        .chain_verdict()
        .await
        .expect("verdict");
    assert!(verdict.valid);
    assert_eq!(verdict.diagnostic, None);

    let broken = Router::new().route(
        "/blockchain/validate",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"detail": "Block 2 prev_hash mismatch"})),
            )
        }),
    );
    let verdict = backend(serve(broken).await)
        .chain_verdict()
        .await
        .expect("verdict");
    assert!(!verdict.valid);
    assert_eq!(verdict.diagnostic.as_deref(), Some("Block 2 prev_hash mismatch"));

    let down = Router::new().route(
        "/blockchain/validate",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let err = backend(serve(down).await).chain_verdict().await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    let unauthorized = Router::new().route(
        "/blockchain/validate",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Not authenticated"})),
            )
        }),
    );
    let err = backend(serve(unauthorized).await)
        .chain_verdict()
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "transport");
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn ledger_listing_and_missing_block() {
    let router = Router::new()
        .route(
            "/blockchain/list",
            get(|| async {
                Json(json!({"chain": [
                    {
                        "index": 0,
                        "timestamp": "t0",
                        "data": "genesis",
                        "prev_hash": "0",
                        "hash": "h0"
                    },
                    {
                        "index": 1,
                        "timestamp": "t1",
                        "data": {"alert_uuid": "a"},
                        "prev_hash": "h0",
                        "hash": "h1"
                    }
                ]}))
            }),
        )
        .route(
            "/blockchain/block/:index",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "Block not found"})),
                )
            }),
        );
    let backend = backend(serve(router).await);

    let blocks = backend.ledger().await.expect("ledger");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].previous_hash.as_deref(), Some("h0"));

    let err = backend.ledger_block(9).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::NotFound {
            detail: "Block not found".into()
        }
    );
}

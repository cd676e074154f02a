//! DrandClient against a local axum relay that serves canned beacon replies,
//! so these tests never leave the machine.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, MethodRouter};
use axum::{Json, Router};
use e2totp_beacon::{BeaconClient, BeaconError, DrandClient};
use serde_json::{json, Value};
use tokio::net::TcpListener;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Reply {
    Json(StatusCode, Value),
    /// Holds the request open well past any client timeout used here.
    Stall,
}

fn relay_route(reply: Reply) -> MethodRouter {
    get(move || async move {
        match reply {
            Reply::Json(status, body) => (status, Json(body)).into_response(),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK.into_response()
            }
        }
    })
}

/// Serve `routes` on an ephemeral local port; unknown paths get axum's 404.
async fn spawn_relay(routes: Vec<(&'static str, Reply)>) -> String {
    let app = routes
        .into_iter()
        .fold(Router::new(), |app, (path, reply)| {
            app.route(path, relay_route(reply))
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("relay server");
    });

    format!("http://{addr}")
}

/// Client that talks to the local relay directly, ignoring any proxy env vars.
fn local_client(base_url: &str) -> DrandClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    DrandClient::with_url(base_url).with_http_client(http)
}

fn beacon_json(round: u64, randomness_hex: &str) -> Value {
    json!({
        "round": round,
        "randomness": randomness_hex,
        "signature": "deadbeef",
        "previous_signature": "cafe",
    })
}

fn ok(body: Value) -> Reply {
    Reply::Json(StatusCode::OK, body)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_latest_decodes_record() {
    let base = spawn_relay(vec![(
        "/public/latest",
        ok(beacon_json(100, &"11".repeat(32))),
    )])
    .await;
    let client = local_client(&base);

    let record = client.fetch_latest().await.expect("latest");
    assert_eq!(record.round, 100);
    assert_eq!(record.randomness, [0x11; 32]);
    assert_eq!(record.signature, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(record.previous, vec![0xCA, 0xFE]);
}

#[tokio::test]
async fn fetch_round_uses_chain_hash_prefix() {
    let base = spawn_relay(vec![(
        "/abc123/public/99",
        ok(beacon_json(99, &"22".repeat(32))),
    )])
    .await;
    let http = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client");
    let client = DrandClient::with_chain(&base, "abc123").with_http_client(http);

    let record = client.fetch(Some(99)).await.expect("round 99");
    assert_eq!(record.round, 99);
    assert_eq!(record.randomness, [0x22; 32]);
}

#[tokio::test]
async fn missing_round_is_round_not_found() {
    let client = local_client(&spawn_relay(Vec::new()).await);
    assert_eq!(
        client.fetch_round(123_456_789).await,
        Err(BeaconError::RoundNotFound(123_456_789))
    );
}

#[tokio::test]
async fn too_early_round_is_round_not_found() {
    let base = spawn_relay(vec![(
        "/public/500",
        Reply::Json(StatusCode::from_u16(425).expect("425 Too Early"), json!({})),
    )])
    .await;
    let client = local_client(&base);
    assert_eq!(client.fetch_round(500).await, Err(BeaconError::RoundNotFound(500)));
}

#[tokio::test]
async fn server_error_is_unavailable() {
    let base = spawn_relay(vec![(
        "/public/latest",
        Reply::Json(StatusCode::SERVICE_UNAVAILABLE, json!({})),
    )])
    .await;
    let client = local_client(&base);
    assert!(matches!(
        client.fetch_latest().await,
        Err(BeaconError::Unavailable(_))
    ));
}

#[tokio::test]
async fn malformed_randomness_is_unavailable() {
    let base = spawn_relay(vec![
        ("/public/latest", ok(beacon_json(100, "not-hex"))),
        ("/public/7", ok(beacon_json(7, &"00".repeat(31)))),
    ])
    .await;
    let client = local_client(&base);

    assert!(matches!(
        client.fetch_latest().await,
        Err(BeaconError::Unavailable(_))
    ));
    assert!(matches!(
        client.fetch_round(7).await,
        Err(BeaconError::Unavailable(_))
    ));
}

#[tokio::test]
async fn stalled_relay_times_out_as_unavailable() {
    let base = spawn_relay(vec![("/public/latest", Reply::Stall)]).await;
    let client = local_client(&base).with_timeout(Duration::from_millis(100));

    match client.fetch_latest().await {
        Err(BeaconError::Unavailable(msg)) => assert!(msg.contains("timed out"), "{msg}"),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_body_is_unavailable() {
    let base = spawn_relay(vec![("/public/latest", ok(json!({ "round": "soon" })))]).await;
    let client = local_client(&base);
    assert!(matches!(
        client.fetch_latest().await,
        Err(BeaconError::Unavailable(_))
    ));
}

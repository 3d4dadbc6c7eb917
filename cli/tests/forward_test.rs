//! Forwarder integration tests against a real local HTTP endpoint.

mod helpers;

use axum::http::{Method, StatusCode};
use axum::routing::post;
use axum::Router;

use helpers::{event_with, spawn_capture_server, spawn_test_server, unreachable_url, FAIL_HEADER};
use volley_cli::api::{HeaderMultimap, USER_AGENT};
use volley_cli::relay::{ForwardError, Forwarder};

#[tokio::test]
async fn body_and_headers_arrive_unchanged() {
    let (server, captured) = spawn_capture_server().await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    // Odd spacing, key order, unicode and a trailing newline must all survive.
    let body = "{\"b\": 1,  \"a\":\"ünïcode\"}\n";
    let headers: HeaderMultimap = [
        ("Content-Type", "application/vnd.stripe+json"),
        ("Stripe-Signature", "t=1,v1=aaa"),
        ("X-Multi", "first"),
        ("X-Multi", "second"),
        ("User-Agent", "Stripe/1.0"),
    ]
    .into_iter()
    .collect();
    let event = event_with("evt_bytes", body.as_bytes(), headers);

    let outcome = forwarder.forward(&event).await.unwrap();
    assert_eq!(outcome.status, 200);

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    let req = &captured[0];

    assert_eq!(req.method, Method::POST);
    assert_eq!(req.body.as_ref(), body.as_bytes());
    assert_eq!(req.header_values("stripe-signature"), ["t=1,v1=aaa"]);
    assert_eq!(req.header_values("x-multi"), ["first", "second"]);

    // Originals win over defaults, without duplicates.
    assert_eq!(req.header_values("content-type"), ["application/vnd.stripe+json"]);
    assert_eq!(req.header_values("user-agent"), ["Stripe/1.0"]);

    assert_eq!(req.header_values("x-volley-event-id"), ["evt_bytes"]);
    assert_eq!(req.header_values("x-volley-source-id"), ["42"]);
    assert_eq!(req.header_values("x-volley-source-slug"), ["stripe"]);
}

#[tokio::test]
async fn defaults_fill_missing_headers() {
    let (server, captured) = spawn_capture_server().await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    let event = event_with("evt_bare", b"plain", HeaderMultimap::new());
    forwarder.forward(&event).await.unwrap();

    let captured = captured.lock().unwrap();
    let req = &captured[0];
    assert_eq!(req.header_values("content-type"), ["application/json"]);
    assert_eq!(req.header_values("user-agent"), [USER_AGENT]);
    assert_eq!(req.body.as_ref(), b"plain");
}

#[tokio::test]
async fn tracking_headers_replace_spoofed_values() {
    let (server, captured) = spawn_capture_server().await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    let headers: HeaderMultimap = [("X-Volley-Event-Id", "spoofed")].into_iter().collect();
    forwarder
        .forward(&event_with("evt_real", b"{}", headers))
        .await
        .unwrap();

    let captured = captured.lock().unwrap();
    assert_eq!(captured[0].header_values("x-volley-event-id"), ["evt_real"]);
}

#[tokio::test]
async fn server_error_is_a_failure() {
    let (server, captured) = spawn_capture_server().await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    let headers: HeaderMultimap = [(FAIL_HEADER, "1")].into_iter().collect();
    let err = forwarder
        .forward(&event_with("evt_500", b"{}", headers))
        .await
        .unwrap_err();

    assert!(matches!(err, ForwardError::Status(500)), "got {err:?}");
    // It was still delivered exactly once.
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn client_error_is_a_failure() {
    let router = Router::new().route("/webhook", post(|| async { StatusCode::UNAUTHORIZED }));
    let server = spawn_test_server(router).await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    let err = forwarder
        .forward(&event_with("evt_401", b"{}", HeaderMultimap::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ForwardError::Status(401)), "got {err:?}");
}

#[tokio::test]
async fn accepted_statuses_below_400_succeed() {
    let router = Router::new().route("/webhook", post(|| async { StatusCode::ACCEPTED }));
    let server = spawn_test_server(router).await;
    let forwarder = Forwarder::new(server.url_for("/webhook")).unwrap();

    let outcome = forwarder
        .forward(&event_with("evt_202", b"{}", HeaderMultimap::new()))
        .await
        .unwrap();
    assert_eq!(outcome.status, 202);
}

#[tokio::test]
async fn unreachable_target_is_a_transport_error() {
    let forwarder = Forwarder::new(unreachable_url().await).unwrap();

    let err = forwarder
        .forward(&event_with("evt_down", b"{}", HeaderMultimap::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ForwardError::Transport(_)), "got {err:?}");
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use ed25519_dalek::SigningKey;
use oracle_registry::{
    message, Caller, DataHash, Ed25519Verifier, EventId, Identity, ManualClock, RegistryConfig,
};
use oracle_registry_server::{
    app_state::AppState, config::ServerConfig, expiry, routes, services::RegistryService,
    websocket::WsState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const START: u64 = 1_700_000_000;

struct TestApp {
    router: Router,
    service: Arc<RegistryService>,
    ws_state: WsState,
    clock: ManualClock,
    admin: SigningKey,
}

fn key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn identity(key: &SigningKey) -> Identity {
    Identity::from_bytes(key.verifying_key().to_bytes())
}

fn approval(key: &SigningKey, message: &[u8]) -> Value {
    let caller = Caller::sign(key, message);
    json!({
        "signer": caller.signer.to_hex(),
        "signature": hex::encode(caller.signature),
    })
}

fn event_id(byte: u8) -> EventId {
    EventId::from_bytes([byte; 32])
}

fn evidence() -> DataHash {
    DataHash::from_bytes([0xee; 32])
}

fn test_app(required_consensus: u32) -> TestApp {
    let admin = key(1);
    let clock = ManualClock::new(START);
    let config = ServerConfig {
        port: 0,
        admin_public_key: identity(&admin),
        registry: RegistryConfig {
            required_consensus,
            round_ttl_secs: 3_600,
            ..Default::default()
        },
        expiry_sweep_seconds: 60,
        event_channel_capacity: 64,
        cors_allowed_origins: Vec::new(),
    };
    let state =
        AppState::from_config(&config, Box::new(Ed25519Verifier), Box::new(clock.clone())).unwrap();
    let service = state.registry_service.clone();
    let ws_state = state.ws_state.clone();
    let router = routes::app(state);
    TestApp {
        router,
        service,
        ws_state,
        clock,
        admin,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Sequence the next admin signature must commit to, as a client reads it.
    async fn nonce(&self) -> u64 {
        let (_, summary) = self.send(Method::GET, "/api/registry", None).await;
        summary["data"]["next_sequence"].as_u64().unwrap()
    }

    async fn register(&self, oracle: &SigningKey, name: &str) -> (StatusCode, Value) {
        let oracle = identity(oracle);
        let nonce = self.nonce().await;
        let body = json!({
            "oracle": oracle.to_hex(),
            "name": name,
            "approval": approval(&self.admin, &message::register_oracle(nonce, &oracle, name)),
        });
        self.send(Method::POST, "/api/oracles", Some(body)).await
    }

    async fn attest(&self, oracle: &SigningKey, event: EventId, outcome: u32) -> (StatusCode, Value) {
        let id = identity(oracle);
        let signed = Caller::sign(
            oracle,
            &message::submit_attestation(&id, &event, outcome, &evidence()),
        );
        let body = json!({
            "oracle": id.to_hex(),
            "outcome": outcome,
            "data_hash": evidence().to_hex(),
            "signature": hex::encode(signed.signature),
        });
        self.send(
            Method::POST,
            &format!("/api/events/{}/attestations", event),
            Some(body),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app(2);
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_and_reach_consensus() {
    let app = test_app(2);
    let (a, b, c) = (key(2), key(3), key(4));
    for (oracle, name) in [(&a, "alpha"), (&b, "beta"), (&c, "gamma")] {
        let (status, body) = app.register(oracle, name).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["type"], "OracleRegistered");
    }

    let (_, summary) = app.send(Method::GET, "/api/registry", None).await;
    assert_eq!(summary["data"]["oracle_count"], 3);
    assert_eq!(summary["data"]["effective_threshold"], 2);

    let e1 = event_id(0xe1);
    let (status, first) = app.attest(&a, e1, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["type"], "AttestationRecorded");

    let (_, pending) = app
        .send(Method::GET, &format!("/api/events/{}/consensus", e1), None)
        .await;
    assert_eq!(pending["data"]["reached"], false);

    let (status, second) = app.attest(&b, e1, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["type"], "ConsensusReached");
    assert_eq!(second["data"]["outcome"], 1);

    let (_, details) = app
        .send(Method::GET, &format!("/api/events/{}", e1), None)
        .await;
    assert_eq!(details["data"]["consensus_result"], 1);
    assert_eq!(details["data"]["attestations"].as_array().unwrap().len(), 2);

    let (status, late) = app.attest(&c, e1, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(late["success"], false);
}

#[tokio::test]
async fn test_error_statuses() {
    let app = test_app(2);
    let oracle = key(2);
    app.register(&oracle, "alpha").await;

    // Signed by a key that is not an admin.
    let stranger = key(9);
    let other = identity(&key(3));
    let body = json!({
        "oracle": other.to_hex(),
        "name": "beta",
        "approval": approval(&stranger, &message::register_oracle(app.nonce().await, &other, "beta")),
    });
    let (status, _) = app.send(Method::POST, "/api/oracles", Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.register(&oracle, "alpha").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.attest(&key(5), event_id(1), 1).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.attest(&oracle, event_id(1), 1).await;
    let (status, _) = app.attest(&oracle, event_id(1), 0).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::GET, &format!("/api/events/{}", event_id(0x77)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/oracles",
            Some(json!({
                "oracle": "abcd",
                "name": "short",
                "approval": { "signer": "00", "signature": "00" },
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Validation error"));

    let (status, _) = app.send(Method::GET, "/api/oracles/not-hex", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deregister_lowers_threshold() {
    let app = test_app(2);
    let (a, b) = (key(2), key(3));
    app.register(&a, "alpha").await;
    app.register(&b, "beta").await;

    let target = identity(&a);
    let nonce = app.nonce().await;
    let body = json!({ "approval": approval(&app.admin, &message::deregister_oracle(nonce, &target)) });
    let uri = format!("/api/oracles/{}/deregister", target);
    let (status, record) = app.send(Method::POST, &uri, Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["data"]["oracle_count"], 1);
    assert_eq!(record["data"]["effective_threshold"], 1);

    // Replaying the accepted approval fails; a fresh one reaches the record check.
    let (status, _) = app.send(Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let nonce = app.nonce().await;
    let body = json!({ "approval": approval(&app.admin, &message::deregister_oracle(nonce, &target)) });
    let (status, _) = app.send(Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, active) = app.send(Method::GET, "/api/oracles", None).await;
    assert_eq!(active["data"].as_array().unwrap().len(), 1);
    let (_, all) = app
        .send(Method::GET, "/api/oracles?include_inactive=true", None)
        .await;
    assert_eq!(all["data"].as_array().unwrap().len(), 2);

    let (status, record) = app
        .send(Method::GET, &format!("/api/oracles/{}", target), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["data"]["active"], false);
}

#[tokio::test]
async fn test_schedule_rejects_early_attestation() {
    let app = test_app(2);
    let oracle = key(2);
    app.register(&oracle, "alpha").await;

    let event = event_id(0x21);
    let resolution_time = START + 600;
    let body = json!({
        "resolution_time": resolution_time,
        "approval": approval(
            &app.admin,
            &message::schedule_event(app.nonce().await, &event, resolution_time)
        ),
    });
    let (status, _) = app
        .send(Method::POST, &format!("/api/events/{}/schedule", event), Some(body))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.attest(&oracle, event, 1).await;
    assert_eq!(status.as_u16(), 425);

    app.clock.advance(600);
    let (status, _) = app.attest(&oracle, event, 1).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expiry_sweep_and_audit_log() {
    let app = test_app(3);
    let oracles = [key(2), key(3), key(4)];
    for (i, oracle) in oracles.iter().enumerate() {
        app.register(oracle, &format!("oracle-{i}")).await;
    }
    let event = event_id(0x31);
    app.attest(&oracles[0], event, 1).await;

    assert_eq!(expiry::sweep_expired_rounds(&app.service).await, 0);
    app.clock.advance(3_600);
    assert_eq!(expiry::sweep_expired_rounds(&app.service).await, 1);

    let (status, _) = app.attest(&oracles[1], event, 1).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, audit) = app.send(Method::GET, "/api/audit?since=4", None).await;
    let records = audit["data"].as_array().unwrap();
    let kinds: Vec<&str> = records
        .iter()
        .map(|record| record["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["AttestationRecorded", "RoundExpired"]);
    assert_eq!(records[0]["sequence"], 4);
}

#[tokio::test]
async fn test_audit_log_is_paged() {
    let app = test_app(2);
    for seed in 2..=6 {
        app.register(&key(seed), &format!("oracle-{seed}")).await;
    }

    let (_, page) = app.send(Method::GET, "/api/audit?since=1&limit=2", None).await;
    let sequences: Vec<u64> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["sequence"].as_u64().unwrap())
        .collect();
    assert_eq!(sequences, vec![1, 2]);

    let (_, rest) = app.send(Method::GET, "/api/audit?since=3&limit=50000", None).await;
    assert_eq!(rest["data"].as_array().unwrap().len(), 3);

    let (status, _) = app.send(Method::GET, "/api/audit?limit=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_schedule_cannot_postpone_attested_round() {
    let app = test_app(2);
    let oracle = key(2);
    app.register(&oracle, "alpha").await;
    app.register(&key(3), "beta").await;
    let event = event_id(0x22);
    app.attest(&oracle, event, 1).await;

    let resolution_time = START + 600;
    let body = json!({
        "resolution_time": resolution_time,
        "approval": approval(
            &app.admin,
            &message::schedule_event(app.nonce().await, &event, resolution_time)
        ),
    });
    let (status, body) = app
        .send(Method::POST, &format!("/api/events/{}/schedule", event), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_emergency_override_endpoint() {
    let app = test_app(2);
    let second_admin = key(7);
    let second_id = identity(&second_admin);
    let body = json!({
        "admin": second_id.to_hex(),
        "approval": approval(&app.admin, &message::add_admin_signer(app.nonce().await, &second_id)),
    });
    let (status, _) = app.send(Method::POST, "/api/admins", Some(body)).await;
    assert_eq!(status, StatusCode::OK);

    let oracle = key(2);
    app.register(&oracle, "alpha").await;
    app.register(&key(3), "beta").await;
    let event = event_id(0x41);
    app.attest(&oracle, event, 0).await;

    let justification = DataHash::from_bytes([0x1f; 32]);
    let signed = message::emergency_override(app.nonce().await, &event, 1, &justification);
    let uri = format!("/api/events/{}/override", event);

    let (status, _) = app
        .send(
            Method::POST,
            &uri,
            Some(json!({
                "forced_outcome": 1,
                "justification_hash": justification.to_hex(),
                "approvals": [approval(&app.admin, &signed)],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = json!({
        "forced_outcome": 1,
        "justification_hash": justification.to_hex(),
        "approvals": [approval(&app.admin, &signed), approval(&second_admin, &signed)],
    });
    let (status, record) = app.send(Method::POST, &uri, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "{record}");
    assert_eq!(record["data"]["type"], "EmergencyOverride");

    let (_, details) = app.send(Method::GET, &format!("/api/events/{}", event), None).await;
    assert_eq!(details["data"]["consensus_result"], 1);
    assert!(details["data"]["manual_override"].is_object());

    // A second override inside the cooldown window.
    let other = event_id(0x42);
    app.attest(&oracle, other, 0).await;
    let signed = message::emergency_override(app.nonce().await, &other, 1, &justification);
    let body = json!({
        "forced_outcome": 1,
        "justification_hash": justification.to_hex(),
        "approvals": [approval(&app.admin, &signed), approval(&second_admin, &signed)],
    });
    let (status, _) = app
        .send(Method::POST, &format!("/api/events/{}/override", other), Some(body))
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_records_are_broadcast_to_subscribers() {
    let app = test_app(2);
    let mut rx = app.ws_state.subscribe();
    app.register(&key(2), "alpha").await;

    let record = rx.recv().await.unwrap();
    assert_eq!(record.event.name(), "OracleRegistered");
    assert_eq!(record.sequence, 1);
}

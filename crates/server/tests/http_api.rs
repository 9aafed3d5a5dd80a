//! HTTP handlers end to end, driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use runtime::{EngineHandle, InMemoryRoundRepository, ProofGateway, RoundService, RuntimeConfig};
use serde_json::{Value, json};
use tower::ServiceExt;
use word_core::{Identity, IdentityScheme, ProtocolConfig};
use word_server::auth::wallet::{sign_personal_message, signing_key_from_hex};
use word_server::auth::{
    IdentityResolver, InMemorySessionStore, NonceRegistry, SESSION_COOKIE, SessionResolver,
    WalletSignatureResolver,
};
use word_server::{AppState, router};
use zk::StubEngine;

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn service(config: RuntimeConfig) -> RoundService {
    let gateway = ProofGateway::new(
        EngineHandle::ready(Arc::new(StubEngine::new(false))),
        Duration::from_secs(5),
        false,
    );
    RoundService::builder()
        .protocol(ProtocolConfig::default().with_username_binding(false))
        .config(config)
        .repository(Arc::new(InMemoryRoundRepository::new()))
        .gateway(gateway)
        .build()
        .unwrap()
}

fn app_with(service: RoundService, identity: Arc<dyn IdentityResolver>) -> Router {
    router(AppState::new(service, identity, Arc::new(NonceRegistry::default())))
}

fn wallet_app_with(service: RoundService) -> Router {
    let nonces = Arc::new(NonceRegistry::default());
    let identity = Arc::new(WalletSignatureResolver::new(nonces.clone()));
    router(AppState::new(service, identity, nonces))
}

fn wallet_app() -> (Router, RoundService) {
    let service = service(RuntimeConfig::default());
    (wallet_app_with(service.clone()), service)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn fresh_nonce(app: &Router) -> String {
    let (status, body) = send(app, get("/auth/nonce")).await;
    assert_eq!(status, StatusCode::OK);
    body["nonce"].as_str().unwrap().to_string()
}

/// `address`/`signature`/`message` fields for `action` signed with the dev
/// key over a fresh server nonce.
async fn signed(app: &Router, action: &str) -> Value {
    let message = format!("{action}:{}", fresh_nonce(app).await);
    let key = signing_key_from_hex(DEV_KEY).unwrap();
    json!({
        "address": DEV_ADDRESS,
        "signature": sign_personal_message(&key, &message).unwrap(),
        "message": message,
    })
}

fn merge(mut body: Value, extra: Value) -> Value {
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    body
}

async fn proof_for(service: &RoundService, phrase: &str) -> (Value, String) {
    let (proof, commitment) = service.gateway().prove(phrase, None).await.unwrap();
    (serde_json::to_value(proof).unwrap(), commitment.to_string())
}

async fn create_round(app: &Router, service: &RoundService, phrase: &str) -> u64 {
    let (proof, commitment) = proof_for(service, phrase).await;
    let (status, body) = send(
        app,
        post(
            "/create",
            json!({ "commitment": commitment, "proof": proof, "hint": "classic", "prize": 10 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["round"].as_u64().unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let (app, _) = wallet_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn create_then_read_a_round() {
    let (app, service) = wallet_app();
    let round = create_round(&app, &service, "hunter2").await;
    assert_eq!(round, 1);

    let (status, body) = send(&app, get("/round/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], json!(true));
    assert_eq!(body["hint"], json!("classic"));
    assert_eq!(body["numWhispers"], json!(0));
    assert_eq!(body["prize"], json!(10));
    assert!(body.get("secret").is_none());
}

#[tokio::test]
async fn unknown_round_is_not_found() {
    let (app, _) = wallet_app();
    let (status, body) = send(&app, get("/round/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("RoundNotFound"));
    assert!(body["message"].as_str().unwrap().contains("42"));

    let (status, body) = send(&app, get("/round/forty-two")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("MalformedRequest"));
}

#[tokio::test]
async fn invalid_proof_is_rejected() {
    let (app, service) = wallet_app();
    let (proof, _) = proof_for(&service, "hunter3").await;
    let (_, commitment) = proof_for(&service, "hunter2").await;

    let (status, body) = send(
        &app,
        post(
            "/create",
            json!({ "commitment": commitment, "proof": proof, "hint": "classic" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("InvalidProof"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (app, _) = wallet_app();
    let request = Request::post("/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"commitment\":"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("MalformedRequest"));
}

#[tokio::test]
async fn creation_disabled_is_forbidden() {
    let service = service(RuntimeConfig::default().with_creation_enabled(false));
    let app = wallet_app_with(service.clone());
    let (proof, commitment) = proof_for(&service, "hunter2").await;

    let (status, body) = send(
        &app,
        post(
            "/create",
            json!({ "commitment": commitment, "proof": proof, "hint": "classic" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("CreationDisabled"));
}

#[tokio::test]
async fn whisper_requires_a_valid_signature() {
    let (app, service) = wallet_app();
    let round = create_round(&app, &service, "hunter2").await;
    let (proof, _) = proof_for(&service, "hunter2").await;

    let (status, body) = send(&app, post("/whisper", json!({ "round": round, "proof": proof }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Unauthorized"));

    let mut forged = signed(&app, "whisper").await;
    forged["message"] = json!("something else");
    let (status, _) = send(
        &app,
        post("/whisper", merge(json!({ "round": round, "proof": proof }), forged)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let credentials = signed(&app, "whisper").await;
    let (status, body) = send(
        &app,
        post(
            "/whisper",
            merge(json!({ "round": round, "proof": proof }), credentials.clone()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body, json!({}));

    // The same signature a second time is a replay.
    let (status, body) = send(
        &app,
        post(
            "/whisper",
            merge(json!({ "round": round, "proof": proof }), credentials),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Unauthorized"));

    let (status, body) = send(
        &app,
        post(
            "/whisper",
            merge(json!({ "round": round, "proof": proof }), signed(&app, "whisper").await),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("AlreadyWhispered"));

    let (_, body) = send(&app, get("/round/1")).await;
    assert_eq!(body["whisperers"], json!([DEV_ADDRESS]));
}

#[tokio::test]
async fn shout_closes_the_round() {
    let (app, service) = wallet_app();
    let round = create_round(&app, &service, "hunter2").await;

    let (status, body) = send(
        &app,
        post(
            "/shout",
            merge(json!({ "round": round, "secret": "hunter3" }), signed(&app, "shout").await),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("InvalidSecret"));

    let (status, body) = send(
        &app,
        post(
            "/shout",
            merge(json!({ "round": round, "secret": "hunter2" }), signed(&app, "shout").await),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["round"], json!(round));

    let (_, body) = send(&app, get("/round/1")).await;
    assert_eq!(body["active"], json!(false));
    assert_eq!(body["secret"], json!("hunter2"));
    assert_eq!(body["shouter"], json!(DEV_ADDRESS));

    let (status, body) = send(
        &app,
        post(
            "/shout",
            merge(json!({ "round": round, "secret": "hunter2" }), signed(&app, "shout").await),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("RoundNotActive"));
}

#[tokio::test]
async fn verify_checks_without_mutating() {
    let (app, service) = wallet_app();
    let round = create_round(&app, &service, "hunter2").await;
    let (proof, commitment) = proof_for(&service, "hunter2").await;

    let (status, body) = send(&app, post("/verify", json!({ "proof": proof, "round": round }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "shouted": false }));

    let (status, body) = send(
        &app,
        post("/verify", json!({ "proof": proof, "commitment": commitment })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    let (status, body) = send(&app, post("/verify", json!({ "proof": proof }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("MalformedRequest"));

    let (_, body) = send(&app, get("/round/1")).await;
    assert_eq!(body["numWhispers"], json!(0));
}

#[tokio::test]
async fn listing_carries_caller_flags_when_signed() {
    let (app, service) = wallet_app();
    let first = create_round(&app, &service, "hunter2").await;
    create_round(&app, &service, "swordfish").await;
    let (proof, _) = proof_for(&service, "hunter2").await;
    send(
        &app,
        post(
            "/whisper",
            merge(json!({ "round": first, "proof": proof }), signed(&app, "whisper").await),
        ),
    )
    .await;

    let (status, body) = send(&app, get("/rounds")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert!(body[0].get("whispered").is_none());

    let message = format!("rounds:{}", fresh_nonce(&app).await);
    let key = signing_key_from_hex(DEV_KEY).unwrap();
    let signature = sign_personal_message(&key, &message).unwrap();
    let uri = format!("/rounds?address={DEV_ADDRESS}&signature={signature}&message={message}");
    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["whispered"], json!(true));
    assert_eq!(body[1]["whispered"], json!(false));

    let (status, body) = send(&app, get(&format!("/rounds/sorted/{DEV_ADDRESS}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["whispered"][0]["round"], json!(1));
    assert_eq!(body["notWhispered"][0]["round"], json!(2));
}

#[tokio::test]
async fn session_scheme_reads_the_cookie() {
    let store = Arc::new(InMemorySessionStore::new());
    let token = store.issue(Identity::new("alice"));
    let resolver = SessionResolver::new(store);
    assert_eq!(resolver.scheme(), IdentityScheme::Session);

    let service = service(RuntimeConfig::default());
    let app = app_with(service.clone(), Arc::new(resolver));
    let round = create_round(&app, &service, "hunter2").await;
    let (proof, _) = proof_for(&service, "hunter2").await;

    let (status, _) = send(&app, post("/whisper", json!({ "round": round, "proof": proof }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::post("/whisper")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("{SESSION_COOKIE}={token}"))
        .body(Body::from(json!({ "round": round, "proof": proof }).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (_, body) = send(&app, get("/round/1")).await;
    assert_eq!(body["whisperers"], json!(["alice"]));
}

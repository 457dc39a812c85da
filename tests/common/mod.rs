// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use studio_api::config::Config;
use studio_api::context::AuthContext;
use studio_api::db::{paths, DocumentStore, FirestoreStore, MemoryStore, WriteMode};
use studio_api::error::{AppError, Result};
use studio_api::middleware::AuthUser;
use studio_api::models::{ProjectRole, UserProject};
use studio_api::routes::create_router;
use studio_api::services::{
    IdentityClient, InvitationEmail, Notifier, Services, TokenVerifier,
};
use studio_api::AppState;
use tower::ServiceExt;

pub const TEST_KID: &str = "test-kid";
const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_private.pem");
const PUBLIC_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreStore {
    FirestoreStore::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Notifier that records instead of sending.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<InvitationEmail>>,
    fail_sends: AtomicBool,
    unconfigured: AtomicBool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<InvitationEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn unconfigure(&self) {
        self.unconfigured.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn ensure_configured(&self) -> Result<()> {
        if self.unconfigured.load(Ordering::SeqCst) {
            return Err(AppError::MissingConfig("RESEND_API_KEY"));
        }
        Ok(())
    }

    async fn send_invitation(&self, email: &InvitationEmail) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(AppError::Notification("Resend returned status 500".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Services wired over an in-memory store.
pub struct TestServices {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub services: Services,
}

pub fn test_services() -> TestServices {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let config = Config::test_default();
    let services = Services::new(store.clone(), notifier.clone(), &config.site_url);
    TestServices {
        store,
        notifier,
        services,
    }
}

impl TestServices {
    pub fn ctx(&self, uid: &str) -> AuthContext {
        self.ctx_with_email(uid, &format!("{uid}@example.com"))
    }

    pub fn ctx_with_email(&self, uid: &str, email: &str) -> AuthContext {
        AuthContext::new(
            AuthUser {
                uid: uid.to_string(),
                email: Some(email.to_string()),
            },
            self.store.clone(),
        )
    }

    /// Write a membership record directly.
    pub async fn grant(&self, uid: &str, project_id: &str, role: ProjectRole) {
        let record = serde_json::to_value(UserProject::new(uid, project_id, role)).unwrap();
        self.store
            .set(&paths::user_project(uid, project_id), record, WriteMode::Replace)
            .await
            .unwrap();
    }

    pub async fn put(&self, path: &str, data: Value) {
        self.store
            .set(&doc_path(path), data, WriteMode::Replace)
            .await
            .unwrap();
    }
}

pub fn doc_path(path: &str) -> studio_api::db::DocPath {
    studio_api::db::DocPath::parse(path).expect("valid document path")
}

/// Full app over an in-memory store with static-key token verifiers.
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(Config::test_default())
}

pub fn create_test_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let id_tokens = TokenVerifier::firebase(&config)
        .unwrap()
        .with_static_key(TEST_KID, decoding_key())
        .unwrap();
    let scheduler_tokens = TokenVerifier::scheduler(&config)
        .unwrap()
        .with_static_key(TEST_KID, decoding_key())
        .unwrap();
    let identity = IdentityClient::new(&config).unwrap();

    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        notifier.clone(),
        id_tokens,
        scheduler_tokens,
        identity,
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        store,
        notifier,
    }
}

fn decoding_key() -> DecodingKey {
    DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM).unwrap()
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

#[derive(Serialize)]
struct TestClaims {
    iss: String,
    aud: String,
    sub: String,
    iat: usize,
    exp: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    email_verified: bool,
}

fn sign(claims: &TestClaims) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    encode(
        &header,
        claims,
        &EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).unwrap(),
    )
    .unwrap()
}

/// Firebase ID token for `uid` in the test project.
pub fn id_token(uid: &str, email: &str) -> String {
    id_token_for(uid, email, "test-project")
}

pub fn id_token_for(uid: &str, email: &str, project_id: &str) -> String {
    let now = now();
    sign(&TestClaims {
        iss: format!("https://securetoken.google.com/{project_id}"),
        aud: project_id.to_string(),
        sub: uid.to_string(),
        iat: now,
        exp: now + 3600,
        email: Some(email.to_string()),
        email_verified: true,
    })
}

pub fn expired_id_token(uid: &str) -> String {
    let now = now();
    sign(&TestClaims {
        iss: "https://securetoken.google.com/test-project".to_string(),
        aud: "test-project".to_string(),
        sub: uid.to_string(),
        iat: now - 7200,
        exp: now - 3600,
        email: None,
        email_verified: false,
    })
}

/// Cloud Scheduler OIDC token for `email`.
pub fn scheduler_token(email: &str) -> String {
    let now = now();
    sign(&TestClaims {
        iss: "https://accounts.google.com".to_string(),
        aud: "http://localhost:8080".to_string(),
        sub: "scheduler-sub".to_string(),
        iat: now,
        exp: now + 3600,
        email: Some(email.to_string()),
        email_verified: true,
    })
}

pub fn rpc_get(procedure: &str, input: &Value, token: &str) -> Request<Body> {
    let uri = format!(
        "/rpc/{}?input={}",
        procedure,
        urlencoding::encode(&input.to_string())
    );
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn rpc_post(procedure: &str, input: &Value, token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/rpc/{procedure}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(input.to_string()))
        .unwrap()
}

/// Send one request through a fresh clone of the router.
pub async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send and expect `expected`, returning the JSON body.
pub async fn call(app: &TestApp, request: Request<Body>, expected: StatusCode) -> Value {
    let response = send(app, request).await;
    let status = response.status();
    let body = body_json(response).await;
    assert_eq!(status, expected, "unexpected status, body: {body}");
    body
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests for the authenticated-request lifecycle: login,
//! expiry detection, suspend-and-prompt, refresh, resume, and logout,
//! against a mock tour-booking API.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use tourbook::session::coordinator::{PromptChoice, PromptRequest};
use tourbook::session::gate::{ApiRequest, SendOptions};
use tourbook::session::store::MemoryStore;
use tourbook::{ClientConfig, GateError, LogoutReason, Session, SessionEvent};

struct TestApi {
    /// Lifetime the login endpoint grants, in seconds. Zero issues an
    /// already-expired token.
    login_expires_in: AtomicU64,
    refresh_ok: AtomicBool,
    refresh_calls: AtomicU32,
    tour_auth: Mutex<Vec<Option<String>>>,
}

async fn login(State(api): State<Arc<TestApi>>, Json(body): Json<Value>) -> Json<Value> {
    let email = body.get("email").and_then(Value::as_str).unwrap_or("x@example.com");
    Json(json!({
        "user": { "id": "u-1", "name": "Ada", "email": email, "role": "user" },
        "access_token": "access-initial",
        "refresh_token": "refresh-1",
        "expires_in": api.login_expires_in.load(Ordering::SeqCst),
    }))
}

async fn refresh(State(api): State<Arc<TestApi>>) -> (StatusCode, Json<Value>) {
    let n = api.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if api.refresh_ok.load(Ordering::SeqCst) {
        (
            StatusCode::OK,
            Json(json!({ "access_token": format!("access-refreshed-{n}"), "expires_in": 3600 })),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({ "message": "refresh token revoked" })))
    }
}

async fn tours(State(api): State<Arc<TestApi>>, headers: HeaderMap) -> Json<Value> {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_owned);
    api.tour_auth.lock().unwrap().push(auth);
    Json(json!({ "tours": ["alps", "fjords"] }))
}

async fn logout() -> Json<Value> {
    Json(Value::Null)
}

static CRYPTO_INIT: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
fn ensure_crypto_provider() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

async fn spawn_api(expires_in: u64, refresh_ok: bool) -> (String, Arc<TestApi>) {
    ensure_crypto_provider();
    let api = Arc::new(TestApi {
        login_expires_in: AtomicU64::new(expires_in),
        refresh_ok: AtomicBool::new(refresh_ok),
        refresh_calls: AtomicU32::new(0),
        tour_auth: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/tours", get(tours))
        .with_state(Arc::clone(&api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (format!("http://{addr}"), api)
}

fn config(base: &str) -> ClientConfig {
    ClientConfig {
        api_url: base.to_owned(),
        state_dir: None,
        expiry_memo_ms: 1000,
        prompt_timeout_secs: 5,
        http_timeout_secs: 5,
    }
}

fn memory_session(base: &str) -> Session {
    Session::new(&config(base), Arc::new(MemoryStore::new()))
}

/// Answer every prompt with the given choice, counting prompts.
fn answer_prompts(
    mut prompts: mpsc::Receiver<PromptRequest>,
    choice: PromptChoice,
    count: Arc<AtomicU32>,
) {
    tokio::spawn(async move {
        while let Some(req) = prompts.recv().await {
            count.fetch_add(1, Ordering::SeqCst);
            // Give concurrent callers time to queue behind the prompt.
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = req.reply.send(choice);
        }
    });
}

#[tokio::test]
async fn expired_session_recovers_and_resumes_the_original_call() {
    let (base, api) = spawn_api(0, true).await;
    let session = memory_session(&base);
    let prompt_count = Arc::new(AtomicU32::new(0));
    answer_prompts(
        session.coordinator().register_prompt_handler(),
        PromptChoice::Continue,
        Arc::clone(&prompt_count),
    );

    session.login("ada@example.com", "pw").await.unwrap();

    let resp = session.get("/tours").await.unwrap();
    assert!(resp.is_success());

    // The blocked request was resumed with the refreshed token.
    assert_eq!(
        api.tour_auth.lock().unwrap().as_slice(),
        &[Some("Bearer access-refreshed-1".to_owned())]
    );
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(prompt_count.load(Ordering::SeqCst), 1);

    // Fresh expiry: the next call goes straight through, no re-prompt.
    session.get("/tours").await.unwrap();
    assert_eq!(prompt_count.load(Ordering::SeqCst), 1);
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn refresh_failure_clears_credential_and_user() {
    let (base, api) = spawn_api(0, false).await;
    let session = memory_session(&base);
    let prompt_count = Arc::new(AtomicU32::new(0));
    answer_prompts(
        session.coordinator().register_prompt_handler(),
        PromptChoice::Continue,
        Arc::clone(&prompt_count),
    );

    session.login("ada@example.com", "pw").await.unwrap();
    let mut events = session.subscribe();

    match session.get("/tours").await {
        Err(GateError::SessionExpired) => {}
        other => panic!("expected SessionExpired, got {other:?}"),
    }

    // The original request was never sent, and the session is gone.
    assert!(api.tour_auth.lock().unwrap().is_empty());
    assert_eq!(session.store().load().unwrap(), None);
    assert_eq!(session.current_user().unwrap(), None);

    loop {
        match events.recv().await.unwrap() {
            SessionEvent::LoggedOut { reason } => {
                assert_eq!(reason, LogoutReason::RefreshFailed);
                break;
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn declining_the_prompt_aborts_without_sending() {
    let (base, api) = spawn_api(0, true).await;
    let session = memory_session(&base);
    let prompt_count = Arc::new(AtomicU32::new(0));
    answer_prompts(
        session.coordinator().register_prompt_handler(),
        PromptChoice::LogOut,
        Arc::clone(&prompt_count),
    );

    session.login("ada@example.com", "pw").await.unwrap();

    match session.get("/tours").await {
        Err(GateError::SessionExpired) => {}
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert!(api.tour_auth.lock().unwrap().is_empty());
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.current_user().unwrap(), None);
}

#[tokio::test]
async fn concurrent_callers_share_one_prompt_and_all_resume() {
    let (base, api) = spawn_api(0, true).await;
    let session = Arc::new(memory_session(&base));
    let prompt_count = Arc::new(AtomicU32::new(0));
    answer_prompts(
        session.coordinator().register_prompt_handler(),
        PromptChoice::Continue,
        Arc::clone(&prompt_count),
    );

    session.login("ada@example.com", "pw").await.unwrap();

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.get("/tours").await })
        })
        .collect();

    for result in join_all(callers).await {
        assert!(result.unwrap().unwrap().is_success());
    }

    assert_eq!(prompt_count.load(Ordering::SeqCst), 1);
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.tour_auth.lock().unwrap().len(), 4);
    // Every resumed request used the refreshed token.
    for auth in api.tour_auth.lock().unwrap().iter() {
        assert_eq!(auth.as_deref(), Some("Bearer access-refreshed-1"));
    }
}

#[tokio::test]
async fn skip_auth_requests_never_prompt() {
    let (base, api) = spawn_api(3600, true).await;
    let session = memory_session(&base);
    // No prompt handler registered at all: a prompt would error, not hang.

    let resp = session
        .gate()
        .send(ApiRequest::get("/tours"), SendOptions::skip_auth())
        .await
        .unwrap();
    assert!(resp.is_success());
    assert_eq!(api.tour_auth.lock().unwrap().as_slice(), &[None]);
}

#[tokio::test]
async fn unanswered_prompt_times_out_into_logout() {
    let (base, _api) = spawn_api(0, true).await;
    let mut cfg = config(&base);
    cfg.prompt_timeout_secs = 1;
    let session = Session::new(&cfg, Arc::new(MemoryStore::new()));

    let mut prompts = session.coordinator().register_prompt_handler();
    tokio::spawn(async move {
        // Receive the prompt but never answer.
        let _req = prompts.recv().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    session.login("ada@example.com", "pw").await.unwrap();
    let mut events = session.subscribe();

    match session.get("/tours").await {
        Err(GateError::SessionExpired) => {}
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert_eq!(session.current_user().unwrap(), None);

    loop {
        match events.recv().await.unwrap() {
            SessionEvent::LoggedOut { reason } => {
                assert_eq!(reason, LogoutReason::PromptTimeout);
                break;
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn file_backed_session_survives_a_restart() {
    let (base, _api) = spawn_api(3600, true).await;
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(&base);
    cfg.state_dir = Some(dir.path().to_path_buf());

    {
        let session = Session::with_file_store(&cfg);
        session.login("ada@example.com", "pw").await.unwrap();
    }

    // A new process sees the persisted credential and user.
    let session = Session::with_file_store(&cfg);
    let user = session.current_user().unwrap().unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(session.store().load().unwrap().unwrap().access_token, "access-initial");
}

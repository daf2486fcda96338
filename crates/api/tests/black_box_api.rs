use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, extract::State, http::StatusCode as AxumStatus, routing::post};
use chrono::{Duration as ChronoDuration, Utc};
use dashgate_api::app::{AppState, build_app};
use dashgate_api::config::AppConfig;
use dashgate_core::UserId;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{StatusCode, header::LOCATION, header::SET_COOKIE, redirect};
use serde_json::{Value, json};

const SECRET: &str = "black-box-secret-0123456789abcdef";
const PASSWORD: &str = "correct-horse";

/// Fake identity backend: accepts one password, counts calls.
#[derive(Clone)]
struct FakeIdentity {
    user_id: UserId,
    calls: Arc<AtomicUsize>,
}

async fn fake_login(State(fake): State<FakeIdentity>, Json(body): Json<Value>) -> axum::response::Response {
    use axum::response::IntoResponse;

    fake.calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD {
        return (
            AxumStatus::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Invalid credentials"})),
        )
            .into_response();
    }
    Json(json!({
        "success": true,
        "data": {
            "user": {
                "id": fake.user_id.to_string(),
                "email": body["email"],
                "name": "Alice",
                "role": "admin",
                "onboardingCompleted": false
            }
        }
    }))
    .into_response()
}

struct TestServer {
    base_url: String,
    backend_calls: Arc<AtomicUsize>,
    user_id: UserId,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    async fn spawn() -> Self {
        let backend = FakeIdentity {
            user_id: UserId::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let backend_router = Router::new()
            .route("/auth/login", post(fake_login))
            .with_state(backend.clone());
        let (backend_url, backend_handle) = serve(backend_router).await;

        Self::spawn_with_backend(backend_url, backend, vec![backend_handle]).await
    }

    async fn spawn_with_backend(
        backend_url: String,
        backend: FakeIdentity,
        mut handles: Vec<tokio::task::JoinHandle<()>>,
    ) -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "AUTH_SECRET" => Some(SECRET.to_string()),
            "IDENTITY_BACKEND_URL" => Some(backend_url.clone()),
            "IDENTITY_BACKEND_TIMEOUT_MS" => Some("2000".to_string()),
            _ => None,
        })
        .expect("test config is valid");

        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(AppState::from_config(&config).expect("state wires"));
        let (base_url, handle) = serve(app).await;
        handles.push(handle);

        Self {
            base_url,
            backend_calls: backend.calls,
            user_id: backend.user_id,
            handles,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
    }
}

async fn serve(router: Router) -> (String, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

fn mint_token(secret: &str, onboarded: bool, issued_offset: ChronoDuration, ttl: ChronoDuration) -> String {
    let issued_at = Utc::now() + issued_offset;
    let claims = json!({
        "sub": UserId::new().to_string(),
        "email": "bob@example.com",
        "name": "Bob",
        "organization_id": null,
        "role": "member",
        "onboarding_completed": onboarded,
        "iat": issued_at.timestamp(),
        "exp": (issued_at + ttl).timestamp(),
        "aud": "dashgate.session",
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn valid_token(onboarded: bool) -> String {
    mint_token(SECRET, onboarded, ChronoDuration::seconds(-5), ChronoDuration::minutes(10))
}

fn location(res: &reqwest::Response) -> &str {
    res.headers()
        .get(LOCATION)
        .expect("redirect carries a location")
        .to_str()
        .unwrap()
}

fn session_cookie(res: &reqwest::Response) -> String {
    let set_cookie = res
        .headers()
        .get(SET_COOKIE)
        .expect("response sets the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn anonymous_request_is_sent_to_login_with_callback() {
    let srv = TestServer::spawn().await;

    let res = client().get(srv.url("/dashboard/settings")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "/login?callbackUrl=/dashboard/settings");
}

#[tokio::test]
async fn login_callback_stays_on_this_origin() {
    let srv = TestServer::spawn().await;

    let res = client().get(srv.url("//evil.example/x")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "/login?callbackUrl=/evil.example/x");
}

#[tokio::test]
async fn anonymous_request_reaches_public_and_api_routes() {
    let srv = TestServer::spawn().await;
    let client = client();

    let res = client.get(srv.url("/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.get(srv.url("/api/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/api/v1/anything")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get(LOCATION).is_none());
}

#[tokio::test]
async fn login_sets_cookie_and_gates_on_onboarding() {
    let srv = TestServer::spawn().await;
    let client = client();

    let res = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "alice@example.com", "password": PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let raw_cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(raw_cookie.contains("HttpOnly"));
    assert!(raw_cookie.contains("Max-Age=604800"));
    let cookie = session_cookie(&res);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["session"]["id"], srv.user_id.to_string());
    assert_eq!(body["session"]["role"], "admin");
    assert_eq!(body["session"]["onboardingCompleted"], false);

    // Signed in but not onboarded: login page and dashboard both go to onboarding.
    for path in ["/login", "/dashboard"] {
        let res = client.get(srv.url(path)).header("cookie", &cookie).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(location(&res), "/onboarding", "{path}");
    }

    let res = client
        .get(srv.url("/onboarding/organization"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(srv.url("/api/auth/session"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    let session: Value = res.json().await.unwrap();
    assert_eq!(session["email"], "alice@example.com");
}

#[tokio::test]
async fn weak_password_fails_without_backend_call() {
    let srv = TestServer::spawn().await;

    let res = client()
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "alice@example.com", "password": "12345"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(SET_COOKIE).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
    assert_eq!(body["message"], "invalid email or password");
    assert_eq!(srv.backend_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_and_malformed_logins_look_identical() {
    let srv = TestServer::spawn().await;
    let client = client();

    let rejected = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "alice@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    let malformed = client
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "not-an-email", "password": PASSWORD}))
        .send()
        .await
        .unwrap();

    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(malformed.status(), StatusCode::UNAUTHORIZED);
    let rejected: Value = rejected.json().await.unwrap();
    let malformed: Value = malformed.json().await.unwrap();
    assert_eq!(rejected, malformed);
    assert_eq!(srv.backend_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_json_login_body_is_bad_request() {
    let srv = TestServer::spawn().await;

    let res = client()
        .post(srv.url("/api/auth/login"))
        .body("email=alice@example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn backend_outage_is_service_unavailable() {
    // Reserve a port and release it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let backend = FakeIdentity {
        user_id: UserId::new(),
        calls: Arc::new(AtomicUsize::new(0)),
    };
    let srv = TestServer::spawn_with_backend(dead_url, backend, Vec::new()).await;

    let res = client()
        .post(srv.url("/api/auth/login"))
        .json(&json!({"email": "alice@example.com", "password": PASSWORD}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "backend_unavailable");
}

#[tokio::test]
async fn onboarded_bearer_session_routes() {
    let srv = TestServer::spawn().await;
    let client = client();
    let token = valid_token(true);

    let res = client.get(srv.url("/onboarding")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "/dashboard");

    let res = client.get(srv.url("/register")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(location(&res), "/dashboard");

    let res = client.get(srv.url("/dashboard/profile")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.headers().get(LOCATION).is_none());
}

#[tokio::test]
async fn expired_or_foreign_tokens_count_as_anonymous() {
    let srv = TestServer::spawn().await;
    let client = client();

    let expired = mint_token(SECRET, true, ChronoDuration::hours(-2), ChronoDuration::hours(1));
    let foreign = mint_token(
        "some-other-secret-0123456789abcdef",
        true,
        ChronoDuration::seconds(-5),
        ChronoDuration::minutes(10),
    );

    for token in [expired, foreign, "garbage".to_string()] {
        let res = client.get(srv.url("/dashboard")).bearer_auth(&token).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&res), "/login?callbackUrl=/dashboard");

        let res = client.get(srv.url("/api/auth/session")).bearer_auth(&token).send().await.unwrap();
        let body: Value = res.json().await.unwrap();
        assert!(body.is_null());
    }
}

#[tokio::test]
async fn logout_clears_cookie() {
    let srv = TestServer::spawn().await;

    let res = client()
        .post(srv.url("/api/auth/logout"))
        .bearer_auth(valid_token(true))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("dashgate.session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

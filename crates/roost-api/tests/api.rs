use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roost_api::{AppState, AppStateInner, router};
use roost_crypto::SealingKey;
use roost_db::Database;
use roost_wallet::{MarketPrice, WalletError, WalletKeys, WalletService};

/// In-process chain: hands out numbered wallets and records transfers.
#[derive(Default)]
struct FakeWallet {
    next: AtomicU64,
    transfers: Mutex<Vec<(String, String, f64)>>,
    /// When set, the next transfer leaves this database unusable once the
    /// coins have moved.
    break_db_after_transfer: Mutex<Option<AppState>>,
}

#[async_trait]
impl WalletService for FakeWallet {
    fn generate(&self) -> Result<WalletKeys, WalletError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(WalletKeys {
            address: format!("0x{:064x}", n),
            private_key: format!("private-{}", n),
            mnemonic: format!("mnemonic words {}", n),
        })
    }

    async fn balance(&self, _address: &str) -> Result<f64, WalletError> {
        Ok(2.5)
    }

    async fn transfer(
        &self,
        private_key: &str,
        recipient: &str,
        amount_sui: f64,
    ) -> Result<String, WalletError> {
        let digest = {
            let mut transfers = self.transfers.lock().unwrap();
            transfers.push((private_key.to_string(), recipient.to_string(), amount_sui));
            format!("digest-{}", transfers.len())
        };
        if let Some(state) = self.break_db_after_transfer.lock().unwrap().take() {
            // A thread that panics while holding the connection poisons it
            let _ = std::thread::spawn(move || {
                let _session = state.db.session().unwrap();
                panic!("database went away");
            })
            .join();
        }
        Ok(digest)
    }

    async fn market_price(&self) -> MarketPrice {
        MarketPrice {
            price: 2.0,
            change_pct: -1.5,
        }
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    wallet: Arc<FakeWallet>,
    uploads: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let wallet = Arc::new(FakeWallet::default());
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret-that-is-long-enough".into(),
            session_days: 7,
            sealing_key: SealingKey::generate(),
            wallet: wallet.clone(),
            upload_dir: uploads.path().to_path_buf(),
        });
        Self {
            app: router(state.clone()),
            state,
            wallet,
            uploads,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "display_name": username.to_uppercase(),
                    "password": "hunter2hunter2",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn post(&self, token: &str, text: &str) -> i64 {
        let (status, body) = self
            .send(Method::POST, "/posts", Some(token), Some(json!({ "text": text })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let t = TestApp::new();
    t.register("alice").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({
                "username": "alice",
                "display_name": "Other Alice",
                "password": "hunter2hunter2",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    // The rejected signup never asked for a wallet.
    assert_eq!(t.wallet.next.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let t = TestApp::new();
    t.register("alice").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "alice", "password": "hunter2hunter2" }).to_string(),
        ))
        .unwrap();
    let response = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));
    let pair = cookie.split(';').next().unwrap().to_string();

    let req = Request::builder()
        .uri("/me")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["display_name"], "ALICE");
}

#[tokio::test]
async fn logout_clears_session_cookie() {
    let t = TestApp::new();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/logout")
        .header(header::COOKIE, "roost_session=abc")
        .body(Body::empty())
        .unwrap();
    let response = t.app.clone().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("roost_session=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn login_does_not_hold_the_database_during_password_check() {
    let t = TestApp::new();
    t.register("alice").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "username": "alice", "password": "hunter2hunter2" }).to_string(),
        ))
        .unwrap();
    let login_started = Instant::now();
    let login = tokio::spawn(t.app.clone().oneshot(req));

    // Let the login reach password verification
    tokio::time::sleep(Duration::from_millis(20)).await;

    let state = t.state.clone();
    let waited = tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        let _session = state.db.session().unwrap();
        started.elapsed()
    })
    .await
    .unwrap();

    let response = login.await.unwrap().unwrap();
    let login_took = login_started.elapsed();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        waited < login_took / 2,
        "session waited {:?} during a {:?} login",
        waited,
        login_took
    );
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let t = TestApp::new();
    t.register("alice").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "nope-nope-nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "nobody", "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let t = TestApp::new();
    let (status, _) = t.send(Method::GET, "/pages", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.send(Method::GET, "/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn follow_fills_feed_and_notifies() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    let bob = t.register("bob").await;

    t.post(&alice, "first").await;
    t.post(&bob, "bob says hi").await;
    let latest = t.post(&alice, "second").await;

    let (status, body) = t
        .send(Method::POST, "/users/alice/follow", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);

    let (_, body) = t
        .send(Method::POST, "/users/alice/follow", Some(&bob), None)
        .await;
    assert_eq!(body["changed"], false);

    let (status, page) = t.send(Method::GET, "/pages/home", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], "home");
    let posts = page["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0]["id"], latest);

    let (_, unseen) = t
        .send(Method::GET, "/notifications/unseen", Some(&alice), None)
        .await;
    assert_eq!(unseen["unseen"], 1);

    let (_, page) = t
        .send(Method::GET, "/pages/notifications", Some(&alice), None)
        .await;
    let notifications = page["data"]["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["text"], "@bob followed you");
    assert_eq!(notifications[0]["seen"], false);

    let (_, unseen) = t
        .send(Method::GET, "/notifications/unseen", Some(&alice), None)
        .await;
    assert_eq!(unseen["unseen"], 0);
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let t = TestApp::new();
    let alice = t.register("alice").await;

    let (status, _) = t
        .send(Method::POST, "/users/alice/follow", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(Method::POST, "/users/ghost/follow", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_page_shows_header_and_tabs() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    let bob = t.register("bob").await;
    let carol = t.register("carol").await;

    let post = t.post(&alice, "hello world").await;
    t.send(Method::POST, "/users/alice/follow", Some(&bob), None).await;
    t.send(Method::POST, "/users/alice/follow", Some(&carol), None).await;
    t.send(Method::POST, "/users/bob/follow", Some(&carol), None).await;
    t.send(Method::POST, &format!("/posts/{}/like", post), Some(&bob), None)
        .await;

    let (status, page) = t
        .send(Method::GET, "/pages/profile/alice", Some(&carol), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let header = &page["data"]["header"];
    assert_eq!(header["follower_count"], 2);
    assert_eq!(header["is_following"], true);
    assert_eq!(header["is_me"], false);
    // carol follows bob, and bob follows alice
    assert_eq!(header["mutual_followers"][0]["username"], "bob");
    assert_eq!(page["data"]["content"]["tab"], "posts");
    assert_eq!(page["data"]["content"]["items"][0]["like_count"], 1);

    let (_, page) = t
        .send(Method::GET, "/pages/profile/bob/likes", Some(&bob), None)
        .await;
    assert_eq!(page["data"]["header"]["is_me"], true);
    let liked = page["data"]["content"]["items"].as_array().unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["liked_by_me"], true);

    let (status, _) = t
        .send(Method::GET, "/pages/profile/nobody", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reply_page_lists_thread() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    let bob = t.register("bob").await;
    let post = t.post(&alice, "thoughts?").await;

    let (status, _) = t
        .send(
            Method::POST,
            &format!("/posts/{}/replies", post),
            Some(&bob),
            Some(json!({ "text": "agreed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, page) = t
        .send(Method::GET, &format!("/pages/reply/{}", post), Some(&alice), None)
        .await;
    assert_eq!(page["page"], "reply");
    assert_eq!(page["data"]["post"]["reply_count"], 1);
    assert_eq!(page["data"]["replies"][0]["username"], "bob");

    let (status, _) = t
        .send(Method::GET, "/pages/reply/999", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t
        .send(Method::GET, "/pages/nowhere", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn messages_page_shows_conversation() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    let bob = t.register("bob").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/messages/bob",
            Some(&alice),
            Some(json!({ "text": "hey bob" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    t.send(
        Method::POST,
        "/messages/alice",
        Some(&bob),
        Some(json!({ "text": "hey alice" })),
    )
    .await;

    let (_, page) = t
        .send(Method::GET, "/pages/messages/alice", Some(&bob), None)
        .await;
    assert_eq!(page["data"]["partners"][0]["username"], "alice");
    assert_eq!(page["data"]["with"]["username"], "alice");
    let messages = page["data"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["text"], "hey bob");

    let (_, notes) = t.send(Method::GET, "/notifications", Some(&bob), None).await;
    assert_eq!(notes[0]["text"], "New message from @alice");
}

#[tokio::test]
async fn wallet_page_and_tips() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    let bob = t.register("bob").await;

    let (_, page) = t.send(Method::GET, "/pages/wallet", Some(&alice), None).await;
    assert_eq!(page["page"], "wallet");
    assert_eq!(page["data"]["balance"], 2.5);
    assert_eq!(page["data"]["holdings_value"], 5.0);

    let (status, body) = t
        .send(
            Method::POST,
            "/users/bob/tip",
            Some(&alice),
            Some(json!({ "amount": 0.5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["digest"], "digest-1");

    {
        let transfers = t.wallet.transfers.lock().unwrap();
        // Keys were sealed at rest and opened again for signing.
        assert_eq!(transfers[0].0, "private-0");
        assert_eq!(transfers[0].1, format!("0x{:064x}", 1));
    }

    let (_, notes) = t.send(Method::GET, "/notifications", Some(&bob), None).await;
    assert_eq!(notes[0]["text"], "Tip from @alice");

    let (status, _) = t
        .send(
            Method::POST,
            "/users/alice/tip",
            Some(&alice),
            Some(json!({ "amount": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(
            Method::POST,
            "/wallet/transfer",
            Some(&alice),
            Some(json!({ "destination": "0xabc", "amount": -1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tip_reports_digest_when_notification_fails() {
    let t = TestApp::new();
    let alice = t.register("alice").await;
    t.register("bob").await;

    *t.wallet.break_db_after_transfer.lock().unwrap() = Some(t.state.clone());

    let (status, body) = t
        .send(
            Method::POST,
            "/users/bob/tip",
            Some(&alice),
            Some(json!({ "amount": 0.25 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["digest"], "digest-1");
    assert_eq!(t.wallet.transfers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn revealing_keys_requires_password() {
    let t = TestApp::new();
    let alice = t.register("alice").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/wallet/keys",
            Some(&alice),
            Some(json!({ "password": "not-my-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, keys) = t
        .send(
            Method::POST,
            "/wallet/keys",
            Some(&alice),
            Some(json!({ "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(keys["private_key"], "private-0");
    assert_eq!(keys["mnemonic"], "mnemonic words 0");
}

#[tokio::test]
async fn uploads_land_under_the_media_root() {
    let t = TestApp::new();
    let alice = t.register("alice").await;

    let upload = |filename: &str, bytes: &'static [u8]| {
        Request::builder()
            .method(Method::POST)
            .uri(format!("/uploads/post-images?filename={}", filename))
            .header(header::AUTHORIZATION, format!("Bearer {}", alice))
            .body(Body::from(bytes))
            .unwrap()
    };

    let response = t
        .app
        .clone()
        .oneshot(upload("cat.png", b"\x89PNG fake image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let stored: Value = serde_json::from_slice(&bytes).unwrap();

    let path = std::path::PathBuf::from(stored["path"].as_str().unwrap());
    assert!(path.starts_with(t.uploads.path().join("posts")));
    assert!(path.to_string_lossy().ends_with("_cat.png"));
    assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG fake image");
    assert!(stored["url"].as_str().unwrap().starts_with("/media/posts/"));

    let response = t
        .app
        .clone()
        .oneshot(upload("notes.txt", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

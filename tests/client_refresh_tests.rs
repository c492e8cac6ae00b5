// Refresh coordination tests against a mock API server
//
// Every test builds its own client, credential store and navigator so the
// refresh gate state never leaks between scenarios.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yt_console::api::projects;
use yt_console::client::{ApiClient, RecordingNavigator, RefreshEndpoint, RequestOptions, TokenPair};
use yt_console::credentials::{CredentialKey, CredentialStore, Credentials, MemoryCredentialStore};
use yt_console::error::AppError;
use yt_console::session;

const CURRENT_LOCATION: &str = "/Channel/list?page=2";
const EXPECTED_REDIRECT: &str = "/login?redirect=%2FChannel%2Flist%3Fpage%3D2";

struct Harness {
    server: MockServer,
    store: Arc<MemoryCredentialStore>,
    navigator: Arc<RecordingNavigator>,
    client: Arc<ApiClient>,
}

async fn harness(credentials: Credentials) -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::with_credentials(credentials));
    let navigator = Arc::new(RecordingNavigator::new(CURRENT_LOCATION));

    let client = ApiClient::builder(format!("{}/v1/api", server.uri()), store.clone())
        .refresh_url(format!("{}/v1/api/auth/refresh-token", server.uri()))
        .navigator(navigator.clone())
        .build()
        .unwrap();

    Harness {
        server,
        store,
        navigator,
        client: Arc::new(client),
    }
}

fn logged_in(access_token: &str) -> Credentials {
    Credentials {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("r1".to_string()),
        account_id: Some("42".to_string()),
    }
}

fn envelope(response: Value) -> Value {
    json!({ "status": 200, "success": true, "msg": "ok", "response": response })
}

fn refresh_success(access_token: &str, refresh_token: Option<&str>) -> ResponseTemplate {
    let mut payload = json!({ "access_token": access_token });
    if let Some(refresh_token) = refresh_token {
        payload["refresh_token"] = json!(refresh_token);
    }
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "response": payload }))
}

async fn mount_refresh(server: &MockServer, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/api/auth/refresh-token"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_projects(server: &MockServer, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v1/api/project"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let h = harness(logged_in("t1")).await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_projects(
        &h.server,
        "t2",
        ResponseTemplate::new(200).set_body_json(envelope(json!([{ "id": 1, "name": "Main", "auth_status": 1 }]))),
    )
    .await;
    mount_refresh(
        &h.server,
        refresh_success("t2", Some("r2")).set_delay(Duration::from_millis(200)),
        1,
    )
    .await;

    let results = join_all((0..5).map(|_| projects::list_projects(&h.client))).await;

    for result in results {
        let list = result.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Main");
    }
    assert_eq!(h.store.get(CredentialKey::AccessToken).as_deref(), Some("t2"));
    assert_eq!(h.store.get(CredentialKey::RefreshToken).as_deref(), Some("r2"));
    assert_eq!(h.navigator.redirect_count(), 0);
    assert!(!h.client.gate().is_refreshing());
}

#[tokio::test]
async fn test_refreshed_request_is_retried_once_with_new_token() {
    let h = harness(logged_in("stale")).await;
    let body = envelope(json!([{ "code": "en", "name": "English" }]));

    Mock::given(method("GET"))
        .and(path("/v1/api/lang"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/api/lang"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/api/auth/refresh-token"))
        .and(header_exists("x-timestamp"))
        .and(header_exists("x-nonce"))
        .and(body_json(json!({ "account_id": "42", "refresh_token": "r1" })))
        .respond_with(refresh_success("abc", None))
        .expect(1)
        .mount(&h.server)
        .await;

    let result: Value = h.client.get("/lang", RequestOptions::new()).await.unwrap();

    assert_eq!(result, body);
    assert_eq!(h.store.get(CredentialKey::AccessToken).as_deref(), Some("abc"));
    // Not rotated, so the old refresh token stays
    assert_eq!(h.store.get(CredentialKey::RefreshToken).as_deref(), Some("r1"));
}

#[tokio::test]
async fn test_refresh_failure_clears_session_and_redirects_once() {
    let h = harness(logged_in("t1")).await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_refresh(
        &h.server,
        ResponseTemplate::new(500).set_body_json(json!({ "msg": "boom" })),
        1,
    )
    .await;

    let result = projects::list_projects(&h.client).await;

    assert!(matches!(result, Err(AppError::SessionExpired)));
    assert!(h.store.get(CredentialKey::AccessToken).is_none());
    assert!(h.store.get(CredentialKey::AccountId).is_none());
    assert_eq!(h.navigator.redirects(), vec![EXPECTED_REDIRECT.to_string()]);
    assert!(!h.client.gate().is_refreshing());
}

#[tokio::test]
async fn test_success_flag_false_is_a_refresh_failure() {
    let h = harness(logged_in("t1")).await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_refresh(
        &h.server,
        ResponseTemplate::new(200).set_body_json(json!({ "success": false, "msg": "revoked" })),
        1,
    )
    .await;

    let result = projects::list_projects(&h.client).await;
    assert!(matches!(result, Err(AppError::SessionExpired)));
    assert!(h.store.get(CredentialKey::AccessToken).is_none());
    assert_eq!(h.navigator.redirect_count(), 1);
}

#[tokio::test]
async fn test_queued_requests_are_rejected_when_refresh_fails() {
    let h = harness(logged_in("t1")).await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_refresh(
        &h.server,
        ResponseTemplate::new(401).set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let results = join_all((0..3).map(|_| projects::list_projects(&h.client))).await;

    for result in results {
        assert!(matches!(result, Err(AppError::SessionExpired)));
    }
    // Only the refresh leader redirects
    assert_eq!(h.navigator.redirect_count(), 1);
    assert!(!h.client.gate().is_refreshing());
    assert_eq!(h.client.gate().pending(), 0);
}

#[tokio::test]
async fn test_missing_refresh_token_fails_without_calling_endpoint() {
    let h = harness(Credentials {
        access_token: Some("t1".to_string()),
        refresh_token: None,
        account_id: Some("42".to_string()),
    })
    .await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_refresh(&h.server, refresh_success("t2", None), 0).await;

    let result = projects::list_projects(&h.client).await;

    assert!(matches!(result, Err(AppError::SessionExpired)));
    assert!(h.store.get(CredentialKey::AccessToken).is_none());
    assert_eq!(h.navigator.redirect_count(), 1);
}

#[tokio::test]
async fn test_no_token_short_circuits_without_network_call() {
    let h = harness(Credentials::default()).await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .expect(0)
        .mount(&h.server)
        .await;

    let result = projects::list_projects(&h.client).await;

    assert!(matches!(result, Err(AppError::SessionExpired)));
    assert_eq!(h.navigator.redirects(), vec![EXPECTED_REDIRECT.to_string()]);
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_skip_auth_sends_no_credentials_and_never_refreshes() {
    let h = harness(logged_in("t1")).await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "msg": "wrong password" })))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_refresh(&h.server, refresh_success("t2", None), 0).await;

    let result: Result<Value, AppError> = h
        .client
        .post("/auth/login", &json!({}), RequestOptions::new().skip_auth())
        .await;

    match result {
        Err(AppError::Http { status, message }) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(message, "wrong password");
        }
        other => panic!("Expected http error, got {:?}", other),
    }

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(h.store.get(CredentialKey::AccessToken).as_deref(), Some("t1"));
    assert_eq!(h.navigator.redirect_count(), 0);
}

#[tokio::test]
async fn test_login_then_protected_call_uses_new_token() {
    let h = harness(Credentials::default()).await;

    Mock::given(method("POST"))
        .and(path("/v1/api/auth/login"))
        .and(body_json(json!({ "eamil": "ops@example.com", "pass_word": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "user_id": 7,
            "jwt_token": "t-login",
            "refresh_token": "r-login"
        }))))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_projects(
        &h.server,
        "t-login",
        ResponseTemplate::new(200).set_body_json(envelope(json!([]))),
    )
    .await;

    let credentials = session::login(&h.client, "ops@example.com", "hunter2").await.unwrap();
    assert_eq!(credentials.account_id.as_deref(), Some("7"));

    let list = projects::list_projects(&h.client).await.unwrap();
    assert!(list.is_empty());
    assert_eq!(h.store.get(CredentialKey::RefreshToken).as_deref(), Some("r-login"));
    assert_eq!(h.store.get(CredentialKey::AccountId).as_deref(), Some("7"));
}

#[tokio::test]
async fn test_persistent_unauthorized_is_capped() {
    let h = harness(logged_in("t1")).await;

    Mock::given(method("GET"))
        .and(path("/v1/api/project"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&h.server)
        .await;
    mount_refresh(&h.server, refresh_success("t2", None), 2).await;

    let result = projects::list_projects(&h.client).await;

    assert!(matches!(result, Err(AppError::SessionExpired)));
    assert!(h.store.get(CredentialKey::AccessToken).is_none());
    assert!(h.store.get(CredentialKey::AccountId).is_none());
    assert_eq!(h.navigator.redirect_count(), 1);
}

#[tokio::test]
async fn test_abandoned_refresh_lets_waiter_take_over() {
    let h = harness(logged_in("t1")).await;

    mount_projects(&h.server, "t1", ResponseTemplate::new(401)).await;
    mount_projects(
        &h.server,
        "t2",
        ResponseTemplate::new(200).set_body_json(envelope(json!([]))),
    )
    .await;
    mount_refresh(
        &h.server,
        refresh_success("t2", None).set_delay(Duration::from_millis(400)),
        2,
    )
    .await;

    let leader_client = h.client.clone();
    let leader = tokio::spawn(async move { projects::list_projects(&leader_client).await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.client.gate().is_refreshing());

    let follower_client = h.client.clone();
    let follower = tokio::spawn(async move { projects::list_projects(&follower_client).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());

    let result = follower.await.unwrap();
    assert!(result.unwrap().is_empty());
    assert_eq!(h.store.get(CredentialKey::AccessToken).as_deref(), Some("t2"));
    assert_eq!(h.client.gate().cycles(), 2);
}

#[tokio::test]
async fn test_http_error_message_from_body() {
    let h = harness(logged_in("t1")).await;

    Mock::given(method("POST"))
        .and(path("/v1/api/monitorChannel"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "msg": "频道已存在" })))
        .mount(&h.server)
        .await;

    let result: Result<Value, AppError> = h
        .client
        .post("/monitorChannel", &json!({ "channel_id": "UC1" }), RequestOptions::new())
        .await;

    match result {
        Err(AppError::Http { status, message }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(message, "频道已存在");
        }
        other => panic!("Expected http error, got {:?}", other),
    }
    assert_eq!(h.store.get(CredentialKey::AccessToken).as_deref(), Some("t1"));
}

struct CountingEndpoint {
    calls: AtomicUsize,
}

#[async_trait]
impl RefreshEndpoint for CountingEndpoint {
    async fn refresh(&self, account_id: &str, refresh_token: &str) -> Result<TokenPair, AppError> {
        assert_eq!(account_id, "42");
        assert_eq!(refresh_token, "r1");
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(TokenPair {
            access_token: "t-custom".to_string(),
            refresh_token: Some("r-custom".to_string()),
        })
    }
}

#[tokio::test]
async fn test_custom_refresh_endpoint_is_called_once() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::with_credentials(logged_in("t1")));
    let endpoint = Arc::new(CountingEndpoint {
        calls: AtomicUsize::new(0),
    });

    let client = ApiClient::builder(format!("{}/v1/api", server.uri()), store.clone())
        .refresh_endpoint(endpoint.clone())
        .navigator(Arc::new(RecordingNavigator::default()))
        .build()
        .unwrap();

    mount_projects(&server, "t1", ResponseTemplate::new(401)).await;
    mount_projects(
        &server,
        "t-custom",
        ResponseTemplate::new(200).set_body_json(envelope(json!([]))),
    )
    .await;

    let results = join_all((0..4).map(|_| projects::list_projects(&client))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.get(CredentialKey::RefreshToken).as_deref(), Some("r-custom"));
}

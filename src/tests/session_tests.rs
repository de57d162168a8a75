use crate::{
    FileTokenCache, SessionState, TokenStore, ZabbixError, ZabbixSession, ZabbixToken,
    core::infrastructure::token_cache::MockTokenStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    Match, Request,
    matchers::{body_partial_json, method, path},
};

const API_PATH: &str = "/zabbix/api_jsonrpc.php";

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "result": result, "id": 1}))
}

fn rpc_error(code: i64, message: &str, data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "error": {"code": code, "message": message, "data": data},
        "id": 1
    }))
}

fn host_of(mock_server: &MockServer) -> String {
    mock_server.address().to_string()
}

fn token(value: &str) -> ZabbixToken {
    ZabbixToken::new_unchecked(value.to_string())
}

/// Matches requests whose JSON body has an `auth` member.
struct CarriesAuth;

impl Match for CarriesAuth {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .map(|body| body.get("auth").is_some())
            .unwrap_or(false)
    }
}

/// Answers `apiinfo.version` the way Zabbix 2.4+ does: with the version when
/// called bare, with an error when the call carries `auth`.
async fn mount_version(mock_server: &MockServer, version: &str) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({"method": "apiinfo.version"})))
        .and(CarriesAuth)
        .respond_with(rpc_error(
            -32602,
            "Invalid params.",
            "The \"apiinfo.version\" method must be called without the \"auth\" parameter.",
        ))
        .with_priority(1)
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({"method": "apiinfo.version"})))
        .respond_with(rpc_result(json!(version)))
        .mount(mock_server)
        .await;
}

/// Answers `user.checkAuthentication` for `sessionid` with `response`.
async fn mount_session_check(mock_server: &MockServer, sessionid: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "method": "user.checkAuthentication",
            "params": {"sessionid": sessionid}
        })))
        .respond_with(response)
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn build_session(
    mock_server: &MockServer,
    token_cache: Arc<dyn TokenStore>,
) -> Result<ZabbixSession, ZabbixError> {
    ZabbixSession::builder()
        .host(host_of(mock_server))
        .http(true)
        .timeout(Duration::from_secs(5))
        .token_cache(token_cache)
        .build()
        .await
}

fn file_cache(dir: &TempDir) -> Arc<FileTokenCache> {
    Arc::new(FileTokenCache::new(dir.path().join("zabbix.cache")))
}

#[tokio::test]
async fn test_fresh_session_is_unauthenticated() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    let dir = TempDir::new().unwrap();

    let session = build_session(&mock_server, file_cache(&dir)).await.unwrap();

    assert_eq!(session.state().await, SessionState::Unauthenticated);
    assert!(session.auth_token().await.is_none());
    assert_eq!(session.api_version().to_string(), "6.0.23");
    assert_eq!(
        session.target().url().as_str(),
        format!("http://{}/zabbix", host_of(&mock_server))
    );
}

#[tokio::test]
async fn test_valid_cached_token_is_reused_without_login() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("unexpected")))
        .expect(0)
        .mount(&mock_server)
        .await;
    mount_session_check(
        &mock_server,
        "cached",
        rpc_result(json!({"userid": "1", "username": "Admin", "sessionid": "cached"})),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    cache.write(&host_of(&mock_server), &token("cached")).await.unwrap();

    let session = build_session(&mock_server, cache).await.unwrap();

    assert_eq!(session.state().await, SessionState::Authenticated);
    assert_eq!(session.auth_token().await, Some(token("cached")));
    assert_eq!(session.api_version().to_string(), "6.0.23");

    // Nothing sent while building the session carries `auth`.
    for request in mock_server.received_requests().await.unwrap() {
        assert!(!CarriesAuth.matches(&request));
    }
}

#[tokio::test]
async fn test_rejected_cached_token_degrades_to_unauthenticated() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    mount_session_check(
        &mock_server,
        "stale",
        rpc_error(-32602, "Invalid params.", "Session terminated, re-login, please."),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    let host = host_of(&mock_server);
    cache.write(&host, &token("stale")).await.unwrap();

    let session = build_session(&mock_server, cache.clone()).await.unwrap();

    assert_eq!(session.state().await, SessionState::Unauthenticated);
    assert!(session.auth_token().await.is_none());
    // The stale entry stays until the next login replaces it.
    assert_eq!(cache.get(&host).await, Some(token("stale")));
}

#[tokio::test]
async fn test_cached_token_check_failure_aborts_construction() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    mount_session_check(
        &mock_server,
        "cached",
        ResponseTemplate::new(502).set_body_string("Bad Gateway"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    cache.write(&host_of(&mock_server), &token("cached")).await.unwrap();

    let result = build_session(&mock_server, cache).await;
    assert!(matches!(result, Err(ZabbixError::Protocol { .. })));
}

#[tokio::test]
async fn test_unreachable_server_touches_no_cache() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut store = MockTokenStore::new();
    store.expect_get().never();
    store.expect_write().never();

    let result = ZabbixSession::builder()
        .host(address.to_string())
        .http(true)
        .timeout(Duration::from_secs(5))
        .token_cache(Arc::new(store))
        .build()
        .await;

    assert!(matches!(result, Err(ZabbixError::Transport(_))));
}

#[tokio::test]
async fn test_server_error_on_version_request_aborts_construction() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut store = MockTokenStore::new();
    store.expect_get().never();

    let result = build_session(&mock_server, Arc::new(store)).await;
    assert!(matches!(result, Err(ZabbixError::Protocol { code: None, .. })));
}

#[tokio::test]
async fn test_login_caches_issued_token() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "user.login",
            "params": {"username": "alice", "password": "correct-password"}
        })))
        .respond_with(rpc_result(json!("0424bd59b807674191e7d77572075f33")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    let session = build_session(&mock_server, cache.clone()).await.unwrap();

    session.login("alice", "correct-password").await.unwrap();

    let issued = token("0424bd59b807674191e7d77572075f33");
    assert_eq!(session.state().await, SessionState::Authenticated);
    assert_eq!(session.auth_token().await, Some(issued.clone()));
    assert_eq!(cache.get(&host_of(&mock_server)).await, Some(issued));
}

#[tokio::test]
async fn test_login_uses_legacy_field_on_old_servers() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "5.0.40").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "user.login",
            "params": {"user": "alice", "password": "correct-password"}
        })))
        .respond_with(rpc_result(json!("legacy-token")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = build_session(&mock_server, file_cache(&dir)).await.unwrap();

    session.login("alice", "correct-password").await.unwrap();
    assert_eq!(session.auth_token().await, Some(token("legacy-token")));
}

#[tokio::test]
async fn test_wrong_password_leaves_cache_untouched() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_error(
            -32500,
            "Application error.",
            "Incorrect user name or password or account is temporarily blocked.",
        ))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    cache.write("other.example.com", &token("other")).await.unwrap();
    let before = std::fs::read(cache.path()).unwrap();

    let session = build_session(&mock_server, cache.clone()).await.unwrap();
    let result = session.login("alice", "wrong-password").await;

    assert!(matches!(result, Err(ZabbixError::AuthRejected(_))));
    assert_eq!(session.state().await, SessionState::Unauthenticated);
    assert_eq!(std::fs::read(cache.path()).unwrap(), before);
}

#[tokio::test]
async fn test_wrong_password_never_writes_cache() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_error(
            -32500,
            "Application error.",
            "Login name or password is incorrect.",
        ))
        .mount(&mock_server)
        .await;

    let host = host_of(&mock_server);
    let mut store = MockTokenStore::new();
    store
        .expect_get()
        .withf(move |key| key == host)
        .times(1)
        .returning(|_| None);
    store.expect_write().never();

    let session = build_session(&mock_server, Arc::new(store)).await.unwrap();
    let result = session.login("alice", "wrong-password").await;
    assert!(matches!(result, Err(ZabbixError::AuthRejected(_))));
}

#[tokio::test]
async fn test_second_login_overwrites_cached_token() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("first-token")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("second-token")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let cache = file_cache(&dir);
    let session = build_session(&mock_server, cache.clone()).await.unwrap();

    session.login("alice", "correct-password").await.unwrap();
    session.login("alice", "correct-password").await.unwrap();

    assert_eq!(session.auth_token().await, Some(token("second-token")));
    assert_eq!(
        cache.get(&host_of(&mock_server)).await,
        Some(token("second-token"))
    );
}

#[tokio::test]
async fn test_cache_write_failure_keeps_session_authenticated() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("issued")))
        .mount(&mock_server)
        .await;

    let mut store = MockTokenStore::new();
    store.expect_get().returning(|_| None);
    store
        .expect_write()
        .times(1)
        .returning(|_, _| Err(ZabbixError::Cache("disk full".to_string())));

    let session = build_session(&mock_server, Arc::new(store)).await.unwrap();
    let result = session.login("alice", "correct-password").await;

    assert!(matches!(result, Err(ZabbixError::Cache(_))));
    assert!(session.is_authenticated().await);
}

#[tokio::test]
async fn test_calls_after_login_carry_token() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("issued")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "host.get", "auth": "issued"})))
        .respond_with(rpc_result(json!([{"hostid": "10084", "host": "Zabbix server"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = build_session(&mock_server, file_cache(&dir)).await.unwrap();
    session.login("alice", "correct-password").await.unwrap();

    let hosts: Value = session
        .call("host.get", json!({"output": ["hostid", "host"]}))
        .await
        .unwrap();
    assert_eq!(hosts[0]["host"], "Zabbix server");
}

#[tokio::test]
async fn test_invalid_credentials_are_refused_locally() {
    let mock_server = MockServer::start().await;
    mount_version(&mock_server, "6.0.23").await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "user.login"})))
        .respond_with(rpc_result(json!("unexpected")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let session = build_session(&mock_server, file_cache(&dir)).await.unwrap();

    assert!(matches!(
        session.login("", "secret").await,
        Err(ZabbixError::Validation(_))
    ));
    assert!(matches!(
        session.login("alice", "").await,
        Err(ZabbixError::Validation(_))
    ));
}

#[tokio::test]
async fn test_builder_validation() {
    let result = ZabbixSession::builder().build().await;
    assert!(matches!(result, Err(ZabbixError::Validation(_))));

    let result = ZabbixSession::builder()
        .host("not a host!")
        .build()
        .await;
    assert!(matches!(result, Err(ZabbixError::Validation(_))));
}

//! Internal HTTP client that speaks JSON-RPC to the Zabbix frontend and stamps
//! the current session token on the calls that accept one.

use crate::{
    ApiVersion, ServerTarget, TlsVerification, ZabbixError, ZabbixPassword, ZabbixResult,
    ZabbixToken, ZabbixUsername,
    auth::application::service::login_service::LoginService,
    core::infrastructure::rpc::{RpcRequest, RpcResponse},
};
use reqwest::{
    Certificate, Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";
const VERSION_METHOD: &str = "apiinfo.version";
const CHECK_AUTHENTICATION_METHOD: &str = "user.checkAuthentication";

/// Internal HTTP client that manages the session token and provides methods to
/// call the Zabbix API.
///
/// The client never retries: every failure is classified once and returned.
#[derive(Debug)]
pub struct ApiClient {
    http_client: Client,
    endpoint: String,
    token: Arc<RwLock<Option<ZabbixToken>>>,
    next_id: AtomicU64,
}

impl ApiClient {
    /// Creates a new `ApiClient`. No request is sent and the client starts
    /// without a token.
    ///
    /// # Errors
    /// Returns `ZabbixError::Transport` if the CA bundle cannot be loaded or the
    /// HTTP client cannot be built.
    pub async fn new(target: &ServerTarget) -> ZabbixResult<Self> {
        let mut builder = Client::builder().timeout(target.timeout());

        match target.verify() {
            TlsVerification::Default => {}
            TlsVerification::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsVerification::CustomAuthority(path) => {
                let pem = tokio::fs::read(path).await.map_err(|e| {
                    ZabbixError::Transport(format!(
                        "Cannot read CA bundle {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let certificate = Certificate::from_pem(&pem).map_err(|e| {
                    ZabbixError::Transport(format!(
                        "Invalid CA bundle {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                builder = builder.add_root_certificate(certificate);
            }
        }

        let http_client = builder
            .build()
            .map_err(|e| ZabbixError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: target.url().endpoint(),
            token: Arc::new(RwLock::new(None)),
            next_id: AtomicU64::new(1),
        })
    }

    /// Installs the token attached to subsequent calls.
    pub async fn set_token(&self, token: ZabbixToken) {
        let mut lock = self.token.write().await;
        *lock = Some(token);
    }

    /// Returns the token currently attached to calls, if any.
    pub async fn token(&self) -> Option<ZabbixToken> {
        self.token.read().await.clone()
    }

    /// Calls `apiinfo.version`. The server refuses this method when it carries
    /// `auth`, so it always goes out without a token.
    ///
    /// # Errors
    /// `Transport` when the server cannot be reached, `Protocol` for anything else.
    pub async fn api_version(&self) -> ZabbixResult<ApiVersion> {
        let raw: String = self
            .call_without_auth(VERSION_METHOD, serde_json::json!([]))
            .await?;
        ApiVersion::parse(&raw).map_err(|e| ZabbixError::Protocol {
            code: None,
            message: format!("Unparseable API version '{}': {}", raw, e),
        })
    }

    /// Asks the server whether `token` is still a live session with
    /// `user.checkAuthentication`. The token travels as a parameter, not as `auth`.
    ///
    /// # Errors
    /// `AuthRejected` when the session is unknown or expired, `Transport` or
    /// `Protocol` when the question could not be answered.
    pub async fn check_authentication(&self, token: &ZabbixToken) -> ZabbixResult<()> {
        let _user: serde_json::Value = self
            .call_without_auth(
                CHECK_AUTHENTICATION_METHOD,
                serde_json::json!({"sessionid": token.as_str()}),
            )
            .await?;
        Ok(())
    }

    /// Authenticates with `user.login` and installs the returned token.
    ///
    /// `version` selects the request shape the server understands.
    pub async fn login(
        &self,
        username: &ZabbixUsername,
        password: &ZabbixPassword,
        version: ApiVersion,
    ) -> ZabbixResult<ZabbixToken> {
        let service = LoginService::new();
        let token = service.execute(self, username, password, version).await?;
        self.set_token(token.clone()).await;
        Ok(token)
    }

    /// Performs a named call stamped with the current token.
    ///
    /// # Type Parameters
    /// - `P`: The params type (must implement `Serialize`).
    /// - `T`: The expected result type (must implement `DeserializeOwned`).
    pub async fn call<P, T>(&self, method: &str, params: P) -> ZabbixResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let token = self.token().await;
        self.execute_request(method, params, token.as_ref().map(ZabbixToken::as_str))
            .await
    }

    /// Performs a named call without any token, whatever is installed.
    pub(crate) async fn call_without_auth<P, T>(&self, method: &str, params: P) -> ZabbixResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        self.execute_request(method, params, None).await
    }

    /// Core request execution: serialize, send once, classify the outcome.
    async fn execute_request<P, T>(
        &self,
        method: &str,
        params: P,
        auth: Option<&str>,
    ) -> ZabbixResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id, auth);
        let body = serde_json::to_vec(&request).map_err(|e| ZabbixError::Protocol {
            code: None,
            message: format!("Cannot encode {} request: {}", method, e),
        })?;

        debug!(method, id, authenticated = auth.is_some(), "Sending API request");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ZabbixError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ZabbixError::AuthRejected(format!(
                "Server answered {} to {}",
                status, method
            )));
        }

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ZabbixError::Protocol {
                code: None,
                message: format!("HTTP {}: {}", status, error_text),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ZabbixError::Transport(format!("Reading response failed: {}", e)))?;

        let envelope: RpcResponse =
            serde_json::from_slice(&bytes).map_err(|e| ZabbixError::Protocol {
                code: None,
                message: format!("Failed to parse response: {}", e),
            })?;

        envelope.into_result()
    }
}

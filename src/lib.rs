mod auth;
mod core;
#[cfg(test)]
mod tests;

pub use crate::core::domain::error::{ValidationError, ZabbixError, ZabbixResult};
pub use crate::core::domain::model::{
    server_target::{Protocol, ServerTarget, TlsVerification},
    session_state::SessionState,
};
pub use crate::core::domain::value_object::{
    ApiVersion, ZabbixHost, ZabbixPassword, ZabbixToken, ZabbixUrl, ZabbixUsername,
};
pub use crate::core::infrastructure::token_cache::{FileTokenCache, TokenStore};
use crate::core::{
    domain::value_object::{validate_host, validate_password, validate_username},
    infrastructure::api_client::ApiClient,
};
use serde::{Serialize, de::DeserializeOwned};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-request timeout used when the builder is not given one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// An authenticated (or authenticatable) session against one Zabbix server
///
/// Building a session:
/// - Asks the server for `apiinfo.version`, failing fast if it is unreachable
/// - Looks up a cached token for the host and keeps it only if the server still accepts it
///
/// A fresh token is obtained with [`ZabbixSession::login`], which also stores it
/// in the token cache so the next process can skip the password prompt.
///
/// # Examples
///
/// ```no_run
/// use zabbixctl::{ZabbixResult, ZabbixSession};
///
/// #[tokio::main]
/// async fn main() -> ZabbixResult<()> {
///     let session = ZabbixSession::builder()
///         .host("zabbix.example.com")
///         .build()
///         .await?;
///
///     if !session.is_authenticated().await {
///         session.login("Admin", "zabbix").await?;
///     }
///     Ok(())
/// }
/// ```
pub struct ZabbixSession {
    target: ServerTarget,
    api_client: ApiClient,
    token_cache: Arc<dyn TokenStore>,
    api_version: ApiVersion,
}

/// Builder for ZabbixSession configuration
#[derive(Default)]
pub struct ZabbixSessionBuilder {
    host: Option<String>,
    http: bool,
    accept_invalid_certs: bool,
    ca_certificate: Option<PathBuf>,
    timeout: Option<Duration>,
    token_cache: Option<Arc<dyn TokenStore>>,
}

impl ZabbixSessionBuilder {
    /// Host (and optional port) of the Zabbix frontend, e.g. `zabbix.example.com`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Use plain `http` instead of `https`.
    pub fn http(mut self, http: bool) -> Self {
        self.http = http;
        self
    }

    /// Skip certificate verification. Ignored when a CA bundle is set.
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Trust the PEM certificate authority bundle at `path`.
    pub fn ca_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_certificate = Some(path.into());
        self
    }

    /// Per-request network timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Token cache to read from and write to. Defaults to [`FileTokenCache::default`].
    pub fn token_cache(mut self, token_cache: Arc<dyn TokenStore>) -> Self {
        self.token_cache = Some(token_cache);
        self
    }

    /// Validates the settings and connects; see [`ZabbixSession::connect`].
    pub async fn build(self) -> ZabbixResult<ZabbixSession> {
        let host = self.host.ok_or_else(|| ValidationError::Field {
            field: "host".to_string(),
            message: "Host is required".to_string(),
        })?;
        validate_host(&host)?;
        let host = ZabbixHost::new_unchecked(host);

        let protocol = if self.http {
            Protocol::Http
        } else {
            Protocol::Https
        };

        if self.accept_invalid_certs && self.ca_certificate.is_some() {
            warn!("Both a CA bundle and disabled verification were requested; using the CA bundle");
        }
        let verify = TlsVerification::resolve(self.accept_invalid_certs, self.ca_certificate);

        let target = ServerTarget::new(
            host,
            protocol,
            verify,
            self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        )?;

        let token_cache = self
            .token_cache
            .unwrap_or_else(|| Arc::new(FileTokenCache::default()));

        ZabbixSession::connect(target, token_cache).await
    }
}

impl ZabbixSession {
    /// Creates a new builder for ZabbixSession configuration
    pub fn builder() -> ZabbixSessionBuilder {
        ZabbixSessionBuilder::default()
    }

    /// Connects to `target` and restores a cached token if it is still valid.
    ///
    /// The `apiinfo.version` request always goes out without a token; a cached
    /// token is then checked with `user.checkAuthentication`.
    ///
    /// # Errors
    ///
    /// Any failure of the version request aborts construction, as does a
    /// transport or protocol failure while checking a cached token. A cached
    /// token the server refuses is dropped and the session starts
    /// unauthenticated; the cache entry is left for the next login to replace.
    pub(crate) async fn connect(
        target: ServerTarget,
        token_cache: Arc<dyn TokenStore>,
    ) -> ZabbixResult<Self> {
        debug!(url = %target.url(), "Creating Zabbix session");

        let api_client = ApiClient::new(&target).await?;
        let api_version = api_client.api_version().await?;
        debug!(%api_version, "Server reachable");

        let host = target.host().as_str();
        if let Some(token) = token_cache.get(host).await {
            debug!(host, "Found cached token");

            match api_client.check_authentication(&token).await {
                Ok(()) => {
                    api_client.set_token(token).await;
                    info!(host, "Reusing cached session token");
                }
                Err(ZabbixError::AuthRejected(reason)) => {
                    warn!(host, %reason, "Cached token not authorized, continuing without it");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            target,
            api_client,
            token_cache,
            api_version,
        })
    }

    /// Authenticates with the Zabbix server
    ///
    /// This method:
    /// - Sends `user.login` with the given credentials
    /// - Installs the returned token for all further calls
    /// - Writes the token to the token cache under this session's host
    ///
    /// # Errors
    ///
    /// * `ZabbixError::AuthRejected` if the credentials are refused; the cache is untouched
    /// * `ZabbixError::Validation` if a credential is empty or malformed
    /// * `ZabbixError::Cache` if the token was issued but could not be cached;
    ///   the session is authenticated regardless
    /// * `ZabbixError::Transport` / `ZabbixError::Protocol` for network or server trouble
    pub async fn login(&self, username: &str, password: &str) -> ZabbixResult<()> {
        validate_username(username)?;
        validate_password(password)?;
        let username = ZabbixUsername::new_unchecked(username.to_string());
        let password = ZabbixPassword::new_unchecked(password.to_string());

        let token = self
            .api_client
            .login(&username, &password, self.api_version)
            .await?;

        let host = self.target.host().as_str();
        info!(host, user = username.as_str(), "Logged in");
        self.token_cache.write(host, &token).await
    }

    /// Returns the current authentication state
    pub async fn state(&self) -> SessionState {
        if self.api_client.token().await.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Returns true if the session holds a token
    pub async fn is_authenticated(&self) -> bool {
        self.state().await.is_authenticated()
    }

    /// Returns the current session token if authenticated
    pub async fn auth_token(&self) -> Option<ZabbixToken> {
        self.api_client.token().await
    }

    /// API version reported by the server when the session was built
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    pub fn target(&self) -> &ServerTarget {
        &self.target
    }

    /// Performs any API call, stamped with the session token if there is one.
    pub async fn call<P, T>(&self, method: &str, params: P) -> ZabbixResult<T>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        self.api_client.call(method, params).await
    }
}

use crate::core::domain::{
    error::{ValidationError, ZabbixResult},
    model::server_target::Protocol,
    value_object::zabbix_host::ZabbixHost,
};

/// Fixed path segment the Zabbix frontend is served under.
pub(crate) const FRONTEND_PATH: &str = "zabbix";

/// JSON-RPC entry point, relative to the frontend base URL.
pub(crate) const API_ENDPOINT: &str = "api_jsonrpc.php";

const MAX_URL_LENGTH: usize = 2083;

/// A validated Zabbix frontend base URL (`{protocol}://{host}/zabbix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZabbixUrl(String);

impl ZabbixUrl {
    /// Builds and validates the base URL for a host.
    pub fn new(host: &ZabbixHost, protocol: Protocol) -> ZabbixResult<Self> {
        let url = format!("{}://{}/{}", protocol.scheme(), host.as_str(), FRONTEND_PATH);
        validate_url(&url)?;
        Ok(Self(url))
    }

    /// Returns the base URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the absolute URL of the JSON-RPC endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.0.trim_end_matches('/'), API_ENDPOINT)
    }
}

impl std::fmt::Display for ZabbixUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validates a base URL against RFC 3986 and the supported schemes.
pub(crate) fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL cannot be empty".to_string(),
        });
    }

    if url.len() > MAX_URL_LENGTH {
        return Err(ValidationError::Format(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }

    let parsed = url::Url::parse(url)
        .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::ConstraintViolation(format!(
            "Invalid scheme '{}'. Must be one of: http, https",
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL must contain a host".to_string(),
        });
    }

    Ok(())
}

//! JSON-RPC 2.0 envelope as spoken by the Zabbix frontend.

use crate::core::domain::error::ZabbixError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Error codes the frontend uses when it refuses a session or a login.
const AUTH_FAILURE_CODES: [i64; 2] = [-32602, -32500];

/// `data` details that accompany an authorization failure. Zabbix has no
/// dedicated error code for these, so the detail field of the structured
/// error is the narrowest contract available.
const AUTH_FAILURE_DETAILS: [&str; 8] = [
    "not authorised",
    "not authorized",
    "session terminated",
    "login name or password is incorrect",
    "incorrect user name or password",
    "no permissions to call",
    "no permissions for system access",
    "account is blocked",
];

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<&'a str>,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub fn new(method: &'a str, params: P, id: u64, auth: Option<&'a str>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
            auth,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

/// Structured error object of a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RpcErrorBody {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl RpcErrorBody {
    pub fn is_authorization_failure(&self) -> bool {
        if !AUTH_FAILURE_CODES.contains(&self.code) {
            return false;
        }
        let Some(data) = self.data.as_deref() else {
            return false;
        };
        let data = data.to_ascii_lowercase();
        AUTH_FAILURE_DETAILS
            .iter()
            .any(|detail| data.starts_with(detail))
    }

    pub fn describe(&self) -> String {
        match self.data.as_deref() {
            Some(data) if !data.is_empty() => format!("{} {}", self.message, data),
            _ => self.message.clone(),
        }
    }
}

impl From<RpcErrorBody> for ZabbixError {
    fn from(body: RpcErrorBody) -> Self {
        if body.is_authorization_failure() {
            ZabbixError::AuthRejected(body.describe())
        } else {
            ZabbixError::Protocol {
                code: Some(body.code),
                message: body.describe(),
            }
        }
    }
}

impl RpcResponse {
    /// Turns the envelope into the call's typed result or a classified error.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, ZabbixError> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        let result = self.result.ok_or_else(|| ZabbixError::Protocol {
            code: None,
            message: "Response carries neither a result nor an error".to_string(),
        })?;
        serde_json::from_value(result).map_err(|e| ZabbixError::Protocol {
            code: None,
            message: format!("Unexpected result shape: {}", e),
        })
    }
}

use crate::core::domain::error::ValidationError;

/// A Zabbix API session token.
///
/// The token is opaque: it is stored and replayed verbatim, and only checked
/// for being something that can travel in a JSON string without surprises.
#[derive(Clone, PartialEq, Eq)]
pub struct ZabbixToken(String);

impl ZabbixToken {
    /// Creates a new token without validation.
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self(value)
    }

    /// Returns the token value as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer credentials; keep them out of logs and panics.
impl std::fmt::Debug for ZabbixToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ZabbixToken(***)")
    }
}

/// Validates the format of a token string.
pub(crate) fn validate_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::Field {
            field: "token".to_string(),
            message: "Token cannot be empty".to_string(),
        });
    }
    if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::Format(
            "Token cannot contain whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}

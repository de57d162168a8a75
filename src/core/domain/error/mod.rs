use thiserror::Error;

/// The main error type for Zabbix session operations.
///
/// The variants split failures by how a caller should react to them:
/// `AuthRejected` can be recovered from by asking for new credentials,
/// everything else is fatal to the operation that produced it.
#[derive(Error, Debug)]
pub enum ZabbixError {
    /// The request never produced a response (DNS, TCP, TLS or timeout)
    ///
    /// # Fields
    /// * `0` - A description of what went wrong on the wire
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server refused the session token or the supplied credentials
    ///
    /// # Fields
    /// * `0` - The server's explanation, when it gave one
    #[error("Authorization rejected: {0}")]
    AuthRejected(String),

    /// The server answered, but not with something this client can use
    ///
    /// # Fields
    /// * `code` - JSON-RPC error code if the server sent a structured error
    /// * `message` - The server message, or a description of the malformed response
    #[error("Protocol error{}: {message}", .code.map(|c| format!(" ({c})")).unwrap_or_default())]
    Protocol { code: Option<i64>, message: String },

    /// Represents validation failures of user-supplied values
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The token cache could not be updated
    #[error("Token cache error: {0}")]
    Cache(String),
}

impl ZabbixError {
    /// Returns `true` when prompting for new credentials could fix the failure.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, ZabbixError::AuthRejected(_))
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a ZabbixError
pub type ZabbixResult<T> = Result<T, ZabbixError>;

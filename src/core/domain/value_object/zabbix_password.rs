use crate::core::domain::error::ValidationError;

/// A Zabbix password (plaintext, only held for the duration of a login).
#[derive(Clone)]
pub struct ZabbixPassword(String);

impl ZabbixPassword {
    /// Creates a new password without validation.
    pub(crate) fn new_unchecked(password: String) -> Self {
        Self(password)
    }

    /// Returns the password as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ZabbixPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ZabbixPassword(***)")
    }
}

/// Validates a password. Strength is the server's business; only an empty
/// or oversized value is refused before it goes on the wire.
pub(crate) fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Field {
            field: "password".to_string(),
            message: "Password cannot be empty".to_string(),
        });
    }
    if password.len() > 4096 {
        return Err(ValidationError::Format(
            "Password cannot exceed 4096 bytes".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("zabbix").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(4097)).is_err());
    }

    #[test]
    fn test_debug_hides_value() {
        let password = ZabbixPassword::new_unchecked("hunter2".to_string());
        assert!(!format!("{:?}", password).contains("hunter2"));
    }
}

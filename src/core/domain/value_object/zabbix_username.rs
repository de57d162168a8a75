use crate::core::domain::error::ValidationError;

/// A validated Zabbix username.
#[derive(Debug, Clone)]
pub struct ZabbixUsername(String);

impl ZabbixUsername {
    /// Creates a new username without validation.
    pub(crate) fn new_unchecked(username: String) -> Self {
        Self(username)
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates a username. Zabbix aliases are free-form, so only the length and
/// control characters are checked.
pub(crate) fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Field {
            field: "username".to_string(),
            message: "Username cannot be empty".to_string(),
        });
    }
    if username.chars().count() > 255 {
        return Err(ValidationError::Format(format!(
            "Username cannot exceed 255 characters (got {})",
            username.chars().count()
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(ValidationError::Format(
            "Username cannot contain control characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("Admin").is_ok());
        assert!(validate_username("john.doe@example.com").is_ok());
        assert!(validate_username("jürgen müller").is_ok());
    }

    #[test]
    fn test_validate_username_invalid() {
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(256)).is_err());
        assert!(validate_username("user\tname").is_err());
    }
}

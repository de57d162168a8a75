use crate::core::domain::error::ValidationError;
use std::fmt;

/// Version reported by `apiinfo.version`, e.g. `6.0.23`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ApiVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses the dotted version string returned by the server.
    ///
    /// Missing trailing components default to zero, and a pre-release suffix
    /// on the last component (`7.0.0alpha3`) is ignored.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ValidationError::Field {
                field: "version".to_string(),
                message: "Version cannot be empty".to_string(),
            });
        }

        let mut parts = [0u32; 3];
        let components: Vec<&str> = value.split('.').collect();
        if components.len() > 3 {
            return Err(ValidationError::Format(format!(
                "Version '{}' has more than three components",
                value
            )));
        }

        for (slot, component) in parts.iter_mut().zip(&components) {
            let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
            *slot = digits.parse().map_err(|_| {
                ValidationError::Format(format!("Invalid version component in '{}'", value))
            })?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Returns the parameter name `user.login` expects for the account name.
    ///
    /// Zabbix 5.4 renamed `user` to `username` and 6.4 dropped the old name.
    pub fn login_user_field(&self) -> &'static str {
        if *self >= Self::new(5, 4, 0) {
            "username"
        } else {
            "user"
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

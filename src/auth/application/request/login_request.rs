use serde::ser::{Serialize, SerializeMap, Serializer};

/// Params of `user.login`.
///
/// The account name is sent under `user_field`, which depends on the server
/// version (see `ApiVersion::login_user_field`).
pub struct LoginRequest<'a> {
    pub user_field: &'static str,
    pub username: &'a str,
    pub password: &'a str,
}

impl Serialize for LoginRequest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.user_field, self.username)?;
        map.serialize_entry("password", self.password)?;
        map.end()
    }
}

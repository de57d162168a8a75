use serde::Deserialize;

/// Result of `user.login`: a bare session id, or the user record carrying it
/// when the call was made with `userData`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Token(String),
    UserData { sessionid: String },
}

impl LoginResponse {
    pub fn into_token(self) -> String {
        match self {
            LoginResponse::Token(token) => token,
            LoginResponse::UserData { sessionid } => sessionid,
        }
    }
}

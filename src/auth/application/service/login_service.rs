use crate::{
    ApiVersion, ZabbixError, ZabbixPassword, ZabbixResult, ZabbixToken, ZabbixUsername,
    auth::application::{
        request::login_request::LoginRequest, response::login_response::LoginResponse,
    },
    core::{domain::value_object::validate_token, infrastructure::api_client::ApiClient},
};
use tracing::debug;

const LOGIN_METHOD: &str = "user.login";

/// Exchanges credentials for a session token.
pub struct LoginService;

impl LoginService {
    pub fn new() -> Self {
        Self
    }

    /// Calls `user.login` without any token attached.
    ///
    /// Refused credentials come back as `AuthRejected`; any other server error
    /// keeps its `Protocol` code.
    pub async fn execute(
        &self,
        client: &ApiClient,
        username: &ZabbixUsername,
        password: &ZabbixPassword,
        version: ApiVersion,
    ) -> ZabbixResult<ZabbixToken> {
        let request = self.build_login_request(username, password, version);
        debug!(user = username.as_str(), %version, "Logging in");

        let response: LoginResponse = client.call_without_auth(LOGIN_METHOD, request).await?;

        self.handle_successful_login(response)
    }

    fn build_login_request<'a>(
        &self,
        username: &'a ZabbixUsername,
        password: &'a ZabbixPassword,
        version: ApiVersion,
    ) -> LoginRequest<'a> {
        LoginRequest {
            user_field: version.login_user_field(),
            username: username.as_str(),
            password: password.as_str(),
        }
    }

    fn handle_successful_login(&self, response: LoginResponse) -> ZabbixResult<ZabbixToken> {
        let token = response.into_token();
        validate_token(&token).map_err(|e| ZabbixError::Protocol {
            code: None,
            message: format!("Server issued an unusable token: {}", e),
        })?;
        Ok(ZabbixToken::new_unchecked(token))
    }
}

impl Default for LoginService {
    fn default() -> Self {
        Self::new()
    }
}

mod api_version;
pub(crate) mod serde_helpers;
mod zabbix_host;
mod zabbix_password;
mod zabbix_token;
mod zabbix_url;
mod zabbix_username;

pub use api_version::ApiVersion;
pub use zabbix_host::ZabbixHost;
pub use zabbix_password::ZabbixPassword;
pub use zabbix_token::ZabbixToken;
pub use zabbix_url::ZabbixUrl;
pub use zabbix_username::ZabbixUsername;

// Re-export validation functions for internal use
pub(crate) use zabbix_host::validate_host;
pub(crate) use zabbix_password::validate_password;
pub(crate) use zabbix_token::validate_token;
pub(crate) use zabbix_username::validate_username;

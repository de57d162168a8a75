use crate::core::domain::{
    error::ZabbixResult,
    value_object::{ZabbixHost, ZabbixUrl},
};
use std::path::PathBuf;
use std::time::Duration;

/// Transport scheme used to reach the Zabbix frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

/// How server certificates are verified on `https` connections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TlsVerification {
    /// System trust store
    #[default]
    Default,
    /// Accept any certificate
    Disabled,
    /// Trust the PEM bundle at this path in addition to the system store
    CustomAuthority(PathBuf),
}

impl TlsVerification {
    /// Resolves the two independent CLI-style knobs into one mode.
    ///
    /// A custom authority wins over `no_verify` when both are given.
    pub fn resolve(no_verify: bool, ca_certificate: Option<PathBuf>) -> Self {
        match (ca_certificate, no_verify) {
            (Some(path), _) => TlsVerification::CustomAuthority(path),
            (None, true) => TlsVerification::Disabled,
            (None, false) => TlsVerification::Default,
        }
    }
}

/// Everything needed to reach one Zabbix server. Immutable once built.
#[derive(Debug, Clone)]
pub struct ServerTarget {
    host: ZabbixHost,
    verify: TlsVerification,
    timeout: Duration,
    url: ZabbixUrl,
}

impl ServerTarget {
    pub(crate) fn new(
        host: ZabbixHost,
        protocol: Protocol,
        verify: TlsVerification,
        timeout: Duration,
    ) -> ZabbixResult<Self> {
        let url = ZabbixUrl::new(&host, protocol)?;
        Ok(Self {
            host,
            verify,
            timeout,
            url,
        })
    }

    pub fn host(&self) -> &ZabbixHost {
        &self.host
    }
    pub fn verify(&self) -> &TlsVerification {
        &self.verify
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self) -> &ZabbixUrl {
        &self.url
    }
}

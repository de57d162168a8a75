use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "zabbixctl",
    version,
    about = "Log in to a Zabbix server and cache the session token"
)]
pub struct Cli {
    /// Zabbix frontend host, optionally with a port (zabbix.example.com[:8443])
    pub host: String,

    /// Use plain http instead of https
    #[arg(long)]
    pub http: bool,

    /// Do not verify the server certificate (ignored when --cacert is given)
    #[arg(long)]
    pub no_verify: bool,

    /// PEM bundle of the certificate authority to trust
    #[arg(long, value_name = "PATH")]
    pub cacert: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECS")]
    pub timeout: u64,

    /// Token cache file (defaults to zabbix.cache in the temp directory)
    #[arg(long, env = "ZABBIXCTL_CACHE", value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Account to log in with (defaults to the current OS user)
    #[arg(short, long, env = "ZABBIX_USER")]
    pub username: Option<String>,

    /// Log in even when the cached token is still valid
    #[arg(long)]
    pub force_login: bool,

    /// Log filter (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

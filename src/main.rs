mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Cli;
use dialoguer::{Input, Password};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use zabbixctl::{FileTokenCache, ZabbixSession};

const MAX_LOGIN_ATTEMPTS: usize = 3;

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit flag or env, then the OS account, then ask.
fn resolve_username(explicit: Option<String>) -> Result<String> {
    if let Some(username) = explicit {
        return Ok(username);
    }
    if let Some(username) = ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
    {
        return Ok(username);
    }
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    Ok(username)
}

fn prompt_password(username: &str, host: &str) -> Result<String> {
    let password = Password::new()
        .with_prompt(format!("Password for {}@{}", username, host))
        .allow_empty_password(true)
        .interact()?;
    Ok(password)
}

/// Asks for passwords until the server accepts one or attempts run out.
///
/// Only a refused password is worth another try. An empty answer uses up an
/// attempt without contacting the server; every other error is final.
async fn login_with_retries<F>(
    session: &ZabbixSession,
    username: &str,
    mut next_password: F,
) -> Result<()>
where
    F: FnMut() -> Result<String>,
{
    let host = session.target().host().to_string();
    let mut attempts_left = MAX_LOGIN_ATTEMPTS;

    loop {
        attempts_left -= 1;
        let password = next_password()?;

        if password.is_empty() {
            if attempts_left == 0 {
                bail!("No password given for {}@{}", username, host);
            }
            eprintln!("Password cannot be empty");
            continue;
        }

        match session.login(username, &password).await {
            Ok(()) => return Ok(()),
            Err(e) if e.is_auth_rejected() && attempts_left > 0 => eprintln!("{}", e),
            Err(e) => return Err(e).context(format!("Login to {} failed", host)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let cache_file = cli
        .cache_file
        .clone()
        .unwrap_or_else(FileTokenCache::default_path);
    debug!(path = %cache_file.display(), "Using token cache");

    let mut builder = ZabbixSession::builder()
        .host(cli.host.as_str())
        .http(cli.http)
        .accept_invalid_certs(cli.no_verify)
        .timeout(Duration::from_secs(cli.timeout))
        .token_cache(Arc::new(FileTokenCache::new(cache_file)));
    if let Some(cacert) = &cli.cacert {
        builder = builder.ca_certificate(cacert);
    }

    let session = builder
        .build()
        .await
        .with_context(|| format!("Cannot start a Zabbix session with {}", cli.host))?;

    if session.is_authenticated().await && !cli.force_login {
        println!(
            "Reusing cached session for {} (API {})",
            cli.host,
            session.api_version()
        );
        return Ok(());
    }

    let username = resolve_username(cli.username.clone())?;
    let host = session.target().host().to_string();
    login_with_retries(&session, &username, || prompt_password(&username, &host)).await?;

    println!(
        "Authenticated as {} on {} (API {})",
        username,
        cli.host,
        session.api_version()
    );
    Ok(())
}

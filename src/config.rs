use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::server::neterra::DEFAULT_BASE_URL;
use crate::server::session::{Credentials, DEFAULT_SESSION_TTL};

pub const DEFAULT_CHANNELS_FILE: &str = "./data/channels.json";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Parser)]
#[command(name = "neterra-proxy")]
#[command(about = "Relays a Neterra.tv account as an M3U playlist for IPTV players")]
#[command(version)]
pub struct CliArgs {
    /// Channels data file
    #[arg(short = 'c', long = "ch", default_value = DEFAULT_CHANNELS_FILE)]
    pub channels_file: PathBuf,

    /// Verbose
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    /// Host name written into generated playlist URLs.
    pub host: String,
    /// Port written into generated playlist URLs, also the listen port.
    pub port: String,
    pub listen_port: u16,
    pub channels_file: PathBuf,
    pub verbose: bool,
    pub base_url: String,
    pub session_ttl: Duration,
    pub upstream_timeout: Duration,
    pub strict_login: bool,
}

impl Config {
    /// Build from CLI flags and the process environment (after `.env`).
    pub fn load(args: CliArgs) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(args, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(args: CliArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let username = required("USERNAME")?;
        let password = required("PASSWORD")?;
        let host = required("HOST")?;
        let port = required("PORT")?;

        let listen_port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port.clone()))?;

        let secs = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            match lookup(var).filter(|v| !v.trim().is_empty()) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
                None => Ok(default),
            }
        };

        let session_ttl = secs("SESSION_TTL_SECS", DEFAULT_SESSION_TTL)?;
        let upstream_timeout = secs("UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT)?;

        let base_url = lookup("NETERRA_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let strict_login = lookup("STRICT_LOGIN")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        Ok(Self {
            credentials: Credentials::new(username, password),
            host,
            port,
            listen_port,
            channels_file: args.channels_file,
            verbose: args.verbose,
            base_url,
            session_ttl,
            upstream_timeout,
            strict_login,
        })
    }
}

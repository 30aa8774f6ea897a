use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dyndns::spdyn::{DEFAULT_CHECKIP_URL, DEFAULT_UPDATE_URL};
use crate::remote::auth::DEFAULT_PROBE_TARGET;
use crate::shutdown::DEFAULT_POLL_INTERVAL;

const DEFAULT_KODI_URL: &str = "http://127.0.0.1:8080/jsonrpc";
const DEFAULT_NOTIFICATION_TITLE: &str = "IFTTT Remote";

/// Which request shape the gateway accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// `POST /ifttt/remote/{command}` with a JSON body
    #[default]
    Json,
    /// `GET /ifttt/remote/{command}?__authorization=...`
    Query,
}

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub bind: Option<IpAddr>,
    pub user_token: Option<String>,
    pub interface: Option<Interface>,
    pub identity: Option<IpAddr>,
    pub probe_target: Option<SocketAddr>,
    pub shutdown_host_on_exit: Option<bool>,
    pub poll_interval_secs: Option<u64>,
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub kodi: FileKodiConfig,
    #[serde(default)]
    pub dyndns: FileDynDnsConfig,
}

#[derive(Deserialize, Default, Debug)]
pub struct FileKodiConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notification_title: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
pub struct FileDynDnsConfig {
    pub hostname: Option<String>,
    pub token: Option<String>,
    pub interval_minutes: Option<u64>,
    pub check_every_minutes: Option<u64>,
    pub checkip_url: Option<String>,
    pub update_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct KodiConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notification_title: String,
}

#[derive(Debug, Clone)]
pub struct DynDnsConfig {
    pub hostname: String,
    pub token: String,
    /// Minimum time between two successful updates.
    pub interval: Duration,
    /// How often the background task re-checks the throttle.
    pub check_every: Duration,
    pub checkip_url: String,
    pub update_url: String,
}

/// Immutable runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind: IpAddr,
    pub user_token: String,
    pub interface: Interface,
    pub identity: Option<IpAddr>,
    pub probe_target: SocketAddr,
    pub shutdown_host_on_exit: bool,
    pub poll_interval: Duration,
    pub state_file: Option<PathBuf>,
    pub kodi: KodiConfig,
    pub dyndns: DynDnsConfig,
}

// Empty strings count as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required<T>(value: Option<T>, key: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(key))
}

impl Config {
    /// Merge CLI arguments over the file config over defaults. Fails when a
    /// setting without a default is absent everywhere.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let kodi = file.kodi;
        let dyndns = file.dyndns;

        let port = required(args.port.or(file.port), "port")?;
        let user_token = required(non_empty(file.user_token), "user_token")?;
        let hostname = required(non_empty(dyndns.hostname), "dyndns.hostname")?;
        let token = required(non_empty(dyndns.token), "dyndns.token")?;
        let interval_minutes = required(dyndns.interval_minutes, "dyndns.interval_minutes")?;
        let check_every_minutes = dyndns
            .check_every_minutes
            .unwrap_or(interval_minutes)
            .max(1);
        let probe_target = match file.probe_target {
            Some(target) => target,
            None => DEFAULT_PROBE_TARGET
                .parse()
                .map_err(|_| ConfigError::Invalid("probe_target"))?,
        };
        let poll_interval = file
            .poll_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        Ok(Config {
            port,
            bind: file.bind.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            user_token,
            interface: args.interface.or(file.interface).unwrap_or_default(),
            identity: args.identity.or(file.identity),
            probe_target,
            shutdown_host_on_exit: !args.no_host_shutdown
                && file.shutdown_host_on_exit.unwrap_or(true),
            poll_interval,
            state_file: args.state_file.clone().or(file.state_file),
            kodi: KodiConfig {
                url: non_empty(args.kodi_url.clone())
                    .or(non_empty(kodi.url))
                    .unwrap_or_else(|| DEFAULT_KODI_URL.to_string()),
                username: non_empty(kodi.username),
                password: kodi.password,
                notification_title: non_empty(kodi.notification_title)
                    .unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
            },
            dyndns: DynDnsConfig {
                hostname,
                token,
                interval: Duration::from_secs(interval_minutes.saturating_mul(60)),
                check_every: Duration::from_secs(check_every_minutes.saturating_mul(60)),
                checkip_url: non_empty(dyndns.checkip_url)
                    .unwrap_or_else(|| DEFAULT_CHECKIP_URL.to_string()),
                update_url: non_empty(dyndns.update_url)
                    .unwrap_or_else(|| DEFAULT_UPDATE_URL.to_string()),
            },
        })
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("ifttt-remote.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("ifttt-remote").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting: {0}")]
    Invalid(&'static str),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::Interface;

#[derive(Parser, Debug, Default)]
#[command(
    name = "ifttt-remote",
    about = "IFTTT webhook remote for Kodi, with a throttled SPDYN address update",
    long_about = None,
    version = env!("GIT_VERSION"),
)]
pub struct Args {
    /// HTTP port the webhook endpoint listens on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to TOML config file (overrides default search: ./ifttt-remote.toml, ~/.config/ifttt-remote/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Request shape to accept [default: json]
    #[arg(long, value_enum)]
    pub interface: Option<Interface>,

    /// Address tokens must name, instead of probing the outbound interface
    #[arg(long, value_name = "IP")]
    pub identity: Option<IpAddr>,

    /// Kodi JSON-RPC endpoint [default: http://127.0.0.1:8080/jsonrpc]
    #[arg(long, value_name = "URL")]
    pub kodi_url: Option<String>,

    /// Where the last address update time is persisted [default: ~/.config/ifttt-remote/state.json]
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Do not power off the host after an `exit` command
    #[arg(long)]
    pub no_host_shutdown: bool,
}

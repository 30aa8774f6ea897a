//! Dynamic-DNS refresh: a persisted minimum-interval throttle in front of the
//! provider's public-IP lookup and `nic/update` call.

pub mod spdyn;
pub mod throttle;

use async_trait::async_trait;

use crate::settings::SettingsError;

#[derive(Debug, thiserror::Error)]
pub enum DynDnsError {
    #[error("dns provider request failed")]
    Http(#[from] reqwest::Error),
    #[error("invalid IP address update response: {0}")]
    UpdateRejected(String),
    #[error("failed to record update time")]
    Settings(#[from] SettingsError),
    #[error("settings writer stopped unexpectedly")]
    Writer(#[from] tokio::task::JoinError),
}

/// The two provider calls the throttle needs.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// This host's public address as the provider sees it.
    async fn public_ip(&self) -> Result<String, DynDnsError>;
    /// Point the record at `ip`; returns the raw response body.
    async fn update(&self, ip: &str) -> Result<String, DynDnsError>;
}

/// Accept only `good <ip>` or `nochg <ip>`, ignoring trailing line breaks.
pub fn check_update_response(body: &str, ip: &str) -> Result<(), DynDnsError> {
    let body = body.trim_end_matches(['\r', '\n']);
    if body == format!("good {ip}") || body == format!("nochg {ip}") {
        Ok(())
    } else {
        Err(DynDnsError::UpdateRejected(body.to_string()))
    }
}

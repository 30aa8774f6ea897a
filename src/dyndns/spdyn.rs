use async_trait::async_trait;
use reqwest::Client;

use crate::config::DynDnsConfig;
use crate::dyndns::{DnsProvider, DynDnsError};

pub const DEFAULT_CHECKIP_URL: &str = "http://checkip4.spdns.de/";
pub const DEFAULT_UPDATE_URL: &str = "https://update.spdyn.de/nic/update";

/// SPDYN provider: plain-text IP echo plus a dyndns2-style update endpoint
/// authenticated with the host name and its update token.
pub struct SpdynClient {
    client: Client,
    checkip_url: String,
    update_url: String,
    hostname: String,
    token: String,
}

impl SpdynClient {
    pub fn new(client: Client, config: &DynDnsConfig) -> Self {
        Self {
            client,
            checkip_url: config.checkip_url.clone(),
            update_url: config.update_url.clone(),
            hostname: config.hostname.clone(),
            token: config.token.clone(),
        }
    }
}

#[async_trait]
impl DnsProvider for SpdynClient {
    async fn public_ip(&self) -> Result<String, DynDnsError> {
        let body = self
            .client
            .get(&self.checkip_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body.trim().to_string())
    }

    async fn update(&self, ip: &str) -> Result<String, DynDnsError> {
        // The body carries the verdict (badauth, nohost, ...) even on error statuses.
        let body = self
            .client
            .get(&self.update_url)
            .query(&[("hostname", self.hostname.as_str()), ("myip", ip)])
            .basic_auth(&self.hostname, Some(&self.token))
            .send()
            .await?
            .text()
            .await?;
        Ok(body)
    }
}

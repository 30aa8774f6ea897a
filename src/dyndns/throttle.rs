use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::dyndns::{check_update_response, DnsProvider, DynDnsError};
use crate::settings::SettingsStore;

/// Settings key holding the last successful update time.
pub const LAST_UPDATE_KEY: &str = "prev_ip_update";
/// Second precision, no timezone.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT).ok()
}

/// Local wall-clock time truncated to whole seconds.
pub fn current_time() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The last update is too recent; no network call was made.
    Skipped { last_update: NaiveDateTime },
    /// The provider accepted the address.
    Updated { ip: String },
}

pub struct UpdateThrottle {
    interval: Duration,
    settings: Arc<dyn SettingsStore>,
    provider: Arc<dyn DnsProvider>,
    // serializes check-then-act within this process
    guard: Mutex<()>,
}

impl UpdateThrottle {
    pub fn new(
        interval: Duration,
        settings: Arc<dyn SettingsStore>,
        provider: Arc<dyn DnsProvider>,
    ) -> Self {
        Self {
            interval,
            settings,
            provider,
            guard: Mutex::new(()),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stored last-update time. Unparseable values are logged and ignored.
    pub fn last_update(&self) -> Option<NaiveDateTime> {
        let text = self.settings.get(LAST_UPDATE_KEY)?;
        let parsed = parse_time(&text);
        if parsed.is_none() {
            tracing::warn!("Ignoring malformed {} value {:?}", LAST_UPDATE_KEY, text);
        }
        parsed
    }

    pub async fn run(&self) -> Result<UpdateOutcome, DynDnsError> {
        self.run_at(current_time()).await
    }

    /// Update the record unless the previous success is less than one
    /// interval before `now`.
    pub async fn run_at(&self, now: NaiveDateTime) -> Result<UpdateOutcome, DynDnsError> {
        let _guard = self.guard.lock().await;

        if let Some(last_update) = self.last_update() {
            // a timestamp in the future counts as recent
            let recent = match (now - last_update).to_std() {
                Ok(elapsed) => elapsed < self.interval,
                Err(_) => true,
            };
            if recent {
                tracing::info!("Not updating the IP address this time (last update {})", last_update);
                return Ok(UpdateOutcome::Skipped { last_update });
            }
        }

        tracing::info!("Updating the IP address");
        let ip = self.provider.public_ip().await?;
        let response = self.provider.update(&ip).await?;
        if let Err(e) = check_update_response(&response, &ip) {
            tracing::error!("{}", e);
            return Err(e);
        }
        tracing::info!("Successfully updated the IP address to {}", ip);

        let settings = Arc::clone(&self.settings);
        let stamp = format_time(now);
        tokio::task::spawn_blocking(move || settings.set(LAST_UPDATE_KEY, &stamp)).await??;
        Ok(UpdateOutcome::Updated { ip })
    }
}

/// Log an update attempt. Failures are never fatal.
pub fn log_outcome(result: &Result<UpdateOutcome, DynDnsError>) {
    match result {
        Ok(UpdateOutcome::Updated { ip }) => tracing::debug!("dyndns record now {}", ip),
        Ok(UpdateOutcome::Skipped { .. }) => {}
        Err(e) => tracing::warn!("Dynamic DNS update failed: {}", e),
    }
}

/// Re-run the throttle every `every` until `cancel` fires. The first run is
/// expected to have happened at startup, so this waits one period first.
pub async fn run_periodically(
    throttle: Arc<UpdateThrottle>,
    every: Duration,
    cancel: CancellationToken,
) {
    let start = tokio::time::Instant::now() + every;
    let mut ticker = tokio::time::interval_at(start, every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => log_outcome(&throttle.run().await),
        }
    }
    tracing::debug!("dyndns refresh stopped");
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use ifttt_remote::dyndns::throttle::{
    format_time, parse_time, UpdateOutcome, UpdateThrottle, LAST_UPDATE_KEY,
};
use ifttt_remote::dyndns::{check_update_response, DnsProvider, DynDnsError};
use ifttt_remote::settings::{FileSettings, SettingsError, SettingsStore};

#[derive(Default)]
struct MemorySettings(Mutex<HashMap<String, String>>);

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.0.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.0.lock().unwrap().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

struct FakeProvider {
    ip: String,
    response: String,
    lookups: AtomicUsize,
    updates: AtomicUsize,
}

impl FakeProvider {
    fn answering(response: &str) -> Self {
        Self {
            ip: "1.2.3.4".to_string(),
            response: response.to_string(),
            lookups: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    async fn public_ip(&self) -> Result<String, DynDnsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip.clone())
    }

    async fn update(&self, _ip: &str) -> Result<String, DynDnsError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

const T0: &str = "2024-03-01 12:00:00";
const THIRTY_MINUTES: Duration = Duration::from_secs(30 * 60);

fn at(offset_minutes: i64) -> NaiveDateTime {
    parse_time(T0).unwrap() + chrono::TimeDelta::try_minutes(offset_minutes).unwrap()
}

fn throttle_with(
    last_update: Option<&str>,
    provider: Arc<FakeProvider>,
) -> (UpdateThrottle, Arc<MemorySettings>) {
    let settings = Arc::new(MemorySettings::default());
    if let Some(text) = last_update {
        settings.set(LAST_UPDATE_KEY, text).unwrap();
    }
    let throttle = UpdateThrottle::new(THIRTY_MINUTES, settings.clone(), provider);
    (throttle, settings)
}

#[tokio::test]
async fn recent_update_skips_network() {
    let provider = Arc::new(FakeProvider::answering("good 1.2.3.4"));
    let (throttle, _) = throttle_with(Some(T0), provider.clone());

    let outcome = throttle.run_at(at(10)).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::Skipped { last_update: at(0) });
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn stale_update_calls_provider_and_records_time() {
    let provider = Arc::new(FakeProvider::answering("good 1.2.3.4"));
    let (throttle, settings) = throttle_with(Some(T0), provider.clone());

    let outcome = throttle.run_at(at(31)).await.unwrap();

    assert_eq!(outcome, UpdateOutcome::Updated { ip: "1.2.3.4".to_string() });
    assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
    assert_eq!(settings.get(LAST_UPDATE_KEY).as_deref(), Some("2024-03-01 12:31:00"));
}

#[tokio::test]
async fn exactly_one_interval_later_is_due() {
    let provider = Arc::new(FakeProvider::answering("nochg 1.2.3.4"));
    let (throttle, _) = throttle_with(Some(T0), provider.clone());
    assert!(matches!(throttle.run_at(at(30)).await.unwrap(), UpdateOutcome::Updated { .. }));
}

#[tokio::test]
async fn first_run_always_updates() {
    let provider = Arc::new(FakeProvider::answering("nochg 1.2.3.4\r\n"));
    let (throttle, settings) = throttle_with(None, provider.clone());

    throttle.run_at(at(0)).await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(settings.get(LAST_UPDATE_KEY).as_deref(), Some(T0));
}

#[tokio::test]
async fn rejected_response_is_error_and_not_recorded() {
    let provider = Arc::new(FakeProvider::answering("badauth"));
    let (throttle, settings) = throttle_with(None, provider);

    let err = throttle.run_at(at(0)).await.unwrap_err();

    assert!(matches!(err, DynDnsError::UpdateRejected(ref body) if body == "badauth"));
    assert_eq!(settings.get(LAST_UPDATE_KEY), None);
}

#[tokio::test]
async fn malformed_timestamp_is_treated_as_absent() {
    let provider = Arc::new(FakeProvider::answering("good 1.2.3.4"));
    let (throttle, _) = throttle_with(Some("yesterday-ish"), provider.clone());
    assert_eq!(throttle.last_update(), None);
    throttle.run_at(at(0)).await.unwrap();
    assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_runs_update_once() {
    let provider = Arc::new(FakeProvider::answering("good 1.2.3.4"));
    let (throttle, _) = throttle_with(None, provider.clone());
    let throttle = Arc::new(throttle);

    let a = tokio::spawn({
        let throttle = throttle.clone();
        async move { throttle.run_at(at(0)).await }
    });
    let b = tokio::spawn({
        let throttle = throttle.clone();
        async move { throttle.run_at(at(0)).await }
    });
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
}

#[test]
fn update_response_must_name_the_requested_ip() {
    assert!(check_update_response("good 1.2.3.4", "1.2.3.4").is_ok());
    assert!(check_update_response("nochg 1.2.3.4\n", "1.2.3.4").is_ok());
    assert!(check_update_response("good 5.6.7.8", "1.2.3.4").is_err());
    assert!(check_update_response("nohost", "1.2.3.4").is_err());
    assert!(check_update_response("", "1.2.3.4").is_err());
}

#[test]
fn time_text_round_trips_at_second_precision() {
    let time = at(90);
    assert_eq!(format_time(time), "2024-03-01 13:30:00");
    assert_eq!(parse_time(&format_time(time)), Some(time));
}

#[tokio::test]
async fn successful_update_lands_in_the_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let provider = Arc::new(FakeProvider::answering("nochg 1.2.3.4"));
    let settings = Arc::new(FileSettings::open(&path).unwrap());
    let throttle = UpdateThrottle::new(THIRTY_MINUTES, settings, provider);

    throttle.run_at(at(0)).await.unwrap();

    let reopened = FileSettings::open(&path).unwrap();
    assert_eq!(reopened.get(LAST_UPDATE_KEY).as_deref(), Some(T0));
}

struct ReadOnlySettings;

impl SettingsStore for ReadOnlySettings {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), SettingsError> {
        Err(SettingsError::Io(std::io::Error::other("read-only file system")))
    }
}

#[tokio::test]
async fn failed_write_is_reported_after_a_good_update() {
    let provider = Arc::new(FakeProvider::answering("good 1.2.3.4"));
    let throttle = UpdateThrottle::new(THIRTY_MINUTES, Arc::new(ReadOnlySettings), provider.clone());

    let err = throttle.run_at(at(0)).await.unwrap_err();

    assert!(matches!(err, DynDnsError::Settings(_)));
    assert_eq!(provider.calls(), 2);
}

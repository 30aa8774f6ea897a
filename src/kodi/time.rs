use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kodi's `Global.Time` object, as used by `Player.GetProperties` and `Player.Seek`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KodiTime {
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub milliseconds: u64,
}

impl From<KodiTime> for Duration {
    fn from(t: KodiTime) -> Self {
        Duration::from_secs(t.hours * 3600 + t.minutes * 60 + t.seconds)
            + Duration::from_millis(t.milliseconds)
    }
}

impl From<Duration> for KodiTime {
    fn from(d: Duration) -> Self {
        let total = d.as_secs();
        KodiTime {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
            milliseconds: u64::from(d.subsec_millis()),
        }
    }
}

use std::time::Duration;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("player request failed")]
    Http(#[from] reqwest::Error),
    #[error("player returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("unexpected player response: {0}")]
    Protocol(String),
}

/// Subtitle selection accepted by `Player.SetSubtitle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleMode {
    Previous,
    Next,
    On,
    Off,
}

impl SubtitleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleMode::Previous => "previous",
            SubtitleMode::Next => "next",
            SubtitleMode::On => "on",
            SubtitleMode::Off => "off",
        }
    }
}

/// Audio stream selection accepted by `Player.SetAudioStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStreamMode {
    Previous,
    Next,
}

impl AudioStreamMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioStreamMode::Previous => "previous",
            AudioStreamMode::Next => "next",
        }
    }
}

/// Playback capability the remote drives. Queries never mutate the player;
/// only `seek`, `toggle_play_pause`, `stop` and the track selectors do.
#[async_trait]
pub trait Player: Send + Sync {
    async fn is_loaded(&self) -> Result<bool, PlayerError>;
    async fn is_playing(&self) -> Result<bool, PlayerError>;
    async fn is_paused(&self) -> Result<bool, PlayerError>;
    async fn position(&self) -> Result<Duration, PlayerError>;
    async fn total(&self) -> Result<Duration, PlayerError>;
    async fn seek(&self, position: Duration) -> Result<(), PlayerError>;
    /// Single play/pause toggle; pauses when playing, resumes when paused.
    async fn toggle_play_pause(&self) -> Result<(), PlayerError>;
    async fn stop(&self) -> Result<(), PlayerError>;
    async fn set_subtitle(&self, mode: SubtitleMode) -> Result<(), PlayerError>;
    async fn set_audio_stream(&self, mode: AudioStreamMode) -> Result<(), PlayerError>;
}

/// On-screen notification sink. Delivery is best-effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Host-level power control, used after an `exit` command.
#[async_trait]
pub trait HostControl: Send + Sync {
    async fn shutdown_host(&self) -> Result<(), PlayerError>;
}

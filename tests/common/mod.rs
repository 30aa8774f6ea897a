#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;

use ifttt_remote::player::{AudioStreamMode, Player, PlayerError, SubtitleMode};

/// Player mutations, in the order they were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Seek(Duration),
    TogglePlayPause,
    Stop,
    Subtitle(SubtitleMode),
    AudioStream(AudioStreamMode),
}

#[derive(Debug, Clone, Default)]
pub struct FakeState {
    pub loaded: bool,
    pub playing: bool,
    pub paused: bool,
    pub position: Duration,
    pub total: Duration,
}

#[derive(Default)]
pub struct FakePlayer {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<Call>>,
}

impl FakePlayer {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn playing(position: u64, total: u64) -> Self {
        Self::with_state(FakeState {
            loaded: true,
            playing: true,
            paused: false,
            position: Duration::from_secs(position),
            total: Duration::from_secs(total),
        })
    }

    pub fn paused(position: u64, total: u64) -> Self {
        Self::with_state(FakeState {
            loaded: true,
            playing: false,
            paused: true,
            position: Duration::from_secs(position),
            total: Duration::from_secs(total),
        })
    }

    pub fn with_state(state: FakeState) -> Self {
        Self {
            state: Mutex::new(state),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn state(&self) -> FakeState {
        self.state.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn is_loaded(&self) -> Result<bool, PlayerError> {
        Ok(self.state.lock().unwrap().loaded)
    }

    async fn is_playing(&self) -> Result<bool, PlayerError> {
        Ok(self.state.lock().unwrap().playing)
    }

    async fn is_paused(&self) -> Result<bool, PlayerError> {
        Ok(self.state.lock().unwrap().paused)
    }

    async fn position(&self) -> Result<Duration, PlayerError> {
        Ok(self.state.lock().unwrap().position)
    }

    async fn total(&self) -> Result<Duration, PlayerError> {
        Ok(self.state.lock().unwrap().total)
    }

    async fn seek(&self, position: Duration) -> Result<(), PlayerError> {
        self.state.lock().unwrap().position = position;
        self.record(Call::Seek(position));
        Ok(())
    }

    async fn toggle_play_pause(&self) -> Result<(), PlayerError> {
        {
            let mut state = self.state.lock().unwrap();
            state.playing = !state.playing;
            state.paused = !state.paused;
        }
        self.record(Call::TogglePlayPause);
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        *self.state.lock().unwrap() = FakeState::default();
        self.record(Call::Stop);
        Ok(())
    }

    async fn set_subtitle(&self, mode: SubtitleMode) -> Result<(), PlayerError> {
        self.record(Call::Subtitle(mode));
        Ok(())
    }

    async fn set_audio_stream(&self, mode: AudioStreamMode) -> Result<(), PlayerError> {
        self.record(Call::AudioStream(mode));
        Ok(())
    }
}

/// Bearer token in the webhook's `base64(identity/secret)` shape.
pub fn token(identity: &str, secret: &str) -> String {
    BASE64_STANDARD.encode(format!("{identity}/{secret}"))
}

use std::str::FromStr;
use std::time::Duration;

use serde_json::Value;

use crate::player::{AudioStreamMode, SubtitleMode};
use crate::remote::request::Params;
use crate::remote::RemoteError;

/// Names the webhook may address, as they appear after `/ifttt/remote/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Pause,
    Resume,
    Stop,
    Rewind,
    Forward,
    Subtitle,
    Audio,
    Exit,
}

impl CommandKind {
    pub const ALL: [CommandKind; 8] = [
        CommandKind::Pause,
        CommandKind::Resume,
        CommandKind::Stop,
        CommandKind::Rewind,
        CommandKind::Forward,
        CommandKind::Subtitle,
        CommandKind::Audio,
        CommandKind::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Pause => "pause",
            CommandKind::Resume => "resume",
            CommandKind::Stop => "stop",
            CommandKind::Rewind => "rewind",
            CommandKind::Forward => "forward",
            CommandKind::Subtitle => "subtitle",
            CommandKind::Audio => "audio",
            CommandKind::Exit => "exit",
        }
    }
}

impl FromStr for CommandKind {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RemoteError::InvalidCommand(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Secs,
    Mins,
}

impl TimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Secs => 1.0,
            TimeUnit::Mins => 60.0,
        }
    }
}

/// Relative seek amount for `rewind` / `forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seek {
    pub amount: f64,
    pub unit: TimeUnit,
}

impl Seek {
    /// Seek distance; saturates instead of overflowing for absurd amounts.
    pub fn delta(&self) -> Duration {
        Duration::try_from_secs_f64(self.amount * self.unit.seconds()).unwrap_or(Duration::MAX)
    }
}

/// A fully validated command, ready to run against the player.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
    Rewind(Seek),
    Forward(Seek),
    Subtitle(SubtitleMode),
    Audio(AudioStreamMode),
    Exit,
}

impl Command {
    /// Validate the parameters `kind` needs. Absent fields fail with
    /// `MissingField`, out-of-range values with `InvalidParameter`.
    /// Commands without arguments never look at `params`.
    pub fn parse(kind: CommandKind, params: Option<&Value>) -> Result<Self, RemoteError> {
        let command = match kind {
            CommandKind::Pause => Command::Pause,
            CommandKind::Resume => Command::Resume,
            CommandKind::Stop => Command::Stop,
            CommandKind::Exit => Command::Exit,
            CommandKind::Rewind => Command::Rewind(parse_seek(&Params::from_value(params)?)?),
            CommandKind::Forward => Command::Forward(parse_seek(&Params::from_value(params)?)?),
            CommandKind::Subtitle => {
                let mode = Params::from_value(params)?.mode()?;
                Command::Subtitle(match mode.as_str() {
                    "previous" => SubtitleMode::Previous,
                    "next" => SubtitleMode::Next,
                    "on" => SubtitleMode::On,
                    "off" => SubtitleMode::Off,
                    _ => return Err(invalid_mode(mode)),
                })
            }
            CommandKind::Audio => {
                let mode = Params::from_value(params)?.mode()?;
                Command::Audio(match mode.as_str() {
                    "previous" => AudioStreamMode::Previous,
                    "next" => AudioStreamMode::Next,
                    _ => return Err(invalid_mode(mode)),
                })
            }
        };
        Ok(command)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Pause => CommandKind::Pause,
            Command::Resume => CommandKind::Resume,
            Command::Stop => CommandKind::Stop,
            Command::Rewind(_) => CommandKind::Rewind,
            Command::Forward(_) => CommandKind::Forward,
            Command::Subtitle(_) => CommandKind::Subtitle,
            Command::Audio(_) => CommandKind::Audio,
            Command::Exit => CommandKind::Exit,
        }
    }
}

// Both fields are read before the unit is judged, so a missing field always wins.
fn parse_seek(params: &Params) -> Result<Seek, RemoteError> {
    let amount = params.time()?;
    let unit = params.unit()?;
    let unit = match unit.as_str() {
        "secs" => TimeUnit::Secs,
        "mins" => TimeUnit::Mins,
        _ => {
            return Err(RemoteError::InvalidParameter {
                field: "unit",
                value: unit,
            })
        }
    };
    Ok(Seek { amount, unit })
}

fn invalid_mode(mode: String) -> RemoteError {
    RemoteError::InvalidParameter {
        field: "mode",
        value: mode,
    }
}

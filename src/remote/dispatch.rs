use std::time::Duration;

use crate::player::Player;
use crate::remote::command::{Command, CommandKind};
use crate::remote::RemoteError;
use crate::shutdown::ShutdownSignal;

/// Forward seeks that would run past the end land this far before it.
pub const END_MARGIN: Duration = Duration::from_secs(5);

/// Rewind target, clamped at the start of the media.
pub fn rewind_target(position: Duration, delta: Duration) -> Duration {
    position.saturating_sub(delta)
}

/// Forward target; anything at or past `total` becomes `total - END_MARGIN`.
pub fn forward_target(position: Duration, delta: Duration, total: Duration) -> Duration {
    let target = position.saturating_add(delta);
    if target >= total {
        total.saturating_sub(END_MARGIN)
    } else {
        target
    }
}

/// Fail with `InvalidState` unless the player is in a state `kind` can act on.
pub async fn check_preconditions(kind: CommandKind, player: &dyn Player) -> Result<(), RemoteError> {
    match kind {
        CommandKind::Pause => {
            if !player.is_loaded().await? || !player.is_playing().await? {
                return Err(RemoteError::InvalidState("not playing anything right now"));
            }
        }
        CommandKind::Resume => {
            if !player.is_loaded().await? || !player.is_paused().await? {
                return Err(RemoteError::InvalidState("nothing is paused right now"));
            }
        }
        CommandKind::Stop
        | CommandKind::Rewind
        | CommandKind::Forward
        | CommandKind::Subtitle
        | CommandKind::Audio => {
            if !player.is_loaded().await? {
                return Err(RemoteError::InvalidState("no media loaded"));
            }
        }
        CommandKind::Exit => {}
    }
    Ok(())
}

/// Check the command's player preconditions, then perform its effect.
/// A failed precondition leaves the player untouched.
pub async fn execute(
    command: &Command,
    player: &dyn Player,
    shutdown: &ShutdownSignal,
) -> Result<(), RemoteError> {
    check_preconditions(command.kind(), player).await?;
    match command {
        // same toggle for both; the precondition decides the direction
        Command::Pause | Command::Resume => player.toggle_play_pause().await?,
        Command::Stop => player.stop().await?,
        Command::Rewind(seek) => {
            let target = rewind_target(player.position().await?, seek.delta());
            player.seek(target).await?;
        }
        Command::Forward(seek) => {
            let position = player.position().await?;
            let total = player.total().await?;
            player.seek(forward_target(position, seek.delta(), total)).await?;
        }
        Command::Subtitle(mode) => player.set_subtitle(*mode).await?,
        Command::Audio(mode) => player.set_audio_stream(*mode).await?,
        Command::Exit => {
            if shutdown.request() {
                tracing::info!("exit requested, handing over to the shutdown supervisor");
            }
        }
    }
    Ok(())
}

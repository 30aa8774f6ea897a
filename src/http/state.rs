use std::sync::Arc;

use tokio::sync::Mutex;

use crate::player::Player;
use crate::remote::auth::Identity;
use crate::shutdown::ShutdownSignal;

/// Shared gateway state injected into route handlers via axum::extract::State.
#[derive(Clone)]
pub struct AppState {
    pub player: Arc<dyn Player>,
    pub user_token: Arc<str>,
    pub identity: Identity,
    pub shutdown: ShutdownSignal,
    /// Held for the whole request: commands are processed strictly one at a time.
    pub serve_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        player: Arc<dyn Player>,
        user_token: &str,
        identity: Identity,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            player,
            user_token: Arc::from(user_token),
            identity,
            shutdown,
            serve_lock: Arc::new(Mutex::new(())),
        }
    }
}

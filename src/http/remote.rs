use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::http::state::AppState;
use crate::remote::auth;
use crate::remote::command::{Command, CommandKind};
use crate::remote::dispatch;
use crate::remote::request::{CommandRequest, LegacyQuery};
use crate::remote::RemoteError;

/// Smallest body that can hold a JSON object (`{}`).
const MIN_CONTENT_LENGTH: usize = 2;

impl IntoResponse for RemoteError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.diagnostic(),
        )
            .into_response()
    }
}

/// POST /ifttt/remote/{command} with a JSON envelope.
pub async fn remote_json(
    State(state): State<AppState>,
    Path(command): Path<String>,
    request: Request,
) -> Response {
    let _serving = state.serve_lock.lock().await;
    let result = async {
        ensure_running(&state)?;
        let length = content_length(request.headers())?;
        let body = axum::body::to_bytes(request.into_body(), length)
            .await
            .map_err(|e| RemoteError::InvalidRequest(format!("failed to read body: {e}")))?;
        let envelope = CommandRequest::from_json(&body)?;
        run(&state, &command, &envelope).await
    }
    .await;
    respond(&command, result)
}

/// GET /ifttt/remote/{command}?__authorization=... (older webhook shape).
pub async fn remote_query(
    State(state): State<AppState>,
    Path(command): Path<String>,
    query: Result<Query<LegacyQuery>, QueryRejection>,
) -> Response {
    let _serving = state.serve_lock.lock().await;
    let result = async {
        ensure_running(&state)?;
        let Query(query) = query.map_err(|e| {
            RemoteError::InvalidRequest(format!("malformed query string: {}", e.body_text()))
        })?;
        let envelope = CommandRequest::from(query);
        run(&state, &command, &envelope).await
    }
    .await;
    respond(&command, result)
}

/// Anything outside the command route.
pub async fn invalid_path(State(state): State<AppState>, uri: Uri) -> Response {
    let _serving = state.serve_lock.lock().await;
    let result = ensure_running(&state).and_then(|()| {
        Err(RemoteError::InvalidRequest(format!(
            "unsupported path {}",
            uri.path()
        )))
    });
    respond(uri.path(), result)
}

// Authorize, resolve, re-check shutdown, then dispatch. Nothing touches the
// player before the credential and the command name are both accepted.
async fn run(state: &AppState, command: &str, envelope: &CommandRequest) -> Result<(), RemoteError> {
    let token = envelope.authorization()?;
    let local = state.identity.resolve()?;
    auth::validate(token, &state.user_token, local)?;

    let kind: CommandKind = command.parse()?;

    // Requests are serialized, so today an accepted exit is always seen by the
    // check at the top of the handler. This one guards dispatch itself if that
    // serialization is ever loosened.
    ensure_running(state)?;

    let command = match Command::parse(kind, envelope.params.as_ref()) {
        Ok(command) => command,
        // an unusable player state is reported ahead of a bad value
        Err(e @ RemoteError::InvalidParameter { .. }) => {
            dispatch::check_preconditions(kind, state.player.as_ref()).await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };
    dispatch::execute(&command, state.player.as_ref(), &state.shutdown).await
}

fn ensure_running(state: &AppState) -> Result<(), RemoteError> {
    if state.shutdown.is_requested() {
        Err(RemoteError::ShutdownInProgress)
    } else {
        Ok(())
    }
}

/// Validate the content descriptor and return the declared body length.
pub fn content_length(headers: &HeaderMap) -> Result<usize, RemoteError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        return Err(RemoteError::InvalidRequest(format!(
            "unsupported content type {content_type:?}"
        )));
    }

    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RemoteError::InvalidRequest("missing Content-Length".to_string()))?;
    let length: usize = length
        .trim()
        .parse()
        .map_err(|_| RemoteError::InvalidRequest(format!("bad Content-Length {length:?}")))?;
    if length < MIN_CONTENT_LENGTH {
        return Err(RemoteError::InvalidRequest(format!(
            "Content-Length {length} is too small"
        )));
    }
    Ok(length)
}

fn respond(command: &str, result: Result<(), RemoteError>) -> Response {
    match result {
        Ok(()) => {
            tracing::info!(command, "command executed");
            StatusCode::OK.into_response()
        }
        Err(e) => {
            tracing::error!(command, "request failed: {}", e.diagnostic());
            e.into_response()
        }
    }
}

//! HTTP routes: registration, login, connect, and the active list.
//!
//! | Method | Path                | Success                    |
//! |--------|---------------------|----------------------------|
//! | POST   | `/user`             | 201 `{"id","userName"}`    |
//! | POST   | `/user/login`       | 201 `{"url"}` + headers    |
//! | GET    | `/ws?token=…`       | 101 upgrade, echo loop     |
//! | GET    | `/user/active/list` | 200 `["name", …]`          |

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, TimeDelta, Utc};
use handoff_protocol::{ConnectUrl, Credentials, ProtocolError, UserCreated};
use handoff_session::{CredentialStore, SessionError};
use handoff_transport::WebSocketConnection;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::server::ServerState;

/// Value of the `X-Rate-Limit` header on login responses.
pub const RATE_LIMIT: u32 = 60;

/// Hours ahead of now that the `X-Expires-After` header points.
///
/// Informational only: tokens do not actually expire.
pub const TOKEN_TTL_HOURS: i64 = 1;

/// Errors returned to HTTP clients.
///
/// Every variant is logged when it is turned into a response. Only
/// validation failures put their message in the body; everything else
/// answers with a bare status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body failed validation (400, message in body).
    #[error(transparent)]
    Validation(ProtocolError),

    /// Login did not check out: bad body, unknown user, or wrong password (400).
    #[error("login rejected: {0}")]
    Login(String),

    /// The connect token was missing, unknown, or already spent (401).
    #[error("connect rejected: {0}")]
    Unauthorized(SessionError),

    /// A dependency the request needs is down (503).
    #[error("service unavailable: {0}")]
    Unavailable(SessionError),

    /// Anything else (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Maps a failure during login. Credential problems become a plain 400.
    fn login(err: SessionError) -> Self {
        match err {
            SessionError::InvalidCredentials(_) => Self::Login(err.to_string()),
            SessionError::RandomnessUnavailable(_) => Self::Unavailable(err),
            other if other.is_not_found() => Self::Login(other.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }

    /// Maps a failure while registering a user.
    fn register(err: SessionError) -> Self {
        match err {
            SessionError::RandomnessUnavailable(_) => Self::Unavailable(err),
            other => Self::Internal(other.to_string()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Login(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ProtocolError> for ApiError {
    /// Body problems are the caller's fault; codec failures are ours.
    fn from(err: ProtocolError) -> Self {
        if err.is_validation() {
            Self::Validation(err)
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::warn!(error = %self, %status, "request rejected");
        }
        match self {
            Self::Validation(err) => (status, err.to_string()).into_response(),
            _ => status.into_response(),
        }
    }
}

/// Builds the router over shared server state.
pub(crate) fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/user", post(create_user))
        .route("/user/login", post(login))
        .route("/user/active/list", get(active_users))
        .route("/ws", get(connect))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}

/// `POST /user`: registers a user.
async fn create_user(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserCreated>), ApiError> {
    let Credentials { user_name, password } = Credentials::from_json(&body)?;

    let name = user_name.clone();
    let id = blocking(move || state.users.add(&name, &password))
        .await?
        .map_err(ApiError::register)?;

    Ok((StatusCode::CREATED, Json(UserCreated { id: id.to_string(), user_name })))
}

/// `POST /user/login`: checks credentials and issues a connect token.
async fn login(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let Credentials { user_name, password } =
        Credentials::from_json(&body).map_err(|e| ApiError::Login(e.to_string()))?;

    let lookup = Arc::clone(&state);
    let user = blocking(move || lookup.users.authenticate(&user_name, &password))
        .await?
        .map_err(ApiError::login)?;

    let token = state.tokens.issue(user).map_err(ApiError::login)?;
    let url = format!("{}/ws?token={token}", state.connect_base);

    let headers = [
        ("X-Rate-Limit", RATE_LIMIT.to_string()),
        ("X-Expires-After", expires_after(Utc::now())),
    ];
    Ok((StatusCode::CREATED, headers, Json(ConnectUrl { url })))
}

/// `GET /ws?token=…`: spends the token, then upgrades.
///
/// The token is checked before anything else, so a bad token answers 401
/// whether or not the request is a valid upgrade, and a good token is
/// spent even if the upgrade then fails. Only the first `token` parameter
/// counts; a query string that does not parse is treated as carrying no
/// token.
async fn connect(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = match query {
        Ok(Query(pairs)) => first_token(pairs),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unparseable connect query");
            String::new()
        }
    };
    let authenticated = match handler::authenticate(&state.tokens, &token).await {
        Ok(authenticated) => authenticated,
        Err(e) => return ApiError::Unauthorized(e).into_response(),
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::warn!(
                username = %authenticated.user().username(),
                error = %rejection,
                "connect request is not an upgrade, token spent"
            );
            return rejection.into_response();
        }
    };

    let connected = authenticated.register(Arc::clone(&state.sessions));
    upgrade
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "upgrade failed"))
        .on_upgrade(move |socket| async move {
            let conn = WebSocketConnection::new(connected.connection_id(), socket);
            let shutdown = state.shutdown.subscribe();
            connected.run(conn, &state.codec, shutdown).await;
        })
}

/// Value of the first `token` pair, or empty if there is none.
fn first_token(pairs: Vec<(String, String)>) -> String {
    pairs
        .into_iter()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// `GET /user/active/list`: names of currently connected users.
async fn active_users(State(state): State<Arc<ServerState>>) -> Json<Vec<String>> {
    Json(state.sessions.list_usernames())
}

/// Runs credential hashing off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Formats `now` plus [`TOKEN_TTL_HOURS`] as `2006-01-02 15:04:05.999 +0000 UTC`.
///
/// Trailing zeros of the fractional second are trimmed, and a whole second
/// has no fraction at all.
fn expires_after(now: DateTime<Utc>) -> String {
    let at = now + TimeDelta::hours(TOKEN_TTL_HOURS);
    let nanos = format!("{:09}", at.timestamp_subsec_nanos());
    let fraction = nanos.trim_end_matches('0');
    let dot = if fraction.is_empty() { "" } else { "." };
    format!("{}{dot}{fraction} +0000 UTC", at.format("%Y-%m-%d %H:%M:%S"))
}

use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Bad request: {0}")]
    Bad(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Env: {0}")]
    Env(#[from] std::env::VarError),

    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let (code, body) = match self {
            AppErr::Bad(msg)      => (StatusCode::BAD_REQUEST, msg),
            AppErr::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            other                 => {
                tracing::error!("{other}");
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };
        (code, body).into_response()
    }
}

/* ── helpers: turn any error into Bad / NotFound ── */
pub fn bad<E: Display>(e: E) -> AppErr { AppErr::Bad(e.to_string()) }
pub fn not_found<E: Display>(e: E) -> AppErr { AppErr::NotFound(e.to_string()) }

/// Why a call to the streaming platform produced no usable data.
///
/// Never leaves the aggregator or the avatar resolver: callers see a default
/// value, tests see which branch was taken.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Payload(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Payload(e.to_string())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self { FetchError::Payload(e.to_string()) }
}

use axum::{Extension, Router};
use std::path::Path;
use tower_http::services::ServeDir;

use crate::state::Services;

pub mod streamers;

pub fn router() -> Router {
    Router::new().nest("/api", streamers::router())
}

/// API routes with shared services attached, static files for everything else.
pub fn app(services: Services, static_dir: impl AsRef<Path>) -> Router {
    router()
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(Extension(services.roster))
        .layer(Extension(services.live))
        .layer(Extension(services.avatars))
}

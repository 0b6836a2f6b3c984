use axum::{
    extract::{Extension, Path},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    error::{not_found, AppResult},
    grid::{self, Grid},
    roster::Streamer,
    state::{SharedAggregator, SharedAvatars, SharedRoster},
};

pub const LIVE_STATUS_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

#[derive(Serialize)]
struct AvatarJson {
    url: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/streamers",             get(list))
        .route("/streamers/live-status", get(live_status))
        .route("/streamers/grid",        get(grid_view))
        .route("/streamers/:id",         get(one))
        .route("/streamers/:id/avatar",  get(avatar))
}

async fn list(Extension(roster): Extension<SharedRoster>) -> Json<Vec<Streamer>> {
    Json(roster.as_slice().to_vec())
}

/* ---------------- live status proxy ---------------- */
async fn live_status(
    Extension(roster): Extension<SharedRoster>,
    Extension(live): Extension<SharedAggregator>,
) -> impl IntoResponse {
    let statuses = live.aggregate(&roster).await;
    ([(header::CACHE_CONTROL, LIVE_STATUS_CACHE_CONTROL)], Json(statuses))
}

async fn grid_view(
    Extension(roster): Extension<SharedRoster>,
    Extension(live): Extension<SharedAggregator>,
) -> Json<Grid> {
    let statuses = live.aggregate(&roster).await;
    Json(grid::build(&roster, &statuses))
}

async fn one(
    Extension(roster): Extension<SharedRoster>,
    Path(id): Path<String>,
) -> AppResult<Json<Streamer>> {
    let s = roster.get(&id).ok_or_else(|| not_found(format!("streamer `{id}`")))?;
    Ok(Json(s.clone()))
}

/* ---------------- avatar ---------------- */
async fn avatar(
    Extension(roster): Extension<SharedRoster>,
    Extension(avatars): Extension<SharedAvatars>,
    Path(id): Path<String>,
) -> AppResult<Json<AvatarJson>> {
    let s = roster.get(&id).ok_or_else(|| not_found(format!("streamer `{id}`")))?;
    let url = avatars
        .resolve(s.kick_link.as_deref(), s.twitch_link.as_deref(), Some(&s.display_name))
        .await;
    Ok(Json(AvatarJson { url }))
}

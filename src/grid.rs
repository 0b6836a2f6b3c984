//! Roster joined with live data, split the way the page shows it.
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    live_status::LiveStatus,
    roster::{Roster, Streamer},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamerCard {
    #[serde(flatten)]
    pub streamer:        Streamer,
    pub is_live:         bool,
    /// live count while live, otherwise the roster's hint (0 if none)
    pub current_viewers: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated:    Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub live_count: usize,
    pub total:      usize,
    pub live:       Vec<StreamerCard>,
    pub offline:    Vec<StreamerCard>,
}

pub fn build(roster: &Roster, statuses: &HashMap<String, LiveStatus>) -> Grid {
    let (mut live, offline): (Vec<_>, Vec<_>) = roster
        .iter()
        .map(|s| card(s, statuses.get(&s.id)))
        .partition(|c| c.is_live);

    // stable: equal counts keep roster (name) order
    live.sort_by(|a, b| b.current_viewers.cmp(&a.current_viewers));

    Grid { live_count: live.len(), total: roster.len(), live, offline }
}

fn card(s: &Streamer, status: Option<&LiveStatus>) -> StreamerCard {
    let is_live = status.is_some_and(|st| st.is_live);
    let current_viewers = match status {
        Some(st) if st.is_live => st.current_viewers,
        _ => s.viewer_hint.unwrap_or(0),
    };
    StreamerCard {
        streamer: s.clone(),
        is_live,
        current_viewers,
        last_updated: status.map(|st| st.last_updated),
    }
}

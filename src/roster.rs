//! The participant list, produced offline and loaded once at start-up.
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

use crate::{
    error::{bad, AppResult},
    platform::{extract_username, Platform},
};

/// One participant. Field names on the wire are the ones the roster file uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Streamer {
    pub id: String,
    #[serde(rename = "nombre")]
    pub display_name: String,
    #[serde(rename = "kickLink", default, skip_serializing_if = "Option::is_none")]
    pub kick_link: Option<String>,
    #[serde(rename = "twitchLink", default, skip_serializing_if = "Option::is_none")]
    pub twitch_link: Option<String>,
    #[serde(rename = "youtubeLink", default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
    pub platform: Platform,
    /// Viewer count captured when the roster was built.
    #[serde(rename = "ccv", default, skip_serializing_if = "Option::is_none")]
    pub viewer_hint: Option<u64>,
    #[serde(rename = "kickPartner", default)]
    pub partnered: bool,
    #[serde(rename = "statusKickPartner", default = "pending")]
    pub partner_status: String,
    #[serde(rename = "confirmado", default)]
    pub confirmed: bool,
    #[serde(rename = "anunciado", default)]
    pub announced: bool,
    #[serde(rename = "enDiscord", default)]
    pub in_community: bool,
}

pub(crate) fn pending() -> String { "Pendiente".into() }

impl Streamer {
    pub fn kick_username(&self) -> Option<String> {
        self.kick_link.as_deref().and_then(|l| extract_username(Platform::Kick, l))
    }

    pub fn twitch_username(&self) -> Option<String> {
        self.twitch_link.as_deref().and_then(|l| extract_username(Platform::Twitch, l))
    }
}

/// Read-only participant list with an id index.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    streamers: Vec<Streamer>,
    by_id:     HashMap<String, usize>,
}

impl Roster {
    pub fn from_streamers(streamers: Vec<Streamer>) -> AppResult<Self> {
        let mut by_id = HashMap::with_capacity(streamers.len());
        for (i, s) in streamers.iter().enumerate() {
            if by_id.insert(s.id.clone(), i).is_some() {
                return Err(bad(format!("duplicate streamer id `{}`", s.id)));
            }
        }
        Ok(Self { streamers, by_id })
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        Self::from_streamers(serde_json::from_str(raw)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        let roster = Self::from_json(&raw)?;
        tracing::info!("loaded {} streamers from {}", roster.len(), path.as_ref().display());
        Ok(roster)
    }

    pub fn get(&self, id: &str) -> Option<&Streamer> {
        self.by_id.get(id).map(|&i| &self.streamers[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Streamer> { self.streamers.iter() }

    pub fn as_slice(&self) -> &[Streamer] { &self.streamers }

    pub fn len(&self) -> usize { self.streamers.len() }

    pub fn is_empty(&self) -> bool { self.streamers.is_empty() }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Streamer;
    type IntoIter = std::slice::Iter<'a, Streamer>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

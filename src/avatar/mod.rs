//! Picture for a streamer card. Always yields a URL.
//!
//! Kick avatars come from the channel endpoint and are kept in two tiers,
//! process memory and the [`store::DurableStore`] file, both aged out after
//! the avatar TTL. Twitch has no fetch of its own and gets the generated
//! placeholder, cached the same way.
pub mod store;

use chrono::{TimeZone, Utc};
use futures_util::future::join_all;
use std::{sync::Arc, time::Duration};

use crate::{
    channel_api::ChannelApi,
    error::FetchError,
    platform::{extract_username, Platform},
    roster::Roster,
    utils::{cache::TtlCache, clock::SharedClock},
};
use store::DurableStore;

pub const DEFAULT_NAME: &str = "Streamer";

/// ui-avatars.com image with the event's colours.
pub fn placeholder_url(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=D32F2F&color=fff&size=256&bold=true",
        urlencoding::encode(name)
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderReason {
    /// the channel exists but has no profile picture
    NoPicture,
    /// the call failed; not cached, next request tries again
    FetchFailed(FetchError),
    /// secondary platform, nothing to fetch
    Twitch,
    /// no recognised link at all
    NoLink,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvatarSource {
    Memory,
    Durable,
    Upstream,
    Placeholder(PlaceholderReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvatarResolution {
    pub url:    String,
    pub source: AvatarSource,
}

pub struct AvatarResolver {
    api:     Arc<dyn ChannelApi>,
    memory:  TtlCache<String>,
    durable: DurableStore,
}

impl AvatarResolver {
    pub fn new(api: Arc<dyn ChannelApi>, durable: DurableStore, ttl: Duration, clock: SharedClock) -> Self {
        Self { api, memory: TtlCache::new(ttl, clock), durable }
    }

    pub async fn resolve(&self, kick_link: Option<&str>, twitch_link: Option<&str>, name: Option<&str>) -> String {
        self.resolve_detailed(kick_link, twitch_link, name).await.url
    }

    pub async fn resolve_detailed(
        &self,
        kick_link: Option<&str>,
        twitch_link: Option<&str>,
        name: Option<&str>,
    ) -> AvatarResolution {
        if let Some(user) = kick_link.and_then(|l| extract_username(Platform::Kick, l)) {
            return self.kick(&user, name).await;
        }
        if let Some(user) = twitch_link.and_then(|l| extract_username(Platform::Twitch, l)) {
            return self.twitch(&user, name).await;
        }
        AvatarResolution {
            url:    placeholder_url(name.unwrap_or(DEFAULT_NAME)),
            source: AvatarSource::Placeholder(PlaceholderReason::NoLink),
        }
    }

    async fn cached(&self, username: &str) -> Option<AvatarResolution> {
        if let Some(url) = self.memory.get(username).await {
            return Some(AvatarResolution { url, source: AvatarSource::Memory });
        }
        let entry = self.durable.get(username).await?;
        // promoted entries keep their original age, so both tiers expire together
        match Utc.timestamp_millis_opt(entry.timestamp).single() {
            Some(captured) => self.memory.insert_at(username, entry.url.clone(), captured).await,
            None => tracing::warn!(username, timestamp = entry.timestamp, "durable avatar has a bad timestamp"),
        }
        Some(AvatarResolution { url: entry.url, source: AvatarSource::Durable })
    }

    async fn remember(&self, username: &str, url: &str) {
        self.memory.insert(username, url.to_string()).await;
        self.durable.set(username, url).await;
    }

    async fn kick(&self, username: &str, name: Option<&str>) -> AvatarResolution {
        if let Some(hit) = self.cached(username).await {
            return hit;
        }

        let fallback = placeholder_url(name.unwrap_or(username));
        match self.api.channel(username).await {
            Ok(info) => {
                let res = match info.profile_pic() {
                    Some(pic) => AvatarResolution { url: pic.to_string(), source: AvatarSource::Upstream },
                    None => AvatarResolution {
                        url:    fallback,
                        source: AvatarSource::Placeholder(PlaceholderReason::NoPicture),
                    },
                };
                self.remember(username, &res.url).await;
                res
            }
            Err(e) => {
                tracing::warn!(username, error = %e, "kick avatar fetch failed, using placeholder");
                AvatarResolution {
                    url:    fallback,
                    source: AvatarSource::Placeholder(PlaceholderReason::FetchFailed(e)),
                }
            }
        }
    }

    async fn twitch(&self, username: &str, name: Option<&str>) -> AvatarResolution {
        if let Some(hit) = self.cached(username).await {
            return hit;
        }
        let url = placeholder_url(name.unwrap_or(username));
        self.remember(username, &url).await;
        AvatarResolution { url, source: AvatarSource::Placeholder(PlaceholderReason::Twitch) }
    }

    /// Warm both tiers for the whole roster; waits for every lookup.
    /// The durable file is written once, after the last lookup.
    pub async fn prefetch(&self, roster: &Roster) -> usize {
        let jobs = roster.iter().map(move |s| {
            self.resolve_detailed(s.kick_link.as_deref(), s.twitch_link.as_deref(), Some(&s.display_name))
        });
        self.durable.hold_writes();
        let done = join_all(jobs).await;
        self.durable.release_writes().await;
        let fetched = done.iter().filter(|r| r.source == AvatarSource::Upstream).count();
        tracing::info!("prefetched {} avatars ({} from upstream)", done.len(), fetched);
        done.len()
    }
}

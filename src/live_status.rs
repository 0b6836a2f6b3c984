//! Live/viewer state for every participant, memoised per channel.
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::{
    channel_api::ChannelApi,
    error::FetchError,
    roster::Roster,
    utils::{cache::TtlCache, clock::SharedClock},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatus {
    pub is_live:         bool,
    pub current_viewers: u64,
    /// epoch millis of the fetch that produced this value
    pub last_updated:    i64,
}

impl LiveStatus {
    pub fn offline(at: i64) -> Self {
        Self { is_live: false, current_viewers: 0, last_updated: at }
    }
}

/// How a status was obtained. The value is always usable; the tag says
/// which path produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Cached(LiveStatus),
    Fetched(LiveStatus),
    Defaulted(LiveStatus, FetchError),
}

impl Resolution {
    pub fn status(&self) -> LiveStatus {
        match self {
            Resolution::Cached(s) | Resolution::Fetched(s) | Resolution::Defaulted(s, _) => *s,
        }
    }
}

pub struct LiveStatusAggregator {
    api:   Arc<dyn ChannelApi>,
    cache: TtlCache<LiveStatus>,
    clock: SharedClock,
}

impl LiveStatusAggregator {
    pub fn new(api: Arc<dyn ChannelApi>, ttl: Duration, clock: SharedClock) -> Self {
        Self { api, cache: TtlCache::new(ttl, clock.clone()), clock }
    }

    /// Status for one channel: cache first, then the platform. Never fails.
    pub async fn resolve(&self, username: &str) -> Resolution {
        if let Some(hit) = self.cache.get(username).await {
            tracing::debug!(username, "live status cache hit");
            return Resolution::Cached(hit);
        }

        let res = match self.api.channel(username).await {
            Ok(info) => Resolution::Fetched(LiveStatus {
                is_live:         info.is_live(),
                current_viewers: info.viewers(),
                last_updated:    self.clock.now_millis(),
            }),
            Err(e) => {
                tracing::warn!(username, error = %e, "live status fetch failed, reporting offline");
                Resolution::Defaulted(LiveStatus::offline(self.clock.now_millis()), e)
            }
        };

        // failures are cached too, so a dead channel is not hammered every poll
        self.cache.insert(username, res.status()).await;
        res
    }

    /// Resolution per participant id, for everyone with a usable Kick link.
    pub async fn aggregate_detailed(&self, roster: &Roster) -> HashMap<String, Resolution> {
        let jobs = roster.iter().filter_map(move |s| {
            let username = s.kick_username()?;
            Some(async move { (s.id.clone(), self.resolve(&username).await) })
        });
        join_all(jobs).await.into_iter().collect()
    }

    pub async fn aggregate(&self, roster: &Roster) -> HashMap<String, LiveStatus> {
        self.aggregate_detailed(roster)
            .await
            .into_iter()
            .map(|(id, r)| (id, r.status()))
            .collect()
    }

    /// Forget one channel so the next call goes upstream.
    pub async fn invalidate(&self, username: &str) -> bool {
        self.cache.remove(username).await.is_some()
    }
}

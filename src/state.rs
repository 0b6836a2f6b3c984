use std::sync::Arc;

use crate::{
    avatar::{store::DurableStore, AvatarResolver},
    channel_api::{ChannelApi, KickClient},
    config::Config,
    error::AppResult,
    live_status::LiveStatusAggregator,
    roster::Roster,
    utils::clock::{SharedClock, SystemClock},
};

/* ------------ shared by every handler -------------- */
pub type SharedRoster     = Arc<Roster>;
pub type SharedAggregator = Arc<LiveStatusAggregator>;
pub type SharedAvatars    = Arc<AvatarResolver>;

#[derive(Clone)]
pub struct Services {
    pub roster:  SharedRoster,
    pub live:    SharedAggregator,
    pub avatars: SharedAvatars,
}

impl Services {
    /// Wire everything around one platform client and one clock.
    pub fn new(cfg: &Config, roster: Roster, api: Arc<dyn ChannelApi>, clock: SharedClock) -> Self {
        let durable = DurableStore::new(cfg.avatar_store_path.clone(), cfg.avatar_ttl, clock.clone());
        Self {
            roster:  Arc::new(roster),
            live:    Arc::new(LiveStatusAggregator::new(api.clone(), cfg.live_status_ttl, clock.clone())),
            avatars: Arc::new(AvatarResolver::new(api, durable, cfg.avatar_ttl, clock)),
        }
    }

    /// Production wiring: roster from disk, real Kick client, wall clock.
    pub async fn from_config(cfg: &Config) -> AppResult<Self> {
        let roster = Roster::load(&cfg.roster_path).await?;
        let api = Arc::new(KickClient::new(cfg.kick_api_base.clone(), cfg.http_timeout)?);
        Ok(Self::new(cfg, roster, api, Arc::new(SystemClock)))
    }
}

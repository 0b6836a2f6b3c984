//! Runtime settings, read from the environment (after `.env` is loaded).
use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::error::{bad, AppResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr:         String,
    pub roster_path:       PathBuf,
    pub static_dir:        PathBuf,
    pub kick_api_base:     String,
    /// `None` disables the durable avatar tier.
    pub avatar_store_path: Option<PathBuf>,
    pub live_status_ttl:   Duration,
    pub avatar_ttl:        Duration,
    pub http_timeout:      Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr:         "0.0.0.0:3000".into(),
            roster_path:       "data/streamers.json".into(),
            static_dir:        "static".into(),
            kick_api_base:     "https://kick.com".into(),
            avatar_store_path: Some("data/avatar_cache.json".into()),
            live_status_ttl:   Duration::from_secs(5 * 60),
            avatar_ttl:        Duration::from_secs(24 * 60 * 60),
            http_timeout:      Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let d = Self::default();
        Ok(Self {
            bind_addr:     var("BIND_ADDR")?.unwrap_or(d.bind_addr),
            roster_path:   var("ROSTER_PATH")?.map(PathBuf::from).unwrap_or(d.roster_path),
            static_dir:    var("STATIC_DIR")?.map(PathBuf::from).unwrap_or(d.static_dir),
            kick_api_base: var("KICK_API_BASE")?.unwrap_or(d.kick_api_base),
            avatar_store_path: match var("AVATAR_STORE_PATH")? {
                Some(p) if p.trim().is_empty() => None,
                Some(p)                        => Some(PathBuf::from(p)),
                None                           => d.avatar_store_path,
            },
            live_status_ttl: secs("LIVE_STATUS_TTL_SECS")?.unwrap_or(d.live_status_ttl),
            avatar_ttl:      secs("AVATAR_TTL_SECS")?.unwrap_or(d.avatar_ttl),
            http_timeout:    secs("HTTP_TIMEOUT_SECS")?.unwrap_or(d.http_timeout),
        })
    }
}

/// Unset is `None`; set but not valid UTF-8 is an error, never a silent default.
fn var(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => {
            tracing::error!(key, "environment variable is not valid unicode");
            Err(e.into())
        }
    }
}

fn secs(key: &str) -> AppResult<Option<Duration>> {
    match var(key)? {
        Some(raw) => u64::from_str(raw.trim())
            .map(|n| Some(Duration::from_secs(n)))
            .map_err(|e| bad(format!("{key}={raw}: {e}"))),
        None => Ok(None),
    }
}

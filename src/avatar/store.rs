//! Durable avatar tier: one JSON file, `avatar_<username>` → `{url, timestamp}`.
//!
//! The file is read once, on first use, and kept in memory; lookups never
//! touch the disk again. Changes are written back whole. Inside a
//! [`DurableStore::hold_writes`] / [`DurableStore::release_writes`] window
//! they are collected and written once at the end.
//!
//! Best-effort throughout. A broken or missing file behaves like an empty
//! store and every failure is logged and dropped.
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};
use tokio::{fs, sync::Mutex};

use crate::{error::AppResult, utils::clock::SharedClock};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarCacheEntry {
    pub url:       String,
    /// epoch millis
    pub timestamp: i64,
}

type Entries = HashMap<String, AvatarCacheEntry>;

pub fn key(username: &str) -> String { format!("avatar_{username}") }

pub struct DurableStore {
    path:    Option<PathBuf>,
    ttl:     Duration,
    clock:   SharedClock,
    /* None until the file has been loaded */
    entries: Mutex<Option<Entries>>,
    /* one writer at a time, so an older snapshot never lands last */
    io:      Mutex<()>,
    held:    AtomicUsize,
    dirty:   AtomicBool,
}

impl DurableStore {
    pub fn new(path: Option<PathBuf>, ttl: Duration, clock: SharedClock) -> Self {
        Self {
            path,
            ttl,
            clock,
            entries: Mutex::new(None),
            io: Mutex::new(()),
            held: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn disabled(clock: SharedClock) -> Self { Self::new(None, Duration::ZERO, clock) }

    pub fn is_enabled(&self) -> bool { self.path.is_some() }

    /// Fresh entry for `username`; an expired one is deleted on the way out.
    pub async fn get(&self, username: &str) -> Option<AvatarCacheEntry> {
        let path = self.path.as_ref()?;
        let k = key(username);
        {
            let mut guard = self.entries.lock().await;
            let entries = loaded(&mut guard, path).await;
            let entry = entries.get(&k)?;
            let age = self.clock.now_millis() - entry.timestamp;
            if age >= 0 && (age as u128) < self.ttl.as_millis() {
                return Some(entry.clone());
            }
            entries.remove(&k);
        }
        self.changed().await;
        None
    }

    pub async fn set(&self, username: &str, url: &str) {
        let Some(path) = self.path.as_ref() else { return };
        {
            let mut guard = self.entries.lock().await;
            loaded(&mut guard, path).await.insert(
                key(username),
                AvatarCacheEntry { url: url.into(), timestamp: self.clock.now_millis() },
            );
        }
        self.changed().await;
    }

    /// Keep changes in memory until the matching [`release_writes`](Self::release_writes).
    pub fn hold_writes(&self) { self.held.fetch_add(1, Ordering::SeqCst); }

    /// End a hold; the last one out writes anything collected meanwhile.
    pub async fn release_writes(&self) {
        let prev = self.held.fetch_sub(1, Ordering::SeqCst);
        if prev <= 1 && self.dirty.load(Ordering::SeqCst) {
            self.flush().await;
        }
    }

    async fn changed(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        if self.held.load(Ordering::SeqCst) == 0 {
            self.flush().await;
        }
    }

    async fn flush(&self) {
        let Some(path) = self.path.as_ref() else { return };
        let _w = self.io.lock().await;
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let snapshot = match self.entries.lock().await.as_ref() {
            Some(e) => e.clone(),
            None => return,
        };
        if let Err(e) = write(path, &snapshot).await {
            tracing::warn!(path = %path.display(), error = %e, "could not write avatar store");
        }
    }
}

async fn loaded<'a>(slot: &'a mut Option<Entries>, path: &Path) -> &'a mut Entries {
    if slot.is_none() {
        let entries = read(path).await.unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "avatar store unreadable, starting empty");
            Entries::new()
        });
        tracing::debug!(path = %path.display(), count = entries.len(), "avatar store loaded");
        *slot = Some(entries);
    }
    slot.get_or_insert_with(Entries::new)
}

async fn read(path: &Path) -> AppResult<Entries> {
    match fs::read_to_string(path).await {
        Ok(raw) if raw.trim().is_empty() => Ok(Entries::new()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write(path: &Path, entries: &Entries) -> AppResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

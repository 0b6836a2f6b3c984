//! Roster, live-status proxy and avatar lookups for the Squid Games Colombia
//! Minecraft event site.
pub mod avatar;
pub mod channel_api;
pub mod config;
pub mod error;
pub mod grid;
pub mod live_status;
pub mod platform;
pub mod prep;
pub mod roster;
pub mod routes;
pub mod state;
pub mod utils {
    pub mod cache;
    pub mod clock;
}

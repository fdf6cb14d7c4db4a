//! `nowplaying-link` exposes the active media session's "now playing" state
//! as JSON snapshots and forwards transport commands.
//!
//! Linux backend: MPRIS players through `playerctl`.

pub mod cli;
pub mod config;
pub mod playerctl;
pub mod runtime;

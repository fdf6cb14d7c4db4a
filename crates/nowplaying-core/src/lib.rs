//! Core of the "now playing" link: smooths coarse session timelines into a
//! steadily advancing position, decides when artwork must be (re)sent, and
//! assembles the snapshot handed to polling consumers.
//!
//! Native media sessions are reached only through [`source::MediaSessionSource`]
//! and [`control::TransportControl`]; nothing here talks to the OS directly.

pub mod artwork;
pub mod config;
pub mod control;
pub mod error;
pub mod estimator;
pub mod service;
pub mod snapshot;
pub mod source;

pub use nowplaying_types::{
    ArtworkField, ErrorRecord, NowPlayingResponse, PlaybackStatus, TrackSnapshot,
};

//! Collaborator seam for native media sessions.
//!
//! Platform backends implement [`MediaSessionSource`]; the core only sees the raw
//! observations they produce.

use std::fmt;
use std::time::Instant;

use nowplaying_types::PlaybackStatus;

use crate::artwork::{ArtworkImage, TrackKey};
use crate::error::SessionError;

/// One reading of a session timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineSample {
    /// Reported position in seconds; `None` when the session has none.
    pub raw_position_secs: Option<f64>,
    /// Reported end of the track in seconds; `None` when unknown.
    pub end_position_secs: Option<f64>,
    pub status: PlaybackStatus,
    /// Monotonic time the sample was taken.
    pub observed_at: Instant,
}

impl TimelineSample {
    pub fn new(
        raw_position_secs: Option<f64>,
        end_position_secs: Option<f64>,
        status: PlaybackStatus,
        observed_at: Instant,
    ) -> Self {
        Self {
            raw_position_secs,
            end_position_secs,
            status,
            observed_at,
        }
    }

    /// Position, if it carries information. Zero, negative and NaN readings count
    /// as unknown.
    pub fn known_position(&self) -> Option<f64> {
        self.raw_position_secs.filter(|v| usable_seconds(*v))
    }

    /// Track end, if reported.
    pub fn known_end(&self) -> Option<f64> {
        self.end_position_secs.filter(|v| usable_seconds(*v))
    }
}

fn usable_seconds(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Title/artist pair of the current track.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
}

impl TrackMetadata {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    pub fn track_key(&self) -> TrackKey {
        TrackKey::new(&self.title, &self.artist)
    }
}

/// Lazily fetches the artwork of the observed track. Only invoked on track changes.
pub type ArtworkFetcher = Box<dyn FnOnce() -> anyhow::Result<ArtworkImage> + Send>;

/// Everything a single session query returns.
pub struct RawObservation {
    /// Stable id of the session (player name); one estimator is kept per id.
    pub session_id: String,
    pub metadata: TrackMetadata,
    pub timeline: TimelineSample,
    pub artwork: ArtworkFetcher,
}

impl fmt::Debug for RawObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawObservation")
            .field("session_id", &self.session_id)
            .field("metadata", &self.metadata)
            .field("timeline", &self.timeline)
            .finish_non_exhaustive()
    }
}

/// A native media session backend.
pub trait MediaSessionSource {
    /// Read the current session. Returns [`SessionError::NoActiveSession`] when no
    /// player is active.
    fn query(&mut self) -> Result<RawObservation, SessionError>;
}

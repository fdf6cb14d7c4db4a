//! Snapshot assembly and clock formatting.

use nowplaying_types::{ArtworkField, PlaybackStatus, TrackSnapshot};

use crate::artwork::ArtworkDecision;
use crate::estimator::PositionEstimate;
use crate::source::TrackMetadata;

/// Format seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so long tracks read like `125:07`.
/// Negative and non-finite input formats as `00:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Merge metadata, position estimate and artwork decision into a snapshot.
pub fn assemble(
    metadata: &TrackMetadata,
    status: PlaybackStatus,
    estimate: PositionEstimate,
    artwork: ArtworkDecision,
) -> TrackSnapshot {
    TrackSnapshot {
        title: metadata.title.clone(),
        artist: metadata.artist.clone(),
        duration: format_clock(estimate.duration_secs),
        current_position: format_clock(estimate.position_secs),
        raw_duration_seconds: estimate.duration_secs,
        raw_position_seconds: estimate.position_secs,
        playback_status: status,
        artwork: artwork_field(artwork),
    }
}

fn artwork_field(decision: ArtworkDecision) -> ArtworkField {
    match decision {
        ArtworkDecision::Cleared | ArtworkDecision::NewArtwork(None) => ArtworkField::Null,
        ArtworkDecision::NewArtwork(Some(encoded)) => ArtworkField::Present(encoded),
        ArtworkDecision::Unchanged => ArtworkField::Omitted,
    }
}

//! Transport control seam.
//!
//! Native backends only acknowledge that a request was issued; completion is never
//! confirmed, so every operation reports a plain "accepted" flag.

/// Playback commands for the active media session.
pub trait TransportControl {
    fn play(&self) -> bool;
    fn pause(&self) -> bool;
    fn next(&self) -> bool;
    fn previous(&self) -> bool;
    /// Seek to an absolute position in seconds.
    fn seek(&self, position_secs: f64) -> bool;
}

/// Seek after checking the target against the track.
///
/// Negative or non-finite targets are rejected, as are targets past `duration_secs`
/// when the duration is known (non-zero).
pub fn checked_seek<C: TransportControl + ?Sized>(
    control: &C,
    position_secs: f64,
    duration_secs: f64,
) -> bool {
    if !position_secs.is_finite() || position_secs < 0.0 {
        tracing::warn!(position = position_secs, "seek rejected: invalid position");
        return false;
    }
    if duration_secs > 0.0 && position_secs > duration_secs {
        tracing::warn!(
            position = position_secs,
            duration = duration_secs,
            "seek rejected: outside track"
        );
        return false;
    }
    control.seek(position_secs)
}

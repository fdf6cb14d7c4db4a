//! Playback position estimation between coarse timeline samples.
//!
//! Media sessions refresh their position counter at irregular, roughly
//! one-second intervals. The estimator advances a private anchor between those
//! refreshes so the reported position moves steadily while playing, and freezes
//! it at the moment playback pauses.

use std::time::Instant;

use nowplaying_types::PlaybackStatus;

use crate::config::EstimatorConfig;
use crate::source::TimelineSample;

/// Estimated position and total duration, in seconds.
///
/// `duration_secs` is `0.0` until the session reports a duration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionEstimate {
    pub position_secs: f64,
    pub duration_secs: f64,
}

#[derive(Clone, Copy, Debug)]
struct Anchor {
    time: Instant,
    position: f64,
}

#[derive(Debug, Default)]
struct EstimatorState {
    /// `None` until the first sample with a usable position.
    anchor: Option<Anchor>,
    last_raw_position: f64,
    total_duration: Option<f64>,
    last_status: PlaybackStatus,
    paused_position: Option<f64>,
}

/// Position estimator for one media session.
///
/// Calls must be serialized per session; the estimator has no locking of its own.
#[derive(Debug, Default)]
pub struct PositionEstimator {
    config: EstimatorConfig,
    state: EstimatorState,
}

impl PositionEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config: config.sanitized(),
            state: EstimatorState::default(),
        }
    }

    /// Fold a new sample into the estimate.
    pub fn update(&mut self, sample: &TimelineSample) -> PositionEstimate {
        let Some(raw) = sample.known_position() else {
            // Nothing usable in this sample; state stays untouched.
            return self.estimate(0.0);
        };
        if let Some(end) = sample.known_end() {
            self.state.total_duration = Some(end);
        }

        let now = sample.observed_at;
        let status = sample.status;
        let Some(anchor) = self.state.anchor.as_mut() else {
            self.state.anchor = Some(Anchor {
                time: now,
                position: raw,
            });
            self.state.last_raw_position = raw;
            self.state.last_status = status;
            return self.estimate(raw);
        };

        let was_playing = self.state.last_status.is_playing();
        let position = match (was_playing, status.is_playing()) {
            (false, true) => {
                // Resume from the frozen position; the first raw sample after a
                // resume is usually stale.
                anchor.time = now;
                anchor.position = self.state.paused_position.take().unwrap_or(raw);
                self.state.last_raw_position = raw;
                tracing::debug!(position = anchor.position, "playback resumed");
                anchor.position
            }
            (true, false) => {
                // Measured from the last start or resume.
                let elapsed = now.saturating_duration_since(anchor.time).as_secs_f64();
                let paused = clamp_position(anchor.position + elapsed, self.state.total_duration);
                self.state.paused_position = Some(paused);
                tracing::debug!(position = paused, status = %status, "playback paused");
                paused
            }
            (true, true) => {
                if raw == self.state.last_raw_position {
                    anchor.position += self.config.extrapolation_step_secs;
                } else {
                    anchor.position = raw + self.config.lookahead_secs;
                    self.state.last_raw_position = raw;
                }
                anchor.position
            }
            (false, false) => self
                .state
                .paused_position
                .unwrap_or(self.state.last_raw_position),
        };
        self.state.last_status = status;
        self.estimate(position)
    }

    fn estimate(&self, position: f64) -> PositionEstimate {
        PositionEstimate {
            position_secs: clamp_position(position, self.state.total_duration),
            duration_secs: self.state.total_duration.unwrap_or(0.0),
        }
    }
}

/// Clamp to `[0, total]`; the upper bound only applies once a duration is known.
fn clamp_position(value: f64, total: Option<f64>) -> f64 {
    let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
    match total {
        Some(total) => value.min(total),
        None => value,
    }
}

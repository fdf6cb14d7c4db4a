//! Snapshot entry point.
//!
//! Wires a session source to the estimator, artwork cache and assembler.

use std::collections::HashMap;
use std::sync::Arc;

use nowplaying_types::{ErrorRecord, NowPlayingResponse, TrackSnapshot};

use crate::artwork::ArtworkCache;
use crate::config::EstimatorConfig;
use crate::error::SessionError;
use crate::estimator::PositionEstimator;
use crate::snapshot::assemble;
use crate::source::{MediaSessionSource, RawObservation};

/// Produces snapshots for polling consumers.
///
/// Keeps one [`PositionEstimator`] per session id and shares the artwork cache
/// with whoever else holds the handle.
pub struct NowPlayingService<S> {
    source: S,
    artwork: Arc<ArtworkCache>,
    config: EstimatorConfig,
    estimators: HashMap<String, PositionEstimator>,
}

impl<S: MediaSessionSource> NowPlayingService<S> {
    pub fn new(source: S, artwork: Arc<ArtworkCache>, config: EstimatorConfig) -> Self {
        Self {
            source,
            artwork,
            config,
            estimators: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Query the session and build a snapshot.
    pub fn current_snapshot(&mut self) -> Result<TrackSnapshot, SessionError> {
        let RawObservation {
            session_id,
            metadata,
            timeline,
            artwork,
        } = self.source.query()?;

        let config = self.config;
        let estimate = self
            .estimators
            .entry(session_id)
            .or_insert_with_key(|id| {
                tracing::info!(session = %id, "tracking media session");
                PositionEstimator::new(config)
            })
            .update(&timeline);
        let decision = self
            .artwork
            .observe(&metadata.track_key(), timeline.status, artwork);

        Ok(assemble(&metadata, timeline.status, estimate, decision))
    }

    /// Like [`Self::current_snapshot`], with failures folded into an error record.
    pub fn snapshot_response(&mut self) -> NowPlayingResponse {
        match self.current_snapshot() {
            Ok(snapshot) => NowPlayingResponse::Track(snapshot),
            Err(err) => {
                match &err {
                    SessionError::NoActiveSession => tracing::debug!("no active media session"),
                    SessionError::QueryFailed(msg) => {
                        tracing::warn!(error = %msg, "media session query failed")
                    }
                }
                NowPlayingResponse::Error(ErrorRecord::new(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artwork::ArtworkImage;
    use crate::source::{TimelineSample, TrackMetadata};
    use nowplaying_types::{ArtworkField, PlaybackStatus};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct ScriptedSource {
        base: Instant,
        steps: VecDeque<Result<Step, SessionError>>,
        fetches: Arc<AtomicUsize>,
    }

    struct Step {
        session: &'static str,
        title: &'static str,
        artist: &'static str,
        at_secs: f64,
        raw: f64,
        status: PlaybackStatus,
    }

    fn step(at_secs: f64, raw: f64, status: PlaybackStatus) -> Result<Step, SessionError> {
        Ok(Step {
            session: "player",
            title: "A",
            artist: "B",
            at_secs,
            raw,
            status,
        })
    }

    impl ScriptedSource {
        fn new(steps: Vec<Result<Step, SessionError>>) -> Self {
            Self {
                base: Instant::now(),
                steps: steps.into(),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl MediaSessionSource for ScriptedSource {
        fn query(&mut self) -> Result<RawObservation, SessionError> {
            let step = self
                .steps
                .pop_front()
                .unwrap_or(Err(SessionError::NoActiveSession))?;
            let fetches = self.fetches.clone();
            Ok(RawObservation {
                session_id: step.session.to_string(),
                metadata: TrackMetadata::new(step.title, step.artist),
                timeline: TimelineSample::new(
                    Some(step.raw),
                    Some(200.0),
                    step.status,
                    self.base + Duration::from_secs_f64(step.at_secs),
                ),
                artwork: Box::new(move || -> anyhow::Result<ArtworkImage> {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(ArtworkImage::new("image/png", vec![1, 2, 3]))
                }),
            })
        }
    }

    fn service(steps: Vec<Result<Step, SessionError>>) -> NowPlayingService<ScriptedSource> {
        NowPlayingService::new(
            ScriptedSource::new(steps),
            ArtworkCache::shared(),
            EstimatorConfig::default(),
        )
    }

    #[test]
    fn play_pause_stop_scenario() {
        use PlaybackStatus::*;
        let mut svc = service(vec![
            step(0.0, 10.0, Playing),
            step(1.0, 10.0, Playing),
            step(2.0, 11.0, Paused),
            step(3.0, 11.0, Stopped),
            step(4.0, 11.0, Stopped),
            step(5.0, 11.0, Playing),
        ]);
        let art = ArtworkField::Present("data:image/png;base64,AQID".to_string());

        let s1 = svc.current_snapshot().unwrap();
        assert_eq!(s1.raw_position_seconds, 10.0);
        assert_eq!(s1.raw_duration_seconds, 200.0);
        assert_eq!(s1.duration, "03:20");
        assert_eq!(s1.artwork, art);

        let s2 = svc.current_snapshot().unwrap();
        assert_eq!(s2.raw_position_seconds, 11.0);
        assert_eq!(s2.current_position, "00:11");
        assert_eq!(s2.artwork, ArtworkField::Omitted);

        let s3 = svc.current_snapshot().unwrap();
        assert_eq!(s3.playback_status, Paused);
        assert_eq!(s3.raw_position_seconds, 13.0);
        assert_eq!(s3.current_position, "00:13");
        assert_eq!(s3.artwork, ArtworkField::Omitted);

        let s4 = svc.current_snapshot().unwrap();
        assert_eq!(s4.raw_position_seconds, 13.0);
        assert_eq!(s4.artwork, ArtworkField::Null);
        let s5 = svc.current_snapshot().unwrap();
        assert_eq!(s5.artwork, ArtworkField::Null);
        assert_eq!(svc.source().fetches.load(Ordering::SeqCst), 1);

        let s6 = svc.current_snapshot().unwrap();
        assert_eq!(s6.raw_position_seconds, 13.0);
        assert_eq!(s6.artwork, art);
        assert_eq!(svc.source().fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_session_becomes_error_record() {
        let mut svc = service(vec![Err(SessionError::NoActiveSession)]);
        assert_eq!(
            svc.snapshot_response(),
            NowPlayingResponse::Error(ErrorRecord::new("No media is currently playing"))
        );
    }

    #[test]
    fn query_failure_keeps_collaborator_message() {
        let mut svc = service(vec![Err(SessionError::QueryFailed(
            "playerctl exited with status 1".to_string(),
        ))]);
        let resp = svc.snapshot_response();
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"error":"playerctl exited with status 1"}"#
        );
    }

    #[test]
    fn sessions_keep_separate_timelines() {
        use PlaybackStatus::Playing;
        let mut steps = vec![step(0.0, 10.0, Playing)];
        steps.push(Ok(Step {
            session: "other",
            title: "C",
            artist: "D",
            at_secs: 0.5,
            raw: 90.0,
            status: Playing,
        }));
        steps.push(step(1.0, 10.0, Playing));
        let mut svc = service(steps);

        assert_eq!(svc.current_snapshot().unwrap().raw_position_seconds, 10.0);
        assert_eq!(svc.current_snapshot().unwrap().raw_position_seconds, 90.0);
        // Back on the first player: extrapolated from its own anchor.
        let snap = svc.current_snapshot().unwrap();
        assert_eq!(snap.raw_position_seconds, 11.0);
        assert_eq!(snap.title, "A");
    }
}

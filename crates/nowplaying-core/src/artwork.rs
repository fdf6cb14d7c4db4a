//! Track-keyed artwork delivery cache.
//!
//! Artwork is fetched and sent once per track change. Later snapshots of the same
//! track omit the field so consumers keep what they already have; stopping
//! playback clears it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use base64::{Engine as _, engine::general_purpose};
use nowplaying_types::PlaybackStatus;

const KEY_SEPARATOR: char = '\u{1f}';

/// Identity of "the same track": title and artist joined by a unit separator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrackKey(String);

impl TrackKey {
    pub fn new(title: &str, artist: &str) -> Self {
        Self(format!("{title}{KEY_SEPARATOR}{artist}"))
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.split_once(KEY_SEPARATOR) {
            Some((title, artist)) => write!(f, "{title}|{artist}"),
            None => f.write_str(&self.0),
        }
    }
}

/// Raw artwork bytes with their mime type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ArtworkImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Encode as a `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// What a snapshot should do with its artwork field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtworkDecision {
    /// Playback stopped; the consumer should drop its artwork.
    Cleared,
    /// The track changed; carries the encoded artwork, or `None` if it could not
    /// be fetched.
    NewArtwork(Option<String>),
    /// Same track as the last delivery; omit the field.
    Unchanged,
}

#[derive(Debug, Default)]
struct ArtworkCacheEntry {
    track_key: Option<TrackKey>,
    encoded_artwork: Option<String>,
    delivered: bool,
}

/// Process-wide artwork cache.
///
/// `observe` holds the lock for its whole duration, including the fetch, so a
/// track change triggers at most one fetch even with concurrent callers.
#[derive(Debug, Default)]
pub struct ArtworkCache {
    entry: Mutex<ArtworkCacheEntry>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Decide the artwork field for a snapshot of `key` in `status`.
    ///
    /// `fetch` is only invoked when the track differs from the cached one.
    pub fn observe<F>(&self, key: &TrackKey, status: PlaybackStatus, fetch: F) -> ArtworkDecision
    where
        F: FnOnce() -> anyhow::Result<ArtworkImage>,
    {
        let mut entry = self.lock();
        if status.is_stopped() {
            if entry.track_key.is_some() {
                tracing::debug!(status = %status, "artwork cleared");
            }
            *entry = ArtworkCacheEntry::default();
            return ArtworkDecision::Cleared;
        }
        if entry.delivered && entry.track_key.as_ref() == Some(key) {
            return ArtworkDecision::Unchanged;
        }

        let encoded = match fetch() {
            Ok(image) if image.data.is_empty() => {
                tracing::debug!(track = %key, "artwork fetch returned no data");
                None
            }
            Ok(image) => {
                tracing::debug!(
                    track = %key,
                    mime = %image.mime_type,
                    bytes = image.data.len(),
                    "artwork fetched"
                );
                Some(image.to_data_url())
            }
            Err(err) => {
                tracing::debug!(track = %key, error = %err, "artwork fetch failed");
                None
            }
        };
        *entry = ArtworkCacheEntry {
            track_key: Some(key.clone()),
            encoded_artwork: encoded.clone(),
            delivered: true,
        };
        ArtworkDecision::NewArtwork(encoded)
    }

    /// Artwork last delivered for the cached track, if any.
    pub fn current(&self) -> Option<String> {
        self.lock().encoded_artwork.clone()
    }

    fn lock(&self) -> MutexGuard<'_, ArtworkCacheEntry> {
        // Entries are replaced wholesale, so a panicking holder cannot leave one
        // half-written.
        self.entry.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("artwork cache lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn png() -> ArtworkImage {
        ArtworkImage::new("image/png", vec![1, 2, 3])
    }

    #[test]
    fn data_url_is_base64_encoded() {
        assert_eq!(png().to_data_url(), "data:image/png;base64,AQID");
    }

    #[test]
    fn track_key_separates_title_and_artist() {
        assert_eq!(TrackKey::new("A", "B"), TrackKey::new("A", "B"));
        assert_ne!(TrackKey::new("AB", ""), TrackKey::new("A", "B"));
        assert_eq!(TrackKey::new("A", "B").to_string(), "A|B");
    }

    #[test]
    fn same_track_fetches_once() {
        let cache = ArtworkCache::new();
        let key = TrackKey::new("A", "B");
        let calls = AtomicUsize::new(0);
        let fetch = || -> anyhow::Result<ArtworkImage> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(png())
        };

        let first = cache.observe(&key, PlaybackStatus::Playing, fetch);
        assert_eq!(
            first,
            ArtworkDecision::NewArtwork(Some("data:image/png;base64,AQID".to_string()))
        );
        let second = cache.observe(&key, PlaybackStatus::Playing, fetch);
        assert_eq!(second, ArtworkDecision::Unchanged);
        let paused = cache.observe(&key, PlaybackStatus::Paused, fetch);
        assert_eq!(paused, ArtworkDecision::Unchanged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.current().as_deref(),
            Some("data:image/png;base64,AQID")
        );
    }

    #[test]
    fn stop_clears_and_next_play_refetches() {
        let cache = ArtworkCache::new();
        let key = TrackKey::new("A", "B");
        let calls = AtomicUsize::new(0);
        let fetch = || -> anyhow::Result<ArtworkImage> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(png())
        };

        cache.observe(&key, PlaybackStatus::Playing, fetch);
        assert_eq!(
            cache.observe(&key, PlaybackStatus::Stopped, fetch),
            ArtworkDecision::Cleared
        );
        assert_eq!(cache.current(), None);
        assert!(matches!(
            cache.observe(&key, PlaybackStatus::Playing, fetch),
            ArtworkDecision::NewArtwork(Some(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn closed_clears_without_fetching() {
        let cache = ArtworkCache::new();
        let key = TrackKey::new("A", "B");
        let decision = cache.observe(&key, PlaybackStatus::Closed, || {
            panic!("fetch must not run for a closed session")
        });
        assert_eq!(decision, ArtworkDecision::Cleared);
    }

    #[test]
    fn failed_fetch_delivers_null_once() {
        let cache = ArtworkCache::new();
        let key = TrackKey::new("A", "B");
        let calls = AtomicUsize::new(0);
        let fetch = || -> anyhow::Result<ArtworkImage> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("no art url"))
        };

        assert_eq!(
            cache.observe(&key, PlaybackStatus::Playing, fetch),
            ArtworkDecision::NewArtwork(None)
        );
        assert_eq!(
            cache.observe(&key, PlaybackStatus::Playing, fetch),
            ArtworkDecision::Unchanged
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_image_counts_as_missing() {
        let cache = ArtworkCache::new();
        let decision = cache.observe(&TrackKey::new("A", "B"), PlaybackStatus::Playing, || {
            Ok(ArtworkImage::new("image/jpeg", Vec::new()))
        });
        assert_eq!(decision, ArtworkDecision::NewArtwork(None));
    }

    #[test]
    fn track_change_replaces_entry() {
        let cache = ArtworkCache::new();
        cache.observe(&TrackKey::new("A", "B"), PlaybackStatus::Playing, || Ok(png()));
        let decision = cache.observe(&TrackKey::new("C", "B"), PlaybackStatus::Playing, || {
            Ok(ArtworkImage::new("image/jpeg", vec![0xff]))
        });
        assert_eq!(
            decision,
            ArtworkDecision::NewArtwork(Some("data:image/jpeg;base64,/w==".to_string()))
        );
    }

    #[test]
    fn concurrent_observers_share_one_fetch() {
        let cache = ArtworkCache::shared();
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                std::thread::spawn(move || {
                    cache.observe(&TrackKey::new("A", "B"), PlaybackStatus::Playing, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        std::thread::sleep(Duration::from_millis(20));
                        Ok(png())
                    })
                })
            })
            .collect();

        let decisions: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let fresh = decisions
            .iter()
            .filter(|d| matches!(d, ArtworkDecision::NewArtwork(_)))
            .count();
        assert_eq!(fresh, 1);
        assert_eq!(
            decisions
                .iter()
                .filter(|d| **d == ArtworkDecision::Unchanged)
                .count(),
            7
        );
    }
}

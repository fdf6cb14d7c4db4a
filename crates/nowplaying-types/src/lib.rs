use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Playback state reported by a media session.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    Stopped,
    /// The session went away (player closed).
    Closed,
    /// The session is switching tracks or buffering.
    Changing,
    #[default]
    Unknown,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }

    /// `true` for states that end the current track (artwork is cleared).
    pub fn is_stopped(self) -> bool {
        matches!(self, PlaybackStatus::Stopped | PlaybackStatus::Closed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Closed => "Closed",
            PlaybackStatus::Changing => "Changing",
            PlaybackStatus::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artwork slot of a snapshot.
///
/// `Omitted` is distinct from `Null`: an omitted field tells the consumer to keep
/// whatever artwork it last received, while `Null` tells it to clear it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ArtworkField {
    /// Encoded artwork (a `data:` URL).
    Present(String),
    Null,
    #[default]
    Omitted,
}

impl ArtworkField {
    pub fn is_omitted(&self) -> bool {
        matches!(self, ArtworkField::Omitted)
    }
}

impl Serialize for ArtworkField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArtworkField::Present(value) => serializer.serialize_str(value),
            ArtworkField::Null | ArtworkField::Omitted => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for ArtworkField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(match value {
            Some(value) => ArtworkField::Present(value),
            None => ArtworkField::Null,
        })
    }
}

/// "Now playing" record handed to polling consumers.
///
/// Field names are part of the downstream contract.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackSnapshot {
    /// Track title as reported by the session.
    pub title: String,
    /// Track artist as reported by the session.
    pub artist: String,
    /// Total duration as `MM:SS`.
    pub duration: String,
    /// Estimated position as `MM:SS`.
    pub current_position: String,
    /// Total duration in seconds (`0.0` when unknown).
    pub raw_duration_seconds: f64,
    /// Estimated position in seconds.
    pub raw_position_seconds: f64,
    pub playback_status: PlaybackStatus,
    /// Artwork update; skipped entirely when unchanged since the last delivery.
    #[serde(default, skip_serializing_if = "ArtworkField::is_omitted")]
    pub artwork: ArtworkField,
}

/// Error payload returned instead of a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRecord {
    pub error: String,
}

impl ErrorRecord {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Either a snapshot or an error record, serialized without a wrapper tag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NowPlayingResponse {
    Track(TrackSnapshot),
    Error(ErrorRecord),
}

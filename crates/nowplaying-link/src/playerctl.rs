//! `playerctl`-backed media session (MPRIS on Linux).

use std::path::Path;
use std::process::{Command, Output};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use nowplaying_core::artwork::ArtworkImage;
use nowplaying_core::control::TransportControl;
use nowplaying_core::error::SessionError;
use nowplaying_core::source::{MediaSessionSource, RawObservation, TimelineSample, TrackMetadata};
use nowplaying_types::PlaybackStatus;

use crate::config::ArtworkSettings;

const PLAYERCTL: &str = "playerctl";
const NO_PLAYERS: &str = "No players found";
const METADATA_FORMAT: &str =
    "{{playerName}}\t{{title}}\t{{artist}}\t{{mpris:artUrl}}\t{{mpris:length}}\t{{position}}";
const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Thin wrapper around the `playerctl` executable.
#[derive(Clone, Debug, Default)]
pub struct Playerctl {
    player: Option<String>,
}

impl Playerctl {
    pub fn new(player: Option<String>) -> Self {
        Self { player }
    }

    /// `true` when the executable can be spawned.
    pub fn is_installed() -> bool {
        Command::new(PLAYERCTL)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn output(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(PLAYERCTL);
        if let Some(player) = self.player.as_deref() {
            cmd.arg(format!("--player={player}"));
        }
        cmd.args(args)
            .output()
            .with_context(|| format!("run {PLAYERCTL} {}", args.join(" ")))
    }

    /// Run a command whose stdout is needed; maps "no players" to
    /// [`SessionError::NoActiveSession`].
    fn query(&self, args: &[&str]) -> Result<String, SessionError> {
        let out = self.output(args)?;
        let stdout = String::from_utf8_lossy(&out.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
        if stdout.contains(NO_PLAYERS) || stderr.contains(NO_PLAYERS) {
            return Err(SessionError::NoActiveSession);
        }
        if !out.status.success() {
            if stderr.is_empty() {
                return Err(SessionError::NoActiveSession);
            }
            return Err(SessionError::QueryFailed(format!(
                "{PLAYERCTL} {} failed: {stderr}",
                args.join(" ")
            )));
        }
        Ok(stdout)
    }

    /// Fire a transport command; `true` when playerctl accepted it.
    fn request(&self, args: &[&str]) -> bool {
        match self.output(args) {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                tracing::warn!(
                    command = %args.join(" "),
                    status = %out.status,
                    stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                    "playerctl command rejected"
                );
                false
            }
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "playerctl command failed");
                false
            }
        }
    }
}

/// One parsed `playerctl metadata --format` line.
#[derive(Debug, Clone, PartialEq)]
struct MetadataLine {
    player_name: String,
    title: String,
    artist: String,
    art_url: Option<String>,
    length_secs: Option<f64>,
    position_secs: Option<f64>,
}

fn parse_metadata_line(line: &str) -> Result<MetadataLine> {
    let fields: Vec<&str> = line.splitn(6, '\t').collect();
    let [player_name, title, artist, art_url, length, position] = fields.as_slice() else {
        bail!("unexpected playerctl metadata output: {line:?}");
    };
    Ok(MetadataLine {
        player_name: player_name.trim().to_string(),
        title: title.trim().to_string(),
        artist: artist.trim().to_string(),
        art_url: Some(art_url.trim())
            .filter(|url| !url.is_empty())
            .map(str::to_string),
        length_secs: micros_to_secs(length),
        position_secs: micros_to_secs(position),
    })
}

fn micros_to_secs(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .map(|micros| micros / MICROS_PER_SEC)
}

fn parse_status(value: &str) -> PlaybackStatus {
    match value.trim() {
        "Playing" => PlaybackStatus::Playing,
        "Paused" => PlaybackStatus::Paused,
        "Stopped" => PlaybackStatus::Stopped,
        _ => PlaybackStatus::Unknown,
    }
}

/// Media session source reading the active MPRIS player through playerctl.
pub struct PlayerctlSource {
    ctl: Playerctl,
    agent: ureq::Agent,
    max_artwork_bytes: usize,
}

impl PlayerctlSource {
    pub fn new(ctl: Playerctl, artwork: &ArtworkSettings) -> Self {
        let config = ureq::Agent::config_builder()
            .user_agent(artwork.user_agent.as_str())
            .timeout_global(Some(artwork.timeout))
            .build();
        Self {
            ctl,
            agent: ureq::Agent::new_with_config(config),
            max_artwork_bytes: artwork.max_bytes,
        }
    }
}

impl MediaSessionSource for PlayerctlSource {
    fn query(&mut self) -> Result<RawObservation, SessionError> {
        let status = self.ctl.query(&["status"])?;
        if status.trim().is_empty() {
            return Err(SessionError::NoActiveSession);
        }
        let status = parse_status(&status);

        let line = self.ctl.query(&["metadata", "--format", METADATA_FORMAT])?;
        let observed_at = Instant::now();
        let meta = parse_metadata_line(&line)?;

        let agent = self.agent.clone();
        let max_bytes = self.max_artwork_bytes;
        let art_url = meta.art_url;
        Ok(RawObservation {
            session_id: meta.player_name,
            metadata: TrackMetadata::new(meta.title, meta.artist),
            timeline: TimelineSample::new(meta.position_secs, meta.length_secs, status, observed_at),
            artwork: Box::new(move || -> Result<ArtworkImage> {
                let url = art_url.ok_or_else(|| anyhow!("player reports no artwork"))?;
                fetch_artwork(&agent, &url, max_bytes)
            }),
        })
    }
}

/// Load artwork from a `file://` or `http(s)://` URL.
fn fetch_artwork(agent: &ureq::Agent, url: &str, max_bytes: usize) -> Result<ArtworkImage> {
    if let Some(path) = url.strip_prefix("file://") {
        let path = urlencoding::decode(path).with_context(|| format!("decode artwork url {url}"))?;
        return read_artwork_file(Path::new(path.as_ref()), max_bytes);
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        let resp = agent
            .get(url)
            .call()
            .with_context(|| format!("artwork request {url}"))?;
        let mime_type = resp
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = resp
            .into_body()
            .with_config()
            .limit(max_bytes as u64)
            .read_to_vec()
            .context("artwork read failed")?;
        return Ok(ArtworkImage::new(mime_type, data));
    }
    bail!("unsupported artwork url {url}")
}

fn read_artwork_file(path: &Path, max_bytes: usize) -> Result<ArtworkImage> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("stat artwork {:?}", path))?
        .len();
    if len > max_bytes as u64 {
        bail!("artwork {:?} exceeds {} bytes", path, max_bytes);
    }
    let data = std::fs::read(path).with_context(|| format!("read artwork {:?}", path))?;
    let mime_type = mime_for_extension(path.extension()).unwrap_or("application/octet-stream");
    Ok(ArtworkImage::new(mime_type, data))
}

fn mime_for_extension(ext: Option<&std::ffi::OsStr>) -> Option<&'static str> {
    let ext = ext?.to_string_lossy().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Transport control through playerctl.
#[derive(Clone, Debug, Default)]
pub struct PlayerctlControl {
    ctl: Playerctl,
}

impl PlayerctlControl {
    pub fn new(ctl: Playerctl) -> Self {
        Self { ctl }
    }
}

impl TransportControl for PlayerctlControl {
    fn play(&self) -> bool {
        self.ctl.request(&["play"])
    }

    fn pause(&self) -> bool {
        self.ctl.request(&["pause"])
    }

    fn next(&self) -> bool {
        self.ctl.request(&["next"])
    }

    fn previous(&self) -> bool {
        self.ctl.request(&["previous"])
    }

    fn seek(&self, position_secs: f64) -> bool {
        self.ctl.request(&["position", &format!("{position_secs:.3}")])
    }
}

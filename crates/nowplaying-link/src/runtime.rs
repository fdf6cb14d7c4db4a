//! Link runtime helpers.
//!
//! Builds the snapshot service from resolved settings and drives the one-shot,
//! watch and transport commands.

use std::io::Write;

use anyhow::{Context, Result};
use crossbeam_channel::select;
use nowplaying_core::artwork::ArtworkCache;
use nowplaying_core::control::{TransportControl, checked_seek};
use nowplaying_core::service::NowPlayingService;
use nowplaying_core::source::MediaSessionSource;
use nowplaying_types::NowPlayingResponse;

use crate::config::LinkSettings;
use crate::playerctl::{Playerctl, PlayerctlControl, PlayerctlSource};

/// Transport command requested on the command line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransportAction {
    Play,
    Pause,
    Next,
    Previous,
    Seek(f64),
}

fn playerctl(settings: &LinkSettings) -> Playerctl {
    if !Playerctl::is_installed() {
        tracing::warn!("playerctl is not installed; media commands will fail");
    }
    Playerctl::new(settings.player.clone())
}

fn build_service(settings: &LinkSettings) -> NowPlayingService<PlayerctlSource> {
    let source = PlayerctlSource::new(playerctl(settings), &settings.artwork);
    NowPlayingService::new(source, ArtworkCache::shared(), settings.estimator)
}

/// Write one response as a JSON line.
pub fn write_response<W: Write>(out: &mut W, response: &NowPlayingResponse) -> Result<()> {
    serde_json::to_writer(&mut *out, response).context("encode snapshot")?;
    writeln!(out).context("write snapshot")?;
    out.flush().context("flush snapshot")?;
    Ok(())
}

/// Print a single snapshot to stdout.
pub fn run_snapshot(settings: &LinkSettings) -> Result<()> {
    let mut service = build_service(settings);
    let response = service.snapshot_response();
    write_response(&mut std::io::stdout().lock(), &response)
}

/// Poll at the configured interval until Ctrl-C.
pub fn run_watch(settings: &LinkSettings) -> Result<()> {
    let mut service = build_service(settings);
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("install ctrl-c handler")?;

    tracing::info!(
        interval_ms = settings.poll_interval.as_millis() as u64,
        player = settings.player.as_deref().unwrap_or("any"),
        "watching media session"
    );
    let ticker = crossbeam_channel::tick(settings.poll_interval);
    let stdout = std::io::stdout();
    write_response(&mut stdout.lock(), &service.snapshot_response())?;
    loop {
        select! {
            recv(ticker) -> _ => {
                write_response(&mut stdout.lock(), &service.snapshot_response())?;
            }
            recv(stop_rx) -> _ => {
                tracing::info!("watch stopped");
                break;
            }
        }
    }
    Ok(())
}

/// Issue a transport command. Returns whether it was accepted.
pub fn run_transport(settings: &LinkSettings, action: TransportAction) -> bool {
    let control = PlayerctlControl::new(playerctl(settings));
    let accepted = match action {
        TransportAction::Seek(position) => {
            let mut source = PlayerctlSource::new(playerctl(settings), &settings.artwork);
            seek_in_session(&mut source, &control, position)
        }
        other => dispatch(&control, other),
    };
    tracing::info!(action = ?action, accepted, "transport command");
    accepted
}

/// Seek within the current track's bounds. The artwork fetcher of the
/// observation is dropped unused.
fn seek_in_session<S, C>(source: &mut S, control: &C, position: f64) -> bool
where
    S: MediaSessionSource + ?Sized,
    C: TransportControl + ?Sized,
{
    let duration = match source.query() {
        Ok(observation) => observation.timeline.known_end().unwrap_or(0.0),
        Err(err) => {
            tracing::debug!(error = %err, "no duration for seek");
            0.0
        }
    };
    checked_seek(control, position, duration)
}

fn dispatch<C: TransportControl + ?Sized>(control: &C, action: TransportAction) -> bool {
    match action {
        TransportAction::Play => control.play(),
        TransportAction::Pause => control.pause(),
        TransportAction::Next => control.next(),
        TransportAction::Previous => control.previous(),
        TransportAction::Seek(position) => control.seek(position),
    }
}

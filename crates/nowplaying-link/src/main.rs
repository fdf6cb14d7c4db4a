//! nowplaying-link: prints "now playing" snapshots of the active media session
//! as JSON lines and forwards transport commands to it.
//!
//! ## Commands
//! - `snapshot`: print one snapshot.
//! - `watch`: poll on a fixed interval, one JSON line per tick, until Ctrl-C.
//! - `play`, `pause`, `next`, `previous`, `seek <SECONDS>`: transport control;
//!   the exit status tells whether the player accepted the request.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use nowplaying_link::cli::{Args, Command};
use nowplaying_link::config::{LinkConfig, LinkSettings};
use nowplaying_link::runtime::{self, TransportAction};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,nowplaying_link=info,nowplaying_core=info")
        }))
        .init();

    let cfg = LinkConfig::load_optional(args.config.as_deref())?;
    let interval_override = match &args.cmd {
        Command::Watch { interval_ms } => *interval_ms,
        _ => None,
    };
    let settings = LinkSettings::resolve(&cfg, args.player.clone(), interval_override);

    let action = match args.cmd {
        Command::Snapshot => {
            runtime::run_snapshot(&settings)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Watch { .. } => {
            runtime::run_watch(&settings)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Play => TransportAction::Play,
        Command::Pause => TransportAction::Pause,
        Command::Next => TransportAction::Next,
        Command::Previous => TransportAction::Previous,
        Command::Seek { seconds } => TransportAction::Seek(seconds),
    };

    if runtime::run_transport(&settings, action) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ", ",
    env!("BUILD_TARGET"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "nowplaying-link", version = VERSION)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to a TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Only talk to this player (passed to playerctl --player)
    #[arg(long)]
    pub player: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print one now-playing snapshot as JSON
    Snapshot,

    /// Poll the session and print one JSON snapshot per tick
    Watch {
        /// Poll interval in milliseconds (overrides the config file)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Resume playback
    Play,

    /// Pause playback
    Pause,

    /// Skip to the next track
    Next,

    /// Go back to the previous track
    Previous,

    /// Seek to an absolute position
    Seek {
        /// Target position in seconds
        #[arg(allow_negative_numbers = true)]
        seconds: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_watch_with_overrides() {
        let args = Args::try_parse_from([
            "nowplaying-link",
            "--player",
            "spotify",
            "watch",
            "--interval-ms",
            "500",
        ])
        .unwrap();
        assert_eq!(args.player.as_deref(), Some("spotify"));
        assert!(matches!(
            args.cmd,
            Command::Watch {
                interval_ms: Some(500)
            }
        ));
    }

    #[test]
    fn seek_accepts_fractional_seconds() {
        let args = Args::try_parse_from(["nowplaying-link", "seek", "42.5"]).unwrap();
        match args.cmd {
            Command::Seek { seconds } => assert_eq!(seconds, 42.5),
            other => panic!("unexpected command {other:?}"),
        }
    }
}

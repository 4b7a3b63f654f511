use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::session::{MediaDirection, MediaOptions, SessionConfig};
use crate::telemetry::{LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "brook",
    about = "Negotiate WebRTC media sessions with a streaming server",
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "BROOK_SERVER",
        default_value = "ws://127.0.0.1:8000",
        help = "Base URL of the signaling server (ws, wss, http or https)"
    )]
    pub server: String,

    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Variant,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        value_enum,
        env = "BROOK_LOG_LEVEL",
        default_value_t = LogLevel::Info,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        env = "BROOK_LOG_FILE",
        help = "Write logs to the specified file instead of stderr"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Variant {
    /// Send local media to the server and play the echoed stream back
    Loopback(LoopbackArgs),
    /// Have the server pull an upstream source and stream it to us
    Ingest(IngestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LoopbackArgs {
    #[arg(long, help = "Negotiate without an audio track")]
    pub no_audio: bool,

    #[arg(long, help = "Negotiate without a video track")]
    pub no_video: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(
        value_name = "URL",
        help = "Source URL announced to the server, e.g. rtsp://host/stream"
    )]
    pub url: String,
}

impl Variant {
    /// Signaling endpoint path for this variant.
    pub fn ws_path(&self) -> &'static str {
        match self {
            Variant::Loopback(_) => "/ws/loopback/",
            Variant::Ingest(_) => "/ws/rtsp/",
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        match self {
            Variant::Loopback(args) => SessionConfig {
                media: MediaOptions {
                    audio: !args.no_audio,
                    video: !args.no_video,
                    direction: MediaDirection::SendRecv,
                },
                source: None,
            },
            Variant::Ingest(args) => SessionConfig::ingest(args.url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn loopback_defaults_to_audio_and_video() {
        let cli = Cli::parse_from(["brook", "loopback"]);
        let config = cli.command.session_config();
        assert!(config.media.audio);
        assert!(config.media.video);
        assert_eq!(config.media.direction, MediaDirection::SendRecv);
        assert!(config.source.is_none());
        assert_eq!(cli.command.ws_path(), "/ws/loopback/");
    }

    #[test]
    fn ingest_carries_the_source_url() {
        let cli = Cli::parse_from(["brook", "ingest", "rtsp://host/stream"]);
        let config = cli.command.session_config();
        assert_eq!(config.source.as_deref(), Some("rtsp://host/stream"));
        assert_eq!(config.media.direction, MediaDirection::RecvOnly);
        assert_eq!(cli.command.ws_path(), "/ws/rtsp/");
    }

    #[test]
    fn track_flags_disable_kinds() {
        let cli = Cli::parse_from(["brook", "loopback", "--no-audio"]);
        let config = cli.command.session_config();
        assert!(!config.media.audio);
        assert!(config.media.video);
    }
}

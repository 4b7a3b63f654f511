use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use brook_core::cli::Cli;
use brook_core::client::CallClient;
use brook_core::engine::webrtc::WebRtcEngine;
use brook_core::session::PlaybackSink;
use brook_core::telemetry;
use brook_core::transport::websocket::{self, WebSocketSignaling};
use brook_core::transport::MessageSender;

/// Stand-in for a real video surface: announces playback on stdout.
struct StdoutPlayback;

impl PlaybackSink for StdoutPlayback {
    fn start_remote_playback(&mut self) {
        println!("remote stream is playing");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(&cli.logging.to_config())?;

    let endpoint = websocket::endpoint_url(&cli.server, cli.command.ws_path())?;
    let (channel, inbound) = WebSocketSignaling::connect(&endpoint).await?;

    let outbound: Arc<dyn MessageSender> = channel.clone();
    let client = CallClient::spawn(
        WebRtcEngine::with_default_servers(),
        outbound,
        inbound,
        Box::new(StdoutPlayback),
        cli.command.session_config(),
    );

    let mut state_rx = client.state_changes();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow_and_update();
            println!("session state: {state}");
        }
    });

    println!("commands: start | stop | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "start" => client.start(),
            "stop" => client.stop(),
            "quit" | "exit" => break,
            "" => {}
            other => eprintln!("unknown command: {other}"),
        }
    }

    client.shutdown();
    client.join().await;
    channel.close();
    Ok(())
}

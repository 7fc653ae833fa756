//! Nearer command-line client
//!
//! Follows the server's event stream and prints what happens to the shared
//! queue, while reading commands from stdin:
//!
//! ```text
//! user NAME    set your display name
//! add REF      queue a track
//! next         skip the current track
//! pause        pause or resume
//! queue        show the queue
//! quit         leave
//! ```

mod client;
mod sse;

use anyhow::{Context, Result};
use clap::Parser;
use client::ApiClient;
use futures::StreamExt;
use nearer_common::events::index_from_wire;
use nearer_common::{render_queue, NearerEvent};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Command-line arguments for nearer-cli
#[derive(Parser, Debug)]
#[command(name = "nearer-cli")]
#[command(about = "Interactive client for a Nearer queue server")]
#[command(version)]
struct Args {
    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000", env = "NEARER_SERVER")]
    server: String,

    /// Display name to identify with on connect
    #[arg(short, long, env = "NEARER_USER")]
    user: Option<String>,
}

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Send(&'a str, Option<&'a str>),
    Queue,
    Quit,
    Help,
}

fn parse_input(line: &str) -> Option<Input<'_>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim())),
        None => (line, None),
    };
    Some(match (name, arg) {
        ("quit" | "exit", _) => Input::Quit,
        ("queue", _) => Input::Queue,
        ("user" | "add", Some(arg)) if !arg.is_empty() => Input::Send(name, Some(arg)),
        ("next" | "pause", _) => Input::Send(name, None),
        _ => Input::Help,
    })
}

fn describe(event: &NearerEvent) -> Option<String> {
    match event {
        NearerEvent::Session(_) => None,
        NearerEvent::Init(init) => Some(format!(
            "connected: {} tracks, {}",
            init.songs.len(),
            init.status
        )),
        NearerEvent::Added(added) => Some(format!(
            "{} added \"{}\" ({}s) [{}]",
            added.song.added_by, added.song.title, added.song.duration, added.status
        )),
        NearerEvent::Ended(ended) => Some(format!("song ended [{}]", ended.status)),
        NearerEvent::Status(status) => Some(format!(
            "{} {:.0}/{:.0}s",
            status.status,
            status.time as f64 / 1000.0,
            status.length as f64 / 1000.0
        )),
    }
}

/// Print events until the stream closes; reports the session id once known
async fn follow_events(response: reqwest::Response, session_tx: oneshot::Sender<Uuid>) {
    let mut session_tx = Some(session_tx);
    let mut parser = sse::SseParser::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("Event stream error: {}", e);
                break;
            }
        };
        for frame in parser.feed(&chunk) {
            let event = match NearerEvent::from_parts(&frame.event, &frame.data) {
                Ok(event) => event,
                Err(e) => {
                    debug!(event = %frame.event, "Skipping unrecognized event: {}", e);
                    continue;
                }
            };
            if let NearerEvent::Session(session) = &event {
                if let Some(tx) = session_tx.take() {
                    let _ = tx.send(session.session_id);
                }
            }
            if let Some(line) = describe(&event) {
                println!("{}", line);
            }
        }
    }
    println!("disconnected from server");
}

async fn run_command(client: &ApiClient, session: Uuid, name: &str, arg: Option<&str>) {
    match client.command(session, name, arg).await {
        Ok(reply) if reply.status == "ignored" => {
            println!("ignored: {}", reply.reason.unwrap_or_default());
        }
        Ok(_) => {}
        Err(e) => println!("error: {:#}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nearer_cli=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let client = ApiClient::new(&args.server);

    let events = client.open_events().await?;
    let (session_tx, session_rx) = oneshot::channel();
    let follower = tokio::spawn(follow_events(events, session_tx));

    let session = tokio::time::timeout(Duration::from_secs(10), session_rx)
        .await
        .context("Server did not announce a session")?
        .context("Event stream closed before announcing a session")?;
    debug!(%session, "Session established");

    if let Some(user) = &args.user {
        run_command(&client, session, "user", Some(user)).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_input(&line) {
            None => {}
            Some(Input::Quit) => break,
            Some(Input::Help) => {
                println!("commands: user NAME | add REF | next | pause | queue | quit");
            }
            Some(Input::Queue) => match client.queue().await {
                Ok(snapshot) => print!(
                    "{}",
                    render_queue(&snapshot.songs, index_from_wire(snapshot.current_song_idx))
                ),
                Err(e) => println!("error: {:#}", e),
            },
            Some(Input::Send(name, arg)) => run_command(&client, session, name, arg).await,
        }
    }

    follower.abort();
    Ok(())
}

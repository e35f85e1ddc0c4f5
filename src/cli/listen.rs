//! `kindred listen`: print what the server pushes.

use clap::Subcommand;
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};
use crate::realtime::{
    ChannelEvent, EventStream, EventStreamOptions, InboundPayload, PushChannel, ReconnectState,
    SseEvent, SseMessage,
};
use crate::utils::url::with_token_param;

#[derive(Subcommand, Debug)]
pub enum ListenCommands {
    /// Subscribe to the WebSocket push channel
    Ws {
        /// Override the configured ws-url
        #[arg(long)]
        url: Option<String>,
        /// Stop after this many messages
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Subscribe to the server-sent event stream
    Sse {
        /// Override the configured events-url
        #[arg(long)]
        url: Option<String>,
        /// Do not attach the access token to the URL
        #[arg(long)]
        anonymous: bool,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
}

pub async fn run(ctx: &CliContext, command: ListenCommands) -> CliResult {
    match command {
        ListenCommands::Ws { url, count } => {
            let url = url.unwrap_or_else(|| ctx.endpoints.ws_url.clone());
            let url = match ctx.state.session.access_token() {
                Some(token) => with_token_param(&url, &token)?,
                None => url,
            };
            let (channel, events) = PushChannel::connect(url, ctx.config.push_channel_options());
            let received = listen_ws(events, count).await;
            channel.disconnect();
            info!(received, "push channel listener finished");
            Ok(())
        }
        ListenCommands::Sse {
            url,
            anonymous,
            count,
        } => {
            let url = url.unwrap_or_else(|| ctx.endpoints.events_url.clone());
            let options = EventStreamOptions {
                with_credentials: !anonymous,
                access_token: ctx.state.session.access_token(),
            };
            let (stream, events) =
                EventStream::open(ctx.api.http_client().clone(), &url, options)?;
            let result = listen_sse(&stream, events, ctx, count).await;
            stream.disconnect();
            result
        }
    }
}

/// Returns the number of messages printed.
async fn listen_ws(
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    count: Option<usize>,
) -> usize {
    let mut received = 0;
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Opened => eprintln!("🔌 Connected"),
            ChannelEvent::Closed => eprintln!("🔌 Disconnected"),
            ChannelEvent::Error(err) => eprintln!("⚠️  {err}"),
            ChannelEvent::Message(payload) => {
                println!("{}", describe_payload(&payload));
                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
        }
    }
    received
}

/// The event stream does not retry by itself, so the configured reconnect
/// policy is applied here.
async fn listen_sse(
    stream: &EventStream,
    mut events: mpsc::UnboundedReceiver<SseEvent>,
    ctx: &CliContext,
    count: Option<usize>,
) -> CliResult {
    let options = ctx.config.push_channel_options();
    let mut reconnect = ReconnectState::default();
    let mut received = 0;

    while let Some(event) = events.recv().await {
        match event {
            SseEvent::Opened => {
                reconnect.on_open();
                eprintln!("🔌 Connected");
            }
            SseEvent::Message(message) => {
                println!("{}", describe_sse(&message));
                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            SseEvent::Error(err) => {
                eprintln!("⚠️  {err}");
                match reconnect.next_delay(&options) {
                    Some(delay) => {
                        tokio::time::sleep(delay).await;
                        stream.reconnect();
                    }
                    None => {
                        return Err(CliError::usage(format!(
                            "Event stream closed after {} reconnect attempts",
                            reconnect.attempts()
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn describe_payload(payload: &InboundPayload) -> String {
    match payload {
        InboundPayload::Json(value) => value.to_string(),
        InboundPayload::Raw(text) => text.clone(),
        InboundPayload::Binary(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

pub(crate) fn describe_sse(message: &SseMessage) -> String {
    match &message.event {
        Some(event) => format!("[{event}] {}", message.data),
        None => message.data.clone(),
    }
}

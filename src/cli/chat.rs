//! Line-oriented chat on top of the optimistic submission flow.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::cli::context::CliContext;
use crate::cli::conversations::{display_title, print_entry, HISTORY_PAGE_SIZE};
use crate::cli::error::{CliError, CliResult};
use crate::core::chat_flow::{ChatSubmission, SendOutcome};
use crate::core::inbound::apply_push;
use crate::core::message::ChatEntry;
use crate::core::notice::{self, Notice};
use crate::core::store::ChatStore;
use crate::realtime::{ChannelEvent, PushChannel};
use crate::utils::url::with_token_param;

/// `kindred say`: send one message and print the reply.
pub async fn say(ctx: &CliContext, conversation_id: &str, words: Vec<String>) -> CliResult {
    ctx.require_session()?;
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(CliError::usage("Usage: kindred say <conversation> <message>"));
    }

    // The error notice duplicates the returned error, so it is not printed.
    let (notices, _notice_rx) = notice::channel();
    let submission = ChatSubmission::new(
        Arc::new(ctx.api.clone()),
        ctx.state.chat.clone(),
        notices,
    );

    match submission.send(conversation_id, &text).await {
        SendOutcome::Sent { reply } => {
            println!("{}", reply.content);
            Ok(())
        }
        SendOutcome::Invalid(err) => Err(CliError::usage(err.to_string())),
        SendOutcome::Failed(err) => Err(err.into()),
        SendOutcome::Ignored => Ok(()),
    }
}

/// `kindred chat`: an interactive loop until EOF or `/quit`.
pub async fn chat(ctx: &CliContext, conversation_id: &str, live: bool) -> CliResult {
    ctx.require_session()?;
    let store = ctx.state.chat.clone();

    let conversation = ctx.api.conversation(conversation_id).await?;
    let history = ctx
        .api
        .messages(conversation_id, HISTORY_PAGE_SIZE, None)
        .await?;
    let name = conversation.character_name.clone();
    println!("💬 {} (type /quit to leave)\n", display_title(&conversation));

    store.set_active_conversation(Some(conversation));
    store.set_messages(history.items.into_iter().map(ChatEntry::from).collect());
    for entry in store.entries() {
        print_entry(&entry, &name);
    }

    let _channel = if live {
        Some(attach_push_channel(ctx, store.clone(), name.clone())?)
    } else {
        None
    };

    let (notices, mut notice_rx) = notice::channel();
    let submission = ChatSubmission::new(Arc::new(ctx.api.clone()), store.clone(), notices);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if matches!(input, "/quit" | "/exit") {
            break;
        }
        store.set_draft(input);

        match submission.send(conversation_id, input).await {
            SendOutcome::Sent { reply } => print_entry(&reply, &name),
            SendOutcome::Invalid(err) => eprintln!("⚠️  {err}"),
            SendOutcome::Failed(_) => drain_notices(&mut notice_rx),
            SendOutcome::Ignored => {}
        }
    }

    store.set_active_conversation(None);
    ctx.state.dispose();
    Ok(())
}

fn attach_push_channel(
    ctx: &CliContext,
    store: ChatStore,
    name: String,
) -> CliResult<PushChannel> {
    let token = ctx.state.session.access_token().ok_or(CliError::NotSignedIn)?;
    let url = with_token_param(&ctx.endpoints.ws_url, &token)?;
    let (channel, events) = PushChannel::connect(url, ctx.config.push_channel_options());
    tokio::spawn(print_pushed(store, events, name));
    Ok(channel)
}

async fn print_pushed(
    store: ChatStore,
    mut events: mpsc::UnboundedReceiver<ChannelEvent>,
    name: String,
) {
    while let Some(event) = events.recv().await {
        match event {
            ChannelEvent::Opened => eprintln!("🔌 Live updates connected"),
            ChannelEvent::Closed => eprintln!("🔌 Live updates disconnected"),
            ChannelEvent::Error(err) => debug!(error = %err, "push channel error"),
            ChannelEvent::Message(payload) => {
                if !apply_push(&store, &payload) {
                    continue;
                }
                let state = store.snapshot();
                if state.is_streaming {
                    continue;
                }
                if let Some(entry) = state.entries.last() {
                    print_entry(entry, &name);
                }
            }
        }
    }
}

fn drain_notices(rx: &mut mpsc::UnboundedReceiver<Notice>) {
    while let Ok(notice) = rx.try_recv() {
        if notice.is_error() {
            eprintln!("{notice}");
        } else {
            println!("{notice}");
        }
    }
}

//! `kindred conversations ...`

use clap::Subcommand;

use crate::api::models::Conversation;
use crate::cli::context::CliContext;
use crate::cli::error::CliResult;
use crate::cli::prompt::confirm;
use crate::core::message::ChatEntry;

pub const HISTORY_PAGE_SIZE: u32 = 50;

#[derive(Subcommand, Debug)]
pub enum ConversationCommands {
    /// List your conversations, most recent first
    List,
    /// Start a conversation with a character
    New {
        character_id: String,
        /// Title to set right away
        #[arg(long)]
        title: Option<String>,
    },
    /// Print a conversation's recent history
    Show {
        id: String,
        #[arg(short = 'n', long, default_value_t = HISTORY_PAGE_SIZE)]
        limit: u32,
        /// Page backwards from this message id
        #[arg(long)]
        before: Option<String>,
    },
    Rename { id: String, title: String },
    /// Delete every message but keep the conversation
    Clear {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
}

pub async fn run(ctx: &CliContext, command: ConversationCommands) -> CliResult {
    ctx.require_session()?;
    let api = &ctx.api;

    match command {
        ConversationCommands::List => {
            let mut conversations = api.conversations().await?;
            if conversations.is_empty() {
                println!("No conversations yet.");
                println!("\n💡 Start one with:");
                println!("   kindred conversations new <character-id>");
                return Ok(());
            }
            conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            for conversation in &conversations {
                println!("  • {}", conversation_line(conversation));
            }
        }
        ConversationCommands::New {
            character_id,
            title,
        } => {
            let mut conversation = api.create_conversation(&character_id).await?;
            if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
                conversation = api.rename_conversation(&conversation.id, title.trim()).await?;
            }
            println!("✅ Started {}", conversation_line(&conversation));
            println!("\n💡 Chat with:");
            println!("   kindred chat {}", conversation.id);
        }
        ConversationCommands::Show { id, limit, before } => {
            let conversation = api.conversation(&id).await?;
            let page = api.messages(&id, limit, before.as_deref()).await?;
            println!("{}\n", conversation_line(&conversation));
            for message in page.items {
                print_entry(&ChatEntry::from(message), &conversation.character_name);
            }
            if page.has_more {
                println!("\n(older messages available; pass --before <message-id>)");
            }
        }
        ConversationCommands::Rename { id, title } => {
            let conversation = api.rename_conversation(&id, title.trim()).await?;
            println!("✅ Renamed to {}", display_title(&conversation));
        }
        ConversationCommands::Clear { id, yes } => {
            if !yes && !confirm(&format!("Clear all messages in {id}?"))? {
                println!("Cancelled");
                return Ok(());
            }
            api.clear_messages(&id).await?;
            println!("✅ Cleared conversation {id}");
        }
        ConversationCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete conversation {id}?"))? {
                println!("Cancelled");
                return Ok(());
            }
            api.delete_conversation(&id).await?;
            println!("✅ Deleted conversation {id}");
        }
    }
    Ok(())
}

pub(crate) fn display_title(conversation: &Conversation) -> &str {
    conversation
        .title
        .as_deref()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or(&conversation.character_name)
}

pub(crate) fn conversation_line(conversation: &Conversation) -> String {
    format!(
        "{} ({}, {} messages, updated {})",
        display_title(conversation),
        conversation.id,
        conversation.message_count,
        conversation.updated_at.format("%Y-%m-%d %H:%M")
    )
}

/// One timeline entry as printed in the terminal.
pub(crate) fn format_entry(entry: &ChatEntry, assistant_name: &str) -> String {
    let speaker = if entry.is_user() {
        "You"
    } else if assistant_name.is_empty() {
        "Assistant"
    } else {
        assistant_name
    };
    format!("{speaker}: {}", entry.content)
}

pub(crate) fn print_entry(entry: &ChatEntry, assistant_name: &str) {
    println!("{}", format_entry(entry, assistant_name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{EntryKey, Role};
    use chrono::{TimeZone, Utc};

    fn conversation(title: Option<&str>) -> Conversation {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        Conversation {
            id: "c1".to_string(),
            character_id: "ch1".to_string(),
            user_id: "u1".to_string(),
            title: title.map(str::to_string),
            character_name: "Mika".to_string(),
            message_count: 4,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn blank_title_falls_back_to_character_name() {
        assert_eq!(display_title(&conversation(Some("  "))), "Mika");
        assert_eq!(display_title(&conversation(Some("Trip plans"))), "Trip plans");
        assert_eq!(
            conversation_line(&conversation(None)),
            "Mika (c1, 4 messages, updated 2025-03-01 09:30)"
        );
    }

    #[test]
    fn entries_are_labelled_by_speaker() {
        let user = ChatEntry::new(EntryKey::Durable("m1".into()), Role::User, "hi");
        let reply = ChatEntry::new(EntryKey::Durable("m2".into()), Role::Assistant, "hello");
        assert_eq!(format_entry(&user, "Mika"), "You: hi");
        assert_eq!(format_entry(&reply, "Mika"), "Mika: hello");
        assert_eq!(format_entry(&reply, ""), "Assistant: hello");
    }
}

//! `kindred characters ...`

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::{Map, Value};

use crate::api::models::{Character, CharacterCreateRequest, CharacterListParams};
use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};
use crate::cli::prompt::confirm;

#[derive(Subcommand, Debug)]
pub enum CharacterCommands {
    /// List characters visible to you
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
        /// Filter by name or description
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one character in full
    Show { id: String },
    /// Create a character from flags or a JSON file
    Create {
        #[arg(long, required_unless_present = "file")]
        name: Option<String>,
        #[arg(long, required_unless_present = "file")]
        description: Option<String>,
        #[arg(long)]
        personality: Option<String>,
        #[arg(long)]
        greeting: Option<String>,
        /// JSON object with character fields; flags override its values
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Delete a character you own
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Toggle public visibility
    Publish { id: String },
    /// Copy a public character into your own list
    Clone { id: String },
    Like { id: String },
    Unlike { id: String },
    /// List personality templates for new characters
    Templates,
}

pub async fn run(ctx: &CliContext, command: CharacterCommands) -> CliResult {
    ctx.require_session()?;
    let api = &ctx.api;

    match command {
        CharacterCommands::List {
            page,
            page_size,
            search,
        } => {
            let params = CharacterListParams {
                page,
                page_size,
                search,
            };
            let page = api.list_characters(&params).await?;
            if page.items.is_empty() {
                println!("No characters found.");
                return Ok(());
            }
            println!(
                "Characters (page {} of {}, {} total):\n",
                page.page, page.pages, page.total
            );
            for character in &page.items {
                println!("  • {}", summary_line(character));
            }
        }
        CharacterCommands::Show { id } => {
            let character = api.character(&id).await?;
            print_character(&character);
        }
        CharacterCommands::Create {
            name,
            description,
            personality,
            greeting,
            file,
        } => {
            let mut fields = match file {
                Some(path) => read_fields(&path)?,
                None => Map::new(),
            };
            let overrides = [
                ("name", name),
                ("description", description),
                ("personality", personality),
                ("greeting_message", greeting),
            ];
            for (key, value) in overrides {
                if let Some(value) = value {
                    fields.insert(key.to_string(), Value::String(value));
                }
            }
            let request = create_request(fields)?;
            let character = api.create_character(&request).await?;
            println!("✅ Created {} ({})", character.name, character.id);
        }
        CharacterCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete character {id}?"))? {
                println!("Cancelled");
                return Ok(());
            }
            api.delete_character(&id).await?;
            println!("✅ Deleted character {id}");
        }
        CharacterCommands::Publish { id } => {
            let character = api.publish_character(&id).await?;
            let visibility = if character.is_public { "public" } else { "private" };
            println!("✅ {} is now {visibility}", character.name);
        }
        CharacterCommands::Clone { id } => {
            let character = api.clone_character(&id).await?;
            println!("✅ Cloned as {} ({})", character.name, character.id);
        }
        CharacterCommands::Like { id } => {
            let status = api.like_character(&id).await?;
            println!("{}", status.message.unwrap_or_else(|| liked_text(status.liked)));
        }
        CharacterCommands::Unlike { id } => {
            let status = api.unlike_character(&id).await?;
            println!("{}", status.message.unwrap_or_else(|| liked_text(status.liked)));
        }
        CharacterCommands::Templates => {
            let templates = api.personality_templates().await?;
            for template in templates {
                println!("  • {}: {}", template.name, template.description);
            }
        }
    }
    Ok(())
}

fn liked_text(liked: bool) -> String {
    if liked { "❤️  Liked" } else { "Not liked" }.to_string()
}

fn read_fields(path: &Path) -> CliResult<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::usage(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
        Err(err) => Err(CliError::usage(format!(
            "Could not parse {}: {err}",
            path.display()
        ))),
    }
}

/// Split the required `name` and `description` out of a field map.
pub(crate) fn create_request(mut fields: Map<String, Value>) -> CliResult<CharacterCreateRequest> {
    let mut take = |key: &str| match fields.remove(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value),
        _ => Err(CliError::usage(format!("Character {key} is required"))),
    };
    let name = take("name")?;
    let description = take("description")?;
    Ok(CharacterCreateRequest {
        name,
        description,
        extra: fields,
    })
}

pub(crate) fn summary_line(character: &Character) -> String {
    let mut line = format!("{} ({})", character.name, character.id);
    if character.is_public {
        line.push_str(" [public]");
    }
    if character.like_count > 0 {
        line.push_str(&format!(" ♥ {}", character.like_count));
    }
    line
}

fn print_character(character: &Character) {
    println!("{}", summary_line(character));
    let optional = [
        ("description", &character.description),
        ("personality", &character.personality),
        ("backstory", &character.backstory),
        ("greeting", &character.greeting_message),
        ("relationship", &character.relationship_type),
    ];
    for (label, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            println!("  {label}: {value}");
        }
    }
    if let Some(tags) = character.tags.as_ref().filter(|tags| !tags.is_empty()) {
        println!("  tags: {}", tags.join(", "));
    }
    println!("  chats: {}", character.chat_count);
}

//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod account;
pub mod characters;
pub mod chat;
pub mod context;
pub mod conversations;
pub mod error;
pub mod knowledge;
pub mod listen;
pub mod prompt;
pub mod record;
pub mod settings;
pub mod voice;


use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::api::models::UpdateProfileRequest;
use crate::cli::characters::CharacterCommands;
use crate::cli::context::CliContext;
use crate::cli::conversations::ConversationCommands;
use crate::cli::error::CliResult;
use crate::cli::knowledge::KnowledgeCommands;
use crate::cli::listen::ListenCommands;
use crate::cli::settings::SettingRegistry;
use crate::cli::voice::VoiceCommands;
use crate::core::config::ConfigFile;

#[derive(Parser, Debug)]
#[command(name = "kindred")]
#[command(version)]
#[command(about = "Terminal client for Kindred character chat")]
#[command(
    long_about = "Kindred is a terminal client for a character-based AI chat service. \
It signs you in, manages characters and conversations, and chats from the \
terminal with optimistic message delivery and optional live updates.\n\n\
Environment Variables:\n\
  KINDRED_API_URL      REST API base (default http://localhost:8000/api)\n\
  KINDRED_WS_URL       WebSocket push channel (default ws://localhost:8000/ws)\n\
  KINDRED_EVENTS_URL   Server-sent event stream (default http://localhost:8000/api/events)\n\
  RUST_LOG             Log filter, e.g. kindred=debug\n\n\
Credentials are kept in the system keyring; preferences in config.toml \
(see 'kindred set')."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the REST API base URL for this run
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store credentials in the keyring
    Login {
        /// Prompted for when omitted
        username: Option<String>,
    },
    /// Create an account and sign in
    Register {
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Sign out and delete stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or update your profile
    Profile {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long, value_name = "URL")]
        avatar_url: Option<String>,
        /// Change your password (prompts for old and new)
        #[arg(long)]
        password: bool,
    },
    /// Browse and manage characters
    #[command(alias = "character")]
    Characters {
        #[command(subcommand)]
        command: CharacterCommands,
    },
    /// Browse and manage conversations
    #[command(alias = "conversation")]
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },
    /// Chat in a conversation, one line per message
    Chat {
        conversation_id: String,
        /// Attach the push channel for live updates
        #[arg(long)]
        live: bool,
    },
    /// Send one message and print the reply
    Say {
        conversation_id: String,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Print frames from the push channel or event stream
    Listen {
        #[command(subcommand)]
        command: ListenCommands,
    },
    /// Record a clip from the configured recorder command
    Record {
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
        /// Stop after this many seconds instead of waiting for Enter
        #[arg(short, long)]
        seconds: Option<u64>,
    },
    /// Manage character knowledge bases
    Knowledge {
        #[command(subcommand)]
        command: KnowledgeCommands,
    },
    /// Voice calls, speech synthesis and voice profiles
    Voice {
        #[command(subcommand)]
        command: VoiceCommands,
    },
    /// Set configuration values, or print them all when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init(args.verbose);

    if let Err(err) = dispatch(args).await {
        err.print();
        std::process::exit(err.exit_code());
    }
    Ok(())
}

fn config_file(path: Option<PathBuf>) -> CliResult<ConfigFile> {
    match path {
        Some(path) => Ok(ConfigFile::new(path)),
        None => Ok(ConfigFile::at_default_path()?),
    }
}

async fn dispatch(args: Args) -> CliResult {
    let file = config_file(args.config)?;

    // Settings never touch the keyring or the network.
    match args.command {
        Commands::Set { key, value } => return run_set(&file, key, value),
        Commands::Unset { key } => {
            let message = SettingRegistry::new().unset(&file, &key)?;
            println!("{message}");
            return Ok(());
        }
        _ => {}
    }

    let ctx = CliContext::load(&file, args.api_url)?;
    match args.command {
        Commands::Login { username } => account::login(&ctx, username).await,
        Commands::Register {
            username,
            email,
            nickname,
        } => account::register(&ctx, username, email, nickname).await,
        Commands::Logout => account::logout(&ctx),
        Commands::Whoami => account::whoami(&ctx).await,
        Commands::Profile {
            nickname,
            bio,
            avatar_url,
            password,
        } => {
            let request = UpdateProfileRequest {
                nickname,
                bio,
                avatar_url,
            };
            account::profile(&ctx, request, password).await
        }
        Commands::Characters { command } => characters::run(&ctx, command).await,
        Commands::Conversations { command } => conversations::run(&ctx, command).await,
        Commands::Chat {
            conversation_id,
            live,
        } => chat::chat(&ctx, &conversation_id, live).await,
        Commands::Say {
            conversation_id,
            message,
        } => chat::say(&ctx, &conversation_id, message).await,
        Commands::Listen { command } => listen::run(&ctx, command).await,
        Commands::Record { output, seconds } => record::run(&ctx, output, seconds).await,
        Commands::Knowledge { command } => knowledge::run(&ctx, command).await,
        Commands::Voice { command } => voice::run(&ctx, command).await,
        Commands::Set { .. } | Commands::Unset { .. } => Ok(()),
    }
}

fn run_set(file: &ConfigFile, key: Option<String>, value: Vec<String>) -> CliResult {
    let registry = SettingRegistry::new();
    match key {
        Some(key) if !value.is_empty() => {
            let message = registry.set(file, &key, &value)?;
            println!("{message}");
        }
        Some(key) if registry.get(&key).is_none() => {
            return Err(settings::SettingError::UnknownKey(key).into());
        }
        _ => {
            let config = file.load()?;
            for line in registry.describe(&config, file) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

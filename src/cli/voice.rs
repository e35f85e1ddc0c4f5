//! `kindred voice ...`

use std::path::PathBuf;
use std::time::Instant;

use clap::Subcommand;
use serde_json::Map;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::models::{TtsRequest, VoiceProfile};
use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};
use crate::core::store::VoiceStore;
use crate::core::voice_call::VoiceCall;

#[derive(Subcommand, Debug)]
pub enum VoiceCommands {
    /// Start a voice call and keep it open until Enter or EOF
    Start { conversation_id: String },
    /// End a call session left open elsewhere
    End { session_id: String },
    /// Synthesize speech into an audio file
    Tts {
        #[arg(long)]
        voice_id: String,
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },
    /// Show a character's voice profile, or set it when flags are given
    Profile {
        character_id: String,
        #[arg(long, requires = "provider")]
        voice_id: Option<String>,
        #[arg(long, requires = "voice_id")]
        provider: Option<String>,
    },
}

pub async fn run(ctx: &CliContext, command: VoiceCommands) -> CliResult {
    ctx.require_session()?;

    match command {
        VoiceCommands::Start { conversation_id } => {
            let call = VoiceCall::new(ctx.api.clone(), ctx.state.voice.clone());
            let session = call.start(&conversation_id).await?;
            println!("📞 Call {} active", session.session_id);
            println!("   Commands: m = mute, s = speaker, Enter = hang up");

            let started = Instant::now();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                call.store().set_duration(started.elapsed().as_secs());
                if !handle_call_input(call.store(), line.trim()) {
                    break;
                }
            }
            call.store().set_duration(started.elapsed().as_secs());

            let duration = call.store().snapshot().duration;
            call.end().await?;
            println!("✅ Call ended after {duration}s");
        }
        VoiceCommands::End { session_id } => {
            ctx.api.end_voice_call(&session_id).await?;
            println!("✅ Ended call {session_id}");
        }
        VoiceCommands::Tts {
            voice_id,
            output,
            text,
        } => {
            let request = TtsRequest {
                text: text.join(" "),
                voice_id,
            };
            if request.text.trim().is_empty() {
                return Err(CliError::usage("Nothing to synthesize"));
            }
            let audio = ctx.api.text_to_speech(&request).await?;
            std::fs::write(&output, &audio)?;
            println!("✅ Wrote {} bytes to {}", audio.len(), output.display());
        }
        VoiceCommands::Profile {
            character_id,
            voice_id,
            provider,
        } => {
            let profile = match (voice_id, provider) {
                (Some(voice_id), Some(provider)) => {
                    let profile = VoiceProfile {
                        id: String::new(),
                        character_id: character_id.clone(),
                        voice_id,
                        provider,
                        settings: Map::new(),
                    };
                    let saved = ctx.api.create_voice_profile(&character_id, &profile).await?;
                    println!("✅ Voice profile saved");
                    saved
                }
                _ => ctx.api.voice_profile(&character_id).await?,
            };
            println!("  voice: {} ({})", profile.voice_id, profile.provider);
            if !profile.settings.is_empty() {
                println!("  settings: {}", serde_json::Value::Object(profile.settings));
            }
        }
    }
    Ok(())
}

/// Returns `false` when the call should end.
pub(crate) fn handle_call_input(store: &VoiceStore, input: &str) -> bool {
    match input {
        "" | "q" | "quit" => false,
        "m" => {
            let muted = store.toggle_mute();
            println!("{}", if muted { "🔇 Muted" } else { "🎤 Unmuted" });
            true
        }
        "s" => {
            let speaker = store.toggle_speaker();
            println!("{}", if speaker { "🔊 Speaker on" } else { "🔈 Speaker off" });
            true
        }
        other => {
            eprintln!("⚠️  Unknown call command: {other}");
            true
        }
    }
}

//! `kindred record`: capture one clip from the configured recorder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::audio::{AudioRecorder, CommandAudioInput};
use crate::cli::context::CliContext;
use crate::cli::error::{CliError, CliResult};

const ENDED_POLL: Duration = Duration::from_millis(100);

pub async fn run(ctx: &CliContext, output: PathBuf, seconds: Option<u64>) -> CliResult {
    let input = CommandAudioInput::new(
        ctx.config.recorder_command(),
        ctx.config.recorder_mime_type(),
    )
    .with_stop_input(ctx.config.recorder_stop_input());
    let recorder = AudioRecorder::new(Arc::new(input));

    recorder.start().await;
    if let Some(err) = recorder.snapshot().error {
        return Err(CliError::usage(format!("Could not start recording: {err}")));
    }

    let stop_requested = async {
        match seconds {
            Some(seconds) => {
                eprintln!("🎙️  Recording for {seconds}s...");
                tokio::time::sleep(Duration::from_secs(seconds)).await;
            }
            None => {
                eprintln!("🎙️  Recording, press Enter to stop...");
                let mut line = String::new();
                BufReader::new(tokio::io::stdin())
                    .read_line(&mut line)
                    .await?;
            }
        }
        Ok::<_, std::io::Error>(())
    };
    tokio::select! {
        result = stop_requested => result?,
        _ = recording_ended(&recorder) => eprintln!("⚠️  Recorder stopped on its own"),
    }

    recorder.stop().await;
    let duration = recorder.duration();
    let state = recorder.snapshot();
    let clip = match (recorder.take_audio(), state.error) {
        (Some(clip), _) => clip,
        (None, Some(err)) => return Err(CliError::usage(format!("Recording failed: {err}"))),
        (None, None) => return Err(CliError::usage("No audio captured")),
    };
    if clip.bytes.is_empty() {
        return Err(CliError::usage("No audio captured"));
    }

    std::fs::write(&output, &clip.bytes)?;
    println!(
        "✅ Saved {} bytes of {} ({duration}s) to {}",
        clip.bytes.len(),
        clip.mime_type,
        output.display()
    );
    Ok(())
}

async fn recording_ended(recorder: &AudioRecorder) {
    while recorder.is_recording() {
        tokio::time::sleep(ENDED_POLL).await;
    }
}

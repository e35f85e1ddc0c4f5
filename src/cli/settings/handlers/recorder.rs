//! Audio recorder settings.

use crate::audio::DEFAULT_MIME_TYPE;
use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_optional, mutate_config_with_message, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::defaults::{DEFAULT_RECORDER_COMMAND, DEFAULT_RECORDER_STOP_INPUT};
use crate::core::config::Config;

/// Handler for `recorder-command`. Each argument becomes one argv entry.
pub struct RecorderCommandHandler;

impl SettingHandler for RecorderCommandHandler {
    fn key(&self) -> &'static str {
        "recorder-command"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let argv: Vec<String> = args
            .iter()
            .map(|arg| arg.trim().to_string())
            .filter(|arg| !arg.is_empty())
            .collect();
        if argv.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "Specify a command that writes encoded audio to stdout:",
                example: "kindred set recorder-command arecord -q -f cd -t wav -",
            });
        }

        let message = format!("✅ Set recorder-command to: {}", argv.join(" "));
        mutate_config_with_message(
            ctx.file,
            move |config| config.recorder.command = Some(argv),
            message,
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.file,
            |config| config.recorder.command = None,
            success_unset("recorder-command", &DEFAULT_RECORDER_COMMAND.join(" ")),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            "recorder-command",
            config.recorder.command.as_ref().map(|argv| argv.join(" ")),
            &DEFAULT_RECORDER_COMMAND.join(" "),
        )
    }
}

/// Handler for `recorder-mime-type`.
pub struct RecorderMimeTypeHandler;

impl SettingHandler for RecorderMimeTypeHandler {
    fn key(&self) -> &'static str {
        "recorder-mime-type"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let [mime] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify the MIME type the recorder produces:",
                example: "kindred set recorder-mime-type audio/wav",
            });
        };
        let mime = mime.trim().to_string();
        if !mime.contains('/') {
            return Err(SettingError::InvalidChoice {
                key: "recorder-mime-type",
                input: mime,
                choices: vec!["audio/webm", "audio/ogg", "audio/wav"],
            });
        }

        let message = format!("✅ Set recorder-mime-type to: {mime}");
        mutate_config_with_message(
            ctx.file,
            move |config| config.recorder.mime_type = Some(mime),
            message,
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.file,
            |config| config.recorder.mime_type = None,
            success_unset("recorder-mime-type", DEFAULT_MIME_TYPE),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            "recorder-mime-type",
            config.recorder.mime_type.clone(),
            DEFAULT_MIME_TYPE,
        )
    }
}

/// Handler for `recorder-stop-input`, the text sent on stdin to end a
/// recording.
pub struct RecorderStopInputHandler;

impl SettingHandler for RecorderStopInputHandler {
    fn key(&self) -> &'static str {
        "recorder-stop-input"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify what the recorder reads on stdin to finish:",
                example: "kindred set recorder-stop-input q",
            });
        };
        let input = input.clone();

        let message = format!("✅ Set recorder-stop-input to: {input}");
        mutate_config_with_message(
            ctx.file,
            move |config| config.recorder.stop_input = Some(input),
            message,
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.file,
            |config| config.recorder.stop_input = None,
            success_unset("recorder-stop-input", DEFAULT_RECORDER_STOP_INPUT),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            "recorder-stop-input",
            config.recorder.stop_input.clone(),
            DEFAULT_RECORDER_STOP_INPUT,
        )
    }
}

//! Boolean setting handlers for on/off settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{format_bool, mutate_config, parse_bool};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::Config;
use crate::realtime::PushChannelOptions;

/// Data-driven handler for boolean (on/off) settings.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default: bool,
    get: fn(&Config) -> Option<bool>,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidBoolean(input))?;
        let set_field = self.set_field;

        mutate_config(ctx.file, move |config| set_field(config, Some(value)))?;

        Ok(format!("✅ Set {} to: {}", self.key, format_bool(value)))
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;

        mutate_config(ctx.file, move |config| set_field(config, None))?;

        Ok(format!(
            "✅ Unset {} (will use default: {})",
            self.key,
            format_bool(self.default)
        ))
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!(
                "  {}: (unset, default: {})",
                self.key,
                format_bool(self.default)
            ),
        }
    }
}

/// Create a handler for the `reconnect` setting.
pub fn reconnect_handler() -> BooleanHandler {
    BooleanHandler {
        key: "reconnect",
        hint: "To control push channel reconnects, specify on or off:",
        example: "kindred set reconnect off",
        default: PushChannelOptions::default().reconnect,
        get: |c| c.realtime.reconnect,
        set_field: |c, v| c.realtime.reconnect = v,
    }
}

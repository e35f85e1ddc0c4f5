//! Whole-number settings for the push channel.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    format_optional, mutate_config_with_message, success_set, success_unset,
};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::Config;
use crate::realtime::PushChannelOptions;

pub struct NumberHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    max: u64,
    default: fn() -> u64,
    get: fn(&Config) -> Option<u64>,
    set_field: fn(&mut Config, Option<u64>),
}

impl SettingHandler for NumberHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        };

        let value = input
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|value| *value <= self.max)
            .ok_or_else(|| SettingError::InvalidNumber {
                key: self.key,
                input: input.clone(),
            })?;
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.file,
            move |config| set_field(config, Some(value)),
            success_set(self.key, &value.to_string()),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.file,
            move |config| set_field(config, None),
            success_unset(self.key, &(self.default)().to_string()),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            self.key,
            (self.get)(config).map(|v| v.to_string()),
            &(self.default)().to_string(),
        )
    }
}

pub fn reconnect_interval_handler() -> NumberHandler {
    NumberHandler {
        key: "reconnect-interval-ms",
        hint: "To set the delay between reconnect attempts, specify milliseconds:",
        example: "kindred set reconnect-interval-ms 5000",
        max: u64::MAX,
        default: || PushChannelOptions::default().reconnect_interval.as_millis() as u64,
        get: |c| c.realtime.reconnect_interval_ms,
        set_field: |c, v| c.realtime.reconnect_interval_ms = v,
    }
}

pub fn max_reconnect_attempts_handler() -> NumberHandler {
    NumberHandler {
        key: "max-reconnect-attempts",
        hint: "To cap consecutive reconnect attempts, specify a count:",
        example: "kindred set max-reconnect-attempts 10",
        max: u32::MAX as u64,
        default: || u64::from(PushChannelOptions::default().max_reconnect_attempts),
        get: |c| c.realtime.max_reconnect_attempts.map(u64::from),
        set_field: |c, v| c.realtime.max_reconnect_attempts = v.map(|n| n as u32),
    }
}

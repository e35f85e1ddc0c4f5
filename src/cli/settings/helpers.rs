//! Helper functions for settings operations.

use crate::core::config::{Config, ConfigError, ConfigFile};

use super::error::SettingError;

/// Wrapper around [`ConfigFile::mutate`] that maps errors to
/// `SettingError::ConfigError`.
pub fn mutate_config<F>(file: &ConfigFile, f: F) -> Result<(), SettingError>
where
    F: FnOnce(&mut Config),
{
    file.mutate(|config| {
        f(config);
        Ok::<_, ConfigError>(())
    })
    .map_err(|e| SettingError::ConfigError(e.to_string()))
}

/// Apply `f` and return `message` once the file is saved.
pub fn mutate_config_with_message<F>(
    file: &ConfigFile,
    f: F,
    message: String,
) -> Result<String, SettingError>
where
    F: FnOnce(&mut Config),
{
    mutate_config(file, f)?;
    Ok(message)
}

/// Parse a boolean value from user input.
///
/// Accepts: on/off, true/false, yes/no (case-insensitive).
pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Format a boolean value for display.
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

pub fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

pub fn success_unset(key: &str, default: &str) -> String {
    format!("✅ Unset {key} (will use default: {default})")
}

/// Display line for an optional value, showing the fallback when unset.
pub fn format_optional(key: &str, value: Option<String>, default: &str) -> String {
    match value {
        Some(value) => format!("  {key}: {value}"),
        None => format!("  {key}: (unset, default: {default})"),
    }
}

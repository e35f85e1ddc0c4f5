//! Error types for settings operations.

use std::fmt;

/// Errors that can occur when modifying configuration settings.
#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The value is not one of the accepted choices.
    InvalidChoice {
        key: &'static str,
        input: String,
        choices: Vec<&'static str>,
    },
    /// The provided value could not be parsed as a boolean.
    InvalidBoolean(String),
    /// The provided value is not a whole number within range.
    InvalidNumber { key: &'static str, input: String },
    /// The provided value is not a usable URL for this key.
    InvalidUrl {
        key: &'static str,
        input: String,
        schemes: &'static [&'static str],
    },
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// An error occurred while persisting the configuration.
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Run 'kindred set' to list available keys.");
            }
            SettingError::InvalidChoice {
                key,
                input,
                choices,
            } => {
                eprintln!("❌ Invalid {key}: {input}");
                eprintln!("   Choose one of: {}", choices.join(", "));
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no)");
            }
            SettingError::InvalidNumber { key, input } => {
                eprintln!("❌ Invalid {key}: {input}");
                eprintln!("   Expected a whole number.");
            }
            SettingError::InvalidUrl {
                key,
                input,
                schemes,
            } => {
                eprintln!("❌ Invalid {key}: {input}");
                eprintln!("   Expected an absolute {} URL.", schemes.join("/"));
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigError(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SettingError::ConfigError(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidChoice { key, input, .. } => write!(f, "Invalid {key}: {input}"),
            SettingError::InvalidBoolean(input) => write!(f, "Invalid boolean value: {input}"),
            SettingError::InvalidNumber { key, input } => write!(f, "Invalid {key}: {input}"),
            SettingError::InvalidUrl { key, input, .. } => write!(f, "Invalid {key}: {input}"),
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

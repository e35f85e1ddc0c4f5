use std::error::Error;
use std::fmt;

use crate::api::ApiError;
use crate::audio::AudioError;
use crate::cli::settings::SettingError;
use crate::core::config::ConfigError;
use crate::utils::url::InvalidUrl;

/// Failures surfaced by a subcommand.
#[derive(Debug)]
pub enum CliError {
    Api(ApiError),
    Config(ConfigError),
    Setting(SettingError),
    Audio(AudioError),
    Url(InvalidUrl),
    Io(std::io::Error),
    /// Bad input that clap could not catch.
    Usage(String),
    NotSignedIn,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        CliError::Usage(message.into())
    }

    /// Print the error to stderr. Settings errors keep their own hints.
    pub fn print(&self) {
        match self {
            CliError::Setting(err) => err.print(),
            CliError::NotSignedIn => {
                eprintln!("❌ {self}");
                eprintln!("   Run 'kindred login' first.");
            }
            _ => eprintln!("❌ {self}"),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Setting(err) => err.exit_code(),
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Api(err) => f.write_str(&err.user_message()),
            CliError::Config(err) => write!(f, "{err}"),
            CliError::Setting(err) => write!(f, "{err}"),
            CliError::Audio(err) => write!(f, "Recording failed: {err}"),
            CliError::Url(err) => write!(f, "{err}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Usage(message) => f.write_str(message),
            CliError::NotSignedIn => f.write_str("Not signed in"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CliError::Api(err) => Some(err),
            CliError::Config(err) => Some(err),
            CliError::Setting(err) => Some(err),
            CliError::Audio(err) => Some(err),
            CliError::Url(err) => Some(err),
            CliError::Io(err) => Some(err),
            CliError::Usage(_) | CliError::NotSignedIn => None,
        }
    }
}

macro_rules! from_error {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for CliError {
            fn from(err: $ty) -> Self {
                CliError::$variant(err)
            }
        }
    };
}

from_error!(Api, ApiError);
from_error!(Config, ConfigError);
from_error!(Setting, SettingError);
from_error!(Audio, AudioError);
from_error!(Url, InvalidUrl);
from_error!(Io, std::io::Error);

pub type CliResult<T = ()> = Result<T, CliError>;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Light, Theme::Dark, Theme::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

impl FontSize {
    pub const ALL: [FontSize; 3] = [FontSize::Small, FontSize::Medium, FontSize::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

macro_rules! choice_traits {
    ($ty:ty) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                let wanted = input.trim();
                <$ty>::ALL
                    .into_iter()
                    .find(|choice| choice.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| input.to_string())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_traits!(Theme);
choice_traits!(FontSize);

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    pub reconnect: Option<bool>,
    pub reconnect_interval_ms: Option<u64>,
    pub max_reconnect_attempts: Option<u32>,
}

impl RealtimeConfig {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Recorder argv; it must write encoded audio to stdout.
    pub command: Option<Vec<String>>,
    pub mime_type: Option<String>,
    /// Written to the recorder's stdin to make it finish the file.
    pub stop_input: Option<String>,
}

impl RecorderConfig {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base of the REST API, including the `/api` prefix.
    pub api_base_url: Option<String>,
    pub ws_url: Option<String>,
    pub events_url: Option<String>,
    pub theme: Option<Theme>,
    pub font_size: Option<FontSize>,
    #[serde(default, skip_serializing_if = "RealtimeConfig::is_empty")]
    pub realtime: RealtimeConfig,
    #[serde(default, skip_serializing_if = "RecorderConfig::is_empty")]
    pub recorder: RecorderConfig,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

//! Settings management for CLI set/unset commands.
//!
//! Each configuration key is owned by one [`SettingHandler`]. Handlers come in
//! a few shapes:
//!
//! - URL settings (`api-url`, `ws-url`, `events-url`)
//! - Choice settings (`theme`, `font-size`)
//! - Realtime settings (`reconnect`, `reconnect-interval-ms`,
//!   `max-reconnect-attempts`)
//! - Recorder settings (`recorder-command`, `recorder-mime-type`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;


pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::{Config, ConfigFile};

/// Context provided to setting handlers during set/unset operations.
pub struct SetContext<'a> {
    /// Snapshot of the configuration before the change.
    pub config: &'a Config,
    pub file: &'a ConfigFile,
}

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the arguments after the key.
    ///
    /// Returns the success message to display.
    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Unset (clear) the configuration value.
    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Format the current value for display in `kindred set` output.
    fn format(&self, config: &Config) -> String;
}

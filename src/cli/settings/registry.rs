//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    api_url_handler, events_url_handler, max_reconnect_attempts_handler,
    reconnect_handler, reconnect_interval_handler, ws_url_handler, FontSizeHandler,
    RecorderCommandHandler, RecorderMimeTypeHandler, RecorderStopInputHandler, ThemeHandler,
};
use super::{SetContext, SettingError, SettingHandler};
use crate::core::config::data::path_display;
use crate::core::config::{Config, ConfigFile};

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `kindred set` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(api_url_handler()));
        registry.register(Box::new(ws_url_handler()));
        registry.register(Box::new(events_url_handler()));
        registry.register(Box::new(ThemeHandler));
        registry.register(Box::new(FontSizeHandler));
        registry.register(Box::new(reconnect_handler()));
        registry.register(Box::new(reconnect_interval_handler()));
        registry.register(Box::new(max_reconnect_attempts_handler()));
        registry.register(Box::new(RecorderCommandHandler));
        registry.register(Box::new(RecorderMimeTypeHandler));
        registry.register(Box::new(RecorderStopInputHandler));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }

    pub fn set(&self, file: &ConfigFile, key: &str, args: &[String]) -> Result<String, SettingError> {
        let handler = self
            .get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
        let config = file
            .load()
            .map_err(|e| SettingError::ConfigError(e.to_string()))?;
        handler.set(args, &mut SetContext { config: &config, file })
    }

    pub fn unset(&self, file: &ConfigFile, key: &str) -> Result<String, SettingError> {
        let handler = self
            .get(key)
            .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
        let config = file
            .load()
            .map_err(|e| SettingError::ConfigError(e.to_string()))?;
        handler.unset(&mut SetContext { config: &config, file })
    }

    /// Lines printed by `kindred set` with no key.
    pub fn describe(&self, config: &Config, file: &ConfigFile) -> Vec<String> {
        let mut lines = vec![format!(
            "Current configuration ({}):",
            path_display(file.path())
        )];
        lines.extend(
            self.display_order
                .iter()
                .filter_map(|key| self.get(key))
                .map(|handler| handler.format(config)),
        );
        lines
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

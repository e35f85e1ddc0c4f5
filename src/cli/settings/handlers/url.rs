//! Server location settings.

use reqwest::Url;

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    format_optional, mutate_config_with_message, success_set, success_unset,
};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::defaults::{DEFAULT_API_BASE_URL, DEFAULT_EVENTS_URL, DEFAULT_WS_URL};
use crate::core::config::Config;

const HTTP_SCHEMES: &[&str] = &["http", "https"];
const WS_SCHEMES: &[&str] = &["ws", "wss"];

/// Data-driven handler for a URL-valued setting.
pub struct UrlHandler {
    key: &'static str,
    example: &'static str,
    schemes: &'static [&'static str],
    default: &'static str,
    get: fn(&Config) -> Option<&String>,
    set_field: fn(&mut Config, Option<String>),
}

impl UrlHandler {
    fn parse(&self, input: &str) -> Result<String, SettingError> {
        let invalid = || SettingError::InvalidUrl {
            key: self.key,
            input: input.to_string(),
            schemes: self.schemes,
        };
        let url = Url::parse(input.trim()).map_err(|_| invalid())?;
        if !self.schemes.contains(&url.scheme()) || url.host_str().is_none() {
            return Err(invalid());
        }
        Ok(input.trim().trim_end_matches('/').to_string())
    }
}

impl SettingHandler for UrlHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify exactly one URL:",
                example: self.example,
            });
        };

        let url = self.parse(input)?;
        let message = success_set(self.key, &url);
        let set_field = self.set_field;
        mutate_config_with_message(ctx.file, move |config| set_field(config, Some(url)), message)
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.file,
            move |config| set_field(config, None),
            success_unset(self.key, self.default),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(self.key, (self.get)(config).cloned(), self.default)
    }
}

pub fn api_url_handler() -> UrlHandler {
    UrlHandler {
        key: "api-url",
        example: "kindred set api-url https://kindred.example/api",
        schemes: HTTP_SCHEMES,
        default: DEFAULT_API_BASE_URL,
        get: |c| c.api_base_url.as_ref(),
        set_field: |c, v| c.api_base_url = v,
    }
}

pub fn ws_url_handler() -> UrlHandler {
    UrlHandler {
        key: "ws-url",
        example: "kindred set ws-url wss://kindred.example/ws",
        schemes: WS_SCHEMES,
        default: DEFAULT_WS_URL,
        get: |c| c.ws_url.as_ref(),
        set_field: |c, v| c.ws_url = v,
    }
}

pub fn events_url_handler() -> UrlHandler {
    UrlHandler {
        key: "events-url",
        example: "kindred set events-url https://kindred.example/api/events",
        schemes: HTTP_SCHEMES,
        default: DEFAULT_EVENTS_URL,
        get: |c| c.events_url.as_ref(),
        set_field: |c, v| c.events_url = v,
    }
}

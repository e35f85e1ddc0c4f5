//! Display preference handlers.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{
    format_optional, mutate_config_with_message, success_set, success_unset,
};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::{Config, FontSize, Theme};

/// Handler for the `theme` setting.
pub struct ThemeHandler;

impl SettingHandler for ThemeHandler {
    fn key(&self) -> &'static str {
        "theme"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set a theme, specify the theme name:",
                example: "kindred set theme dark",
            });
        }

        let input = args.join(" ");
        let theme: Theme = input.parse().map_err(|_| SettingError::InvalidChoice {
            key: "theme",
            input: input.clone(),
            choices: Theme::ALL.iter().map(|t| t.as_str()).collect(),
        })?;

        mutate_config_with_message(
            ctx.file,
            move |config| config.theme = Some(theme),
            success_set("theme", theme.as_str()),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.file,
            |config| config.theme = None,
            success_unset("theme", Theme::System.as_str()),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            "theme",
            config.theme.map(|t| t.to_string()),
            config.theme_or_default().as_str(),
        )
    }
}

/// Handler for the `font-size` setting.
pub struct FontSizeHandler;

impl SettingHandler for FontSizeHandler {
    fn key(&self) -> &'static str {
        "font-size"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "To set the font size, specify small, medium or large:",
                example: "kindred set font-size large",
            });
        }

        let input = args.join(" ");
        let size: FontSize = input.parse().map_err(|_| SettingError::InvalidChoice {
            key: "font-size",
            input: input.clone(),
            choices: FontSize::ALL.iter().map(|s| s.as_str()).collect(),
        })?;

        mutate_config_with_message(
            ctx.file,
            move |config| config.font_size = Some(size),
            success_set("font-size", size.as_str()),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.file,
            |config| config.font_size = None,
            success_unset("font-size", FontSize::Medium.as_str()),
        )
    }

    fn format(&self, config: &Config) -> String {
        format_optional(
            "font-size",
            config.font_size.map(|s| s.to_string()),
            config.font_size_or_default().as_str(),
        )
    }
}

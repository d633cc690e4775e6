use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::RenderConfig;
use crate::translate::TranslatorGateway;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub source_lang: String,
    pub target_lang: String,
    pub translate_endpoint: String,
    pub translate_timeout_secs: u64,
    pub bot_id: String,
    pub emit_delay_ms: u64,
    pub channels_path: String,
    pub font_path: Option<String>,
    pub font_families: Vec<String>,
    pub card_char_width: u32,
    pub card_min_width: u32,
    pub card_max_width: u32,
    pub card_height: u32,
    pub text_color: String,
    pub translation_color: String,
    pub background_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_lang: "zh".to_string(),
            target_lang: "ja".to_string(),
            translate_endpoint: "https://translation.googleapis.com/language/translate/v2"
                .to_string(),
            translate_timeout_secs: 10,
            bot_id: "hancard".to_string(),
            emit_delay_ms: 500,
            channels_path: "channels.json".to_string(),
            font_path: None,
            font_families: vec![
                "Noto Sans CJK SC".to_string(),
                "Noto Sans SC".to_string(),
                "WenQuanYi Zen Hei".to_string(),
            ],
            card_char_width: 64,
            card_min_width: 320,
            card_max_width: 2048,
            card_height: 220,
            text_color: "#1f2430".to_string(),
            translation_color: "#1a56bd".to_string(),
            background_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    translate: Option<TranslateSection>,
    pipeline: Option<PipelineSection>,
    channels: Option<ChannelsSection>,
    card: Option<CardSection>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateSection {
    source_lang: Option<String>,
    target_lang: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineSection {
    bot_id: Option<String>,
    emit_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelsSection {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CardSection {
    font_path: Option<String>,
    font_families: Option<Vec<String>>,
    char_width: Option<u32>,
    min_width: Option<u32>,
    max_width: Option<u32>,
    height: Option<u32>,
    text_color: Option<String>,
    translation_color: Option<String>,
    background_color: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

/// Translation credential, environment-only.
pub fn resolve_api_key() -> Option<String> {
    get_env("HANCARD_API_KEY").or_else(|| get_env("GOOGLE_API_KEY"))
}

impl Settings {
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            font_path: self.font_path.as_ref().map(PathBuf::from),
            font_families: self.font_families.clone(),
            char_width: self.card_char_width,
            min_width: self.card_min_width,
            max_width: self.card_max_width,
            height: self.card_height,
            text_color: self.text_color.clone(),
            translation_color: self.translation_color.clone(),
            background_color: self.background_color.clone(),
        }
    }

    pub fn translator(&self) -> TranslatorGateway {
        self.translator_for_target(None)
    }

    pub fn translator_for_target(&self, target: Option<&str>) -> TranslatorGateway {
        let target = target
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.target_lang.as_str());
        TranslatorGateway::new(
            self.translate_endpoint.clone(),
            resolve_api_key(),
            self.source_lang.clone(),
            target,
            Duration::from_secs(self.translate_timeout_secs),
        )
    }

    pub fn emit_delay(&self) -> Duration {
        Duration::from_millis(self.emit_delay_ms)
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(translate) = incoming.translate {
            if let Some(lang) = translate.source_lang
                && !lang.trim().is_empty()
            {
                self.source_lang = lang;
            }
            if let Some(lang) = translate.target_lang
                && !lang.trim().is_empty()
            {
                self.target_lang = lang;
            }
            if let Some(endpoint) = translate.endpoint
                && !endpoint.trim().is_empty()
            {
                self.translate_endpoint = endpoint;
            }
            if let Some(timeout) = translate.timeout_secs
                && timeout > 0
            {
                self.translate_timeout_secs = timeout;
            }
        }
        if let Some(pipeline) = incoming.pipeline {
            if let Some(bot_id) = pipeline.bot_id
                && !bot_id.trim().is_empty()
            {
                self.bot_id = bot_id;
            }
            if let Some(delay) = pipeline.emit_delay_ms {
                self.emit_delay_ms = delay;
            }
        }
        if let Some(channels) = incoming.channels
            && let Some(path) = channels.path
            && !path.trim().is_empty()
        {
            self.channels_path = path;
        }
        if let Some(card) = incoming.card {
            if let Some(path) = card.font_path
                && !path.trim().is_empty()
            {
                self.font_path = Some(path);
            }
            if let Some(families) = card.font_families
                && !families.is_empty()
            {
                self.font_families = families;
            }
            if let Some(width) = card.char_width
                && width > 0
            {
                self.card_char_width = width;
            }
            if let Some(width) = card.min_width
                && width > 0
            {
                self.card_min_width = width;
            }
            if let Some(width) = card.max_width
                && width > 0
            {
                self.card_max_width = width;
            }
            if let Some(height) = card.height
                && height > 0
            {
                self.card_height = height;
            }
            if let Some(color) = card.text_color
                && !color.trim().is_empty()
            {
                self.text_color = color;
            }
            if let Some(color) = card.translation_color
                && !color.trim().is_empty()
            {
                self.translation_color = color;
            }
            if let Some(color) = card.background_color
                && !color.trim().is_empty()
            {
                self.background_color = color;
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".hancard"))
        }
    })
}

fn get_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn defaults_match_embedded_document() {
        with_temp_home(|_| {
            let settings = load_settings(None).unwrap();
            assert_eq!(settings.source_lang, "zh");
            assert_eq!(settings.target_lang, "ja");
            assert_eq!(settings.emit_delay_ms, 500);
            assert_eq!(settings.card_min_width, 320);
            assert!(!settings.font_families.is_empty());
        });
    }

    #[test]
    fn first_load_seeds_home_settings() {
        with_temp_home(|home| {
            load_settings(None).unwrap();
            assert!(home.join(".hancard").join("settings.toml").exists());
        });
    }

    #[test]
    fn extra_file_overrides_defaults() {
        with_temp_home(|home| {
            let extra = home.join("override.toml");
            fs::write(
                &extra,
                "[translate]\ntarget_lang = \"en\"\n\n[card]\nheight = 300\n",
            )
            .unwrap();
            let settings = load_settings(Some(&extra)).unwrap();
            assert_eq!(settings.target_lang, "en");
            assert_eq!(settings.card_height, 300);
            // untouched values keep their defaults
            assert_eq!(settings.source_lang, "zh");
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let missing = home.join("nope.toml");
            assert!(load_settings(Some(&missing)).is_err());
        });
    }

    #[test]
    fn blank_values_do_not_clobber_defaults() {
        let mut settings = Settings::default();
        settings.merge(
            toml::from_str("[translate]\ntarget_lang = \"  \"\n\n[pipeline]\nbot_id = \"\"\n")
                .unwrap(),
        );
        assert_eq!(settings.target_lang, "ja");
        assert_eq!(settings.bot_id, "hancard");
    }

    #[test]
    fn translator_target_override() {
        let settings = Settings::default();
        assert_eq!(settings.translator().target_lang(), "ja");
        assert_eq!(
            settings.translator_for_target(Some("en")).target_lang(),
            "en"
        );
        assert_eq!(
            settings.translator_for_target(Some("  ")).target_lang(),
            "ja"
        );
    }
}

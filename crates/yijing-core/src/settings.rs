use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default model when only an OpenAI key is present in the environment.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Resolve the global data directory (~/.yijing/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".yijing")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
    /// OpenAI key for image generation, independent of the chat provider.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub openai_api_key: String,
    /// Alternate hexagram table file. Empty means the embedded table.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub table_path: String,
}

fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

pub fn read_settings() -> AiSettings {
    let path = settings_path();
    if !path.exists() {
        return AiSettings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn write_settings(settings: &AiSettings) -> Result<(), String> {
    let dir = data_dir();
    fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
    fs::write(settings_path(), json).map_err(|e| e.to_string())
}

impl AiSettings {
    /// Key for the OpenAI images endpoint: the dedicated images key, or the
    /// chat key when the chat provider is OpenAI.
    pub fn images_key(&self) -> Option<&str> {
        if !self.openai_api_key.is_empty() {
            Some(&self.openai_api_key)
        } else if self.provider == "openai" && !self.api_key.is_empty() {
            Some(&self.api_key)
        } else {
            None
        }
    }
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

/// Layer environment variables over file settings. `lookup` is usually
/// `|k| std::env::var(k).ok()`.
///
/// - `YIJING_AI_PROVIDER`, `YIJING_AI_MODEL` override the file.
/// - `OPENAI_API_KEY` always fills a missing images key. It also fills a
///   missing chat key when the provider is unset or `openai`, defaulting the
///   provider and model.
/// - `YIJING_TABLE` overrides the table path.
pub fn apply_env(mut settings: AiSettings, lookup: impl Fn(&str) -> Option<String>) -> AiSettings {
    let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

    if let Some(provider) = get("YIJING_AI_PROVIDER") {
        settings.provider = provider;
    }
    if let Some(model) = get("YIJING_AI_MODEL") {
        settings.model = model;
    }
    if let Some(key) = get("OPENAI_API_KEY") {
        if settings.openai_api_key.is_empty() {
            settings.openai_api_key = key.clone();
        }
        let openai = settings.provider.is_empty() || settings.provider == "openai";
        if openai && settings.api_key.is_empty() {
            settings.provider = "openai".to_string();
            settings.api_key = key;
            if settings.model.is_empty() {
                settings.model = DEFAULT_OPENAI_MODEL.to_string();
            }
        }
    }
    if let Some(path) = get("YIJING_TABLE") {
        settings.table_path = path;
    }
    settings
}

use std::path::{Path, PathBuf};

use mentor_core::{HISTORY_KEY, Language};
use mentor_openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, GenerationParams};
use serde::Deserialize;

use crate::error::MentorError;
use crate::store::{StoreType, default_store_path};

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub language: Option<Language>,
    pub voice: Option<bool>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub r#type: StoreType,
    pub path: Option<PathBuf>,
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_synthesizer")]
    pub synthesizer: String,
    /// Command that records one utterance and prints its transcript.
    pub recognizer: Option<Vec<String>>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            synthesizer: default_synthesizer(),
            recognizer: None,
        }
    }
}

fn default_synthesizer() -> String {
    "espeak-ng".to_string()
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    pub fn voice(&self) -> bool {
        self.voice.unwrap_or(true)
    }

    pub fn history_key(&self) -> &str {
        self.store.key.as_deref().unwrap_or(HISTORY_KEY)
    }

    pub fn generation_params(&self) -> GenerationParams {
        let defaults = GenerationParams::default();
        GenerationParams {
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("mentor").join("config.toml"))
}

pub fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mentor")
        .join("mentor.log")
}

/// Reads the config file. A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, MentorError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e.into()),
    };

    Ok(toml::from_str(&content)?)
}

pub fn load_config() -> Result<Config, MentorError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(Config::default()),
    }
}

pub fn load_api_key(config: &Config) -> Result<String, MentorError> {
    // First, try environment variable
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    // Then, try config file
    if let Some(key) = &config.api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    Err(MentorError::ApiKeyNotFound)
}

pub fn resolve_store_config(
    config: &Config,
    cli_type: Option<StoreType>,
    cli_path: Option<PathBuf>,
) -> (StoreType, PathBuf) {
    let store_type = cli_type.unwrap_or(config.store.r#type);
    let store_path = cli_path
        .or_else(|| config.store.path.clone())
        .unwrap_or_else(default_store_path);

    (store_type, store_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.language(), Language::En);
        assert!(config.voice());
        assert_eq!(config.history_key(), HISTORY_KEY);
        assert_eq!(config.store.r#type, StoreType::Fjall);
        assert_eq!(config.speech.synthesizer, "espeak-ng");
        assert_eq!(config.generation_params(), GenerationParams::default());
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            api_key = "sk-test"
            model = "gpt-4o-mini"
            temperature = 0.3
            language = "fr"
            voice = false

            [store]
            type = "memory"
            key = "history"

            [speech]
            synthesizer = "espeak"
            recognizer = ["sh", "-c", "transcribe-once"]
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.language(), Language::Fr);
        assert!(!config.voice());
        assert_eq!(config.store.r#type, StoreType::Memory);
        assert_eq!(config.history_key(), "history");
        assert_eq!(config.speech.synthesizer, "espeak");
        assert_eq!(config.speech.recognizer.as_ref().unwrap().len(), 3);

        let params = config.generation_params();
        assert_eq!(params.temperature, Some(0.3));
        assert_eq!(params.max_tokens, Some(500));
    }

    #[test]
    fn missing_file_is_default() {
        let config = load_config_from(Path::new("/nonexistent/mentor/config.toml")).unwrap();
        assert!(config.api_key.is_none());
    }

    #[test]
    fn invalid_file_is_error() {
        let dir = std::env::temp_dir().join(format!("mentor-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "language = 42").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(MentorError::Config(_))));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cli_overrides_store_config() {
        let config: Config = toml::from_str(
            r#"
            [store]
            type = "memory"
            path = "/from/config"
            "#,
        )
        .unwrap();

        let (store_type, path) = resolve_store_config(&config, None, None);
        assert_eq!(store_type, StoreType::Memory);
        assert_eq!(path, PathBuf::from("/from/config"));

        let (store_type, path) =
            resolve_store_config(&config, Some(StoreType::Fjall), Some("/from/cli".into()));
        assert_eq!(store_type, StoreType::Fjall);
        assert_eq!(path, PathBuf::from("/from/cli"));
    }
}

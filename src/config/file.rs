//! TOML configuration file loading
//!
//! Supports `~/.config/unmute/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct UnmuteConfigFile {
    /// Language model configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Voice/synthesis configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseFileConfig,
}

/// Language model configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-2.5-flash-lite")
    pub model: Option<String>,
}

/// Voice/synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Synthesis provider ("gemini", "elevenlabs", "espeak")
    pub tts_provider: Option<String>,

    /// Gemini TTS model (e.g. "gemini-2.5-flash-preview-tts")
    pub tts_model: Option<String>,

    /// Prebuilt voice name for Gemini synthesis (e.g. "Kore")
    pub tts_voice: Option<String>,

    /// `ElevenLabs` model identifier
    pub elevenlabs_model: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Allowed CORS origins, comma-separated ("*" for any)
    pub allowed_origins: Option<String>,
}

/// Database configuration
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseFileConfig {
    /// Path to the `SQLite` database file
    pub path: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `UnmuteConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> UnmuteConfigFile {
    let Some(path) = config_file_path() else {
        return UnmuteConfigFile::default();
    };

    if !path.exists() {
        return UnmuteConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                UnmuteConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            UnmuteConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/unmute/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("unmute").join("config.toml"))
}

//! Configuration management for the Unmute relay

pub mod file;

use std::path::PathBuf;

use crate::{Error, Result};

/// Default language model for transcription and intent deduction
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash-lite";

/// Default Gemini model for audio-modality synthesis
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default prebuilt voice for Gemini synthesis
pub const DEFAULT_TTS_VOICE: &str = "Kore";

/// Default `ElevenLabs` model identifier
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

/// Unmute relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Language model identifier for transcription and intent deduction
    pub llm_model: String,

    /// Voice synthesis configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Path to the `SQLite` database file
    pub db_path: PathBuf,
}

/// Voice synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Synthesis provider ("gemini", "elevenlabs", "espeak")
    pub tts_provider: String,

    /// Gemini TTS model
    pub tts_model: String,

    /// Prebuilt voice name for Gemini synthesis
    pub tts_voice: String,

    /// `ElevenLabs` model identifier
    pub elevenlabs_model: String,
}

/// API keys for external services
#[derive(Debug, Clone)]
pub struct ApiKeys {
    /// Gemini API key (required)
    pub gemini: String,

    /// `ElevenLabs` API key (optional; absence disables that strategy)
    pub elevenlabs: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means any
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration with layering: env > TOML file > default
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the required Gemini API key is missing.
    /// The process must not serve traffic without it.
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let gemini = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or(fc.api_keys.gemini)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::Config("GEMINI_API_KEY is required (env or config file)".to_string())
            })?;

        let elevenlabs = std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .or(fc.api_keys.elevenlabs)
            .filter(|k| !k.is_empty());

        let llm_model = std::env::var("UNMUTE_LLM_MODEL")
            .ok()
            .or(fc.llm.model)
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let explicit_provider = std::env::var("UNMUTE_TTS_PROVIDER")
            .ok()
            .or(fc.voice.tts_provider);
        let tts_provider =
            resolve_tts_provider(explicit_provider.as_deref(), elevenlabs.is_some())?;

        let voice = VoiceConfig {
            tts_provider,
            tts_model: std::env::var("UNMUTE_TTS_MODEL")
                .ok()
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| DEFAULT_TTS_MODEL.to_string()),
            tts_voice: std::env::var("UNMUTE_TTS_VOICE")
                .ok()
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| DEFAULT_TTS_VOICE.to_string()),
            elevenlabs_model: std::env::var("ELEVENLABS_MODEL")
                .ok()
                .or(fc.voice.elevenlabs_model)
                .unwrap_or_else(|| DEFAULT_ELEVENLABS_MODEL.to_string()),
        };

        let port = std::env::var("UNMUTE_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .or(fc.server.port)
            .unwrap_or(8000);

        let allowed_origins = std::env::var("UNMUTE_ALLOWED_ORIGINS")
            .ok()
            .or(fc.server.allowed_origins)
            .map_or_else(|| vec!["*".to_string()], |s| parse_allowed_origins(&s));

        let db_path = std::env::var("UNMUTE_DB_PATH")
            .ok()
            .or(fc.database.path)
            .map_or_else(default_db_path, PathBuf::from);

        Ok(Self {
            llm_model,
            voice,
            api_keys: ApiKeys { gemini, elevenlabs },
            server: ServerConfig {
                port,
                allowed_origins,
            },
            db_path,
        })
    }
}

/// Resolve the synthesis provider: explicit choice wins, otherwise
/// `ElevenLabs` when its key is configured, else Gemini. The offline
/// espeak strategy is never auto-selected.
fn resolve_tts_provider(explicit: Option<&str>, has_elevenlabs_key: bool) -> Result<String> {
    match explicit {
        Some(p @ ("gemini" | "espeak")) => Ok(p.to_string()),
        Some("elevenlabs") => {
            if has_elevenlabs_key {
                Ok("elevenlabs".to_string())
            } else {
                Err(Error::Config(
                    "tts_provider is \"elevenlabs\" but ELEVENLABS_API_KEY is not set".to_string(),
                ))
            }
        }
        Some(other) => Err(Error::Config(format!(
            "unknown tts_provider \"{other}\" (expected gemini, elevenlabs, or espeak)"
        ))),
        None if has_elevenlabs_key => Ok("elevenlabs".to_string()),
        None => Ok("gemini".to_string()),
    }
}

/// Parse a comma-separated origin list; `"*"` means any origin
fn parse_allowed_origins(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return vec!["*".to_string()];
    }

    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Default database path: `<data dir>/unmute/unmute.db`
///
/// The directory is created so a first run works with zero setup.
fn default_db_path() -> PathBuf {
    let data_dir = directories::BaseDirs::new().map_or_else(
        || PathBuf::from("."),
        |d| d.data_dir().join("unmute"),
    );

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::warn!(
            path = %data_dir.display(),
            error = %e,
            "failed to create data directory"
        );
    }

    data_dir.join("unmute.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allowed_origins_wildcard() {
        assert_eq!(parse_allowed_origins("*"), vec!["*"]);
        assert_eq!(parse_allowed_origins(" * "), vec!["*"]);
    }

    #[test]
    fn test_parse_allowed_origins_list() {
        let origins = parse_allowed_origins("http://localhost:3000, https://unmute.dev,");
        assert_eq!(origins, vec!["http://localhost:3000", "https://unmute.dev"]);
    }

    #[test]
    fn test_resolve_provider_default_is_gemini() {
        assert_eq!(resolve_tts_provider(None, false).unwrap(), "gemini");
    }

    #[test]
    fn test_resolve_provider_prefers_elevenlabs_when_keyed() {
        assert_eq!(resolve_tts_provider(None, true).unwrap(), "elevenlabs");
    }

    #[test]
    fn test_resolve_provider_explicit_wins() {
        assert_eq!(resolve_tts_provider(Some("gemini"), true).unwrap(), "gemini");
        assert_eq!(resolve_tts_provider(Some("espeak"), true).unwrap(), "espeak");
    }

    #[test]
    fn test_resolve_provider_elevenlabs_requires_key() {
        assert!(resolve_tts_provider(Some("elevenlabs"), false).is_err());
    }

    #[test]
    fn test_resolve_provider_rejects_unknown() {
        assert!(resolve_tts_provider(Some("polly"), false).is_err());
    }
}

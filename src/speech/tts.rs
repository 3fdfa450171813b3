//! Text-to-speech (TTS) processing
//!
//! Three mutually exclusive strategies, fixed per deployment at startup:
//! a Gemini audio-modality response, the `ElevenLabs` streaming endpoint,
//! or an offline espeak-ng render. There is no automatic failover between
//! them; a failing strategy surfaces its error.

use futures::StreamExt as _;

use crate::config::Config;
use crate::gemini::GeminiClient;
use crate::{Error, Result};

/// Default `ElevenLabs` voice (Rachel) when the request names none
const ELEVENLABS_DEFAULT_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

/// Output format requested from the `ElevenLabs` streaming endpoint
const ELEVENLABS_OUTPUT_FORMAT: &str = "mp3_44100_128";

/// TTS provider backend
enum TtsProvider {
    Gemini {
        client: GeminiClient,
        model: String,
        voice: String,
    },
    ElevenLabs {
        client: reqwest::Client,
        api_key: String,
        model: String,
    },
    Espeak,
}

/// Synthesizes speech from text
pub struct SpeechSynthesizer {
    provider: TtsProvider,
}

impl SpeechSynthesizer {
    /// Create a TTS instance using the Gemini voice strategy
    #[must_use]
    pub fn new_gemini(client: GeminiClient, model: String, voice: String) -> Self {
        Self {
            provider: TtsProvider::Gemini {
                client,
                model,
                voice,
            },
        }
    }

    /// Create a TTS instance using `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            provider: TtsProvider::ElevenLabs {
                client: reqwest::Client::new(),
                api_key,
                model,
            },
        })
    }

    /// Create a TTS instance using the offline espeak-ng strategy
    #[must_use]
    pub fn new_espeak() -> Self {
        Self {
            provider: TtsProvider::Espeak,
        }
    }

    /// Build the synthesizer the configuration selects
    ///
    /// # Errors
    ///
    /// Returns error if the configured strategy is missing its key
    pub fn from_config(config: &Config, gemini: GeminiClient) -> Result<Self> {
        match config.voice.tts_provider.as_str() {
            "gemini" => Ok(Self::new_gemini(
                gemini,
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
            )),
            "elevenlabs" => {
                let api_key = config.api_keys.elevenlabs.clone().ok_or_else(|| {
                    Error::Config("ElevenLabs API key required for TTS".to_string())
                })?;
                Self::new_elevenlabs(api_key, config.voice.elevenlabs_model.clone())
            }
            "espeak" => Ok(Self::new_espeak()),
            other => Err(Error::Config(format!("unknown tts_provider \"{other}\""))),
        }
    }

    /// Synthesize text to speech
    ///
    /// # Arguments
    ///
    /// * `text` - Text to synthesize
    /// * `voice_id` - Optional provider-specific voice override
    ///
    /// # Returns
    ///
    /// Audio bytes in the provider's output format (MP3 for `ElevenLabs`,
    /// provider default otherwise)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails; no partial audio is returned
    pub async fn synthesize(&self, text: &str, voice_id: Option<&str>) -> Result<Vec<u8>> {
        match &self.provider {
            TtsProvider::Gemini {
                client,
                model,
                voice,
            } => {
                let voice = voice_id.unwrap_or(voice);
                client.synthesize(model, text, voice).await
            }
            TtsProvider::ElevenLabs {
                client,
                api_key,
                model,
            } => {
                let voice = voice_id.unwrap_or(ELEVENLABS_DEFAULT_VOICE);
                synthesize_elevenlabs(client, api_key, model, text, voice).await
            }
            TtsProvider::Espeak => synthesize_espeak(text, voice_id).await,
        }
    }
}

/// Synthesize using the `ElevenLabs` streaming endpoint
///
/// Consumes the chunked byte stream to completion and concatenates into
/// one buffer.
async fn synthesize_elevenlabs(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    text: &str,
    voice_id: &str,
) -> Result<Vec<u8>> {
    #[derive(serde::Serialize)]
    struct ElevenLabsRequest<'a> {
        text: &'a str,
        model_id: &'a str,
    }

    let url = format!(
        "https://api.elevenlabs.io/v1/text-to-speech/{voice_id}/stream?output_format={ELEVENLABS_OUTPUT_FORMAT}"
    );

    let request = ElevenLabsRequest {
        text,
        model_id: model,
    };

    tracing::debug!(chars = text.len(), voice = voice_id, "starting ElevenLabs synthesis");

    let response = client
        .post(&url)
        .header("xi-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
    }

    let mut stream = response.bytes_stream();
    let mut audio = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Tts(format!("ElevenLabs stream error: {e}")))?;
        audio.extend_from_slice(&chunk);
    }

    tracing::info!(audio_bytes = audio.len(), "synthesis complete");
    Ok(audio)
}

/// Synthesize using the offline espeak-ng renderer
///
/// Lower quality, no network dependency: espeak-ng writes a complete WAV
/// to stdout.
async fn synthesize_espeak(text: &str, voice_id: Option<&str>) -> Result<Vec<u8>> {
    let mut cmd = tokio::process::Command::new("espeak-ng");
    cmd.arg("--stdout");

    if let Some(voice) = voice_id {
        cmd.arg("-v").arg(voice);
    }

    cmd.arg(text);

    let output = cmd
        .output()
        .await
        .map_err(|e| Error::Tts(format!("espeak-ng not available: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Tts(format!(
            "espeak-ng exited with {}: {stderr}",
            output.status
        )));
    }

    tracing::info!(audio_bytes = output.stdout.len(), "synthesis complete");
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevenlabs_requires_key() {
        let result = SpeechSynthesizer::new_elevenlabs(String::new(), "eleven_multilingual_v2".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_elevenlabs_request_body() {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let request = ElevenLabsRequest {
            text: "My wife will be home late.",
            model_id: "eleven_multilingual_v2",
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["text"], "My wife will be home late.");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
    }
}

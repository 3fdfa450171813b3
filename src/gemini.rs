//! Gemini `generateContent` API client
//!
//! One explicitly constructed client is shared by the transcription,
//! intent, and synthesis paths; it is injected into those components at
//! startup so tests can substitute doubles at the seams above it.
//!
//! Wire format notes:
//! - Requests use `contents`/`parts`, `system_instruction` as a top-level
//!   field, and `generationConfig` for parameters.
//! - Inline audio is base64 in an `inline_data` part.
//! - Responses come back camelCase: `candidates[0].content.parts[0]` holds
//!   either `text` or `inlineData`.
//! - The API key is passed as a `?key=` query parameter, not in headers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, Result};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fixed transcription instruction sent alongside the audio bytes
const TRANSCRIBE_INSTRUCTION: &str =
    "Transcribe this audio. Include stutters exactly as spoken. Return ONLY the text.";

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: API_BASE.to_string(),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent?key={}",
            self.base_url, self.api_key
        )
    }

    /// Transcribe audio to text
    ///
    /// Returns the trimmed transcript; a response with no text yields an
    /// empty string rather than an error.
    ///
    /// # Errors
    ///
    /// Returns error if the request or the upstream API fails
    pub async fn transcribe(&self, model: &str, audio: &[u8], mime_type: &str) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), mime_type, "starting transcription");

        let body = transcribe_body(audio, mime_type);
        let response = self
            .client
            .post(self.generate_url(model))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "transcription request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Stt(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse response");
            e
        })?;

        let transcript = result.first_text().map(str::trim).unwrap_or_default();

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript.to_string())
    }

    /// Request a strict-JSON completion constrained to `response_schema`
    ///
    /// Returns the raw JSON text of the first candidate; callers
    /// deserialize into their typed shape.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response carries no text
    pub async fn generate_json(
        &self,
        model: &str,
        system_instruction: &str,
        user_prompt: &str,
        response_schema: &Value,
    ) -> Result<String> {
        let body = structured_body(system_instruction, user_prompt, response_schema);
        let response = self
            .client
            .post(self.generate_url(model))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "structured generation request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Intent(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response.json().await?;

        result
            .first_text()
            .map(ToString::to_string)
            .ok_or_else(|| Error::Intent("no text in model response".to_string()))
    }

    /// Synthesize speech via an audio-modality response
    ///
    /// Returns decoded audio bytes from the first candidate's first inline
    /// audio part.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response carries no audio
    /// part
    pub async fn synthesize(&self, model: &str, text: &str, voice_name: &str) -> Result<Vec<u8>> {
        tracing::debug!(chars = text.len(), voice = voice_name, "starting synthesis");

        let body = speech_body(text, voice_name);
        let response = self
            .client
            .post(self.generate_url(model))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "synthesis request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Tts(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response.json().await?;

        let inline = result
            .first_inline_data()
            .ok_or_else(|| Error::Tts("no audio part in model response".to_string()))?;

        let audio = BASE64
            .decode(&inline.data)
            .map_err(|e| Error::Tts(format!("invalid audio payload: {e}")))?;

        tracing::info!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }
}

fn transcribe_body(audio: &[u8], mime_type: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "inline_data": { "mime_type": mime_type, "data": BASE64.encode(audio) } },
                { "text": TRANSCRIBE_INSTRUCTION },
            ],
        }],
    })
}

fn structured_body(system_instruction: &str, user_prompt: &str, response_schema: &Value) -> Value {
    json!({
        "system_instruction": { "parts": [{ "text": system_instruction }] },
        "contents": [{
            "role": "user",
            "parts": [{ "text": user_prompt }],
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema,
        },
    })
}

fn speech_body(text: &str, voice_name: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": text }],
        }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": voice_name }
                }
            },
        },
    })
}

/// Response from the `generateContent` endpoint
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }

    fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.inline_data.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_response() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [{"text": "w- wife home late"}], "role": "model" },
                "finishReason": "STOP"
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_text(), Some("w- wife home late"));
    }

    #[test]
    fn test_parse_empty_candidates() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_text(), None);
        assert!(response.first_inline_data().is_none());
    }

    #[test]
    fn test_parse_audio_response() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [{"inlineData": {"mimeType": "audio/mp3", "data": "SUQz"}}],
                    "role": "model"
                }
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        let inline = response.first_inline_data().unwrap();
        assert_eq!(BASE64.decode(&inline.data).unwrap(), b"ID3");
    }

    #[test]
    fn test_text_part_is_not_audio() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [{"text": "sorry, no audio"}], "role": "model" }
            }]
        }"#;

        let response: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert!(response.first_inline_data().is_none());
    }

    #[test]
    fn test_transcribe_body_shape() {
        let body = transcribe_body(b"abc", "audio/webm;codecs=opus");

        let inline = &body["contents"][0]["parts"][0]["inline_data"];
        assert_eq!(inline["mime_type"], "audio/webm;codecs=opus");
        assert_eq!(inline["data"], BASE64.encode(b"abc"));

        let instruction = body["contents"][0]["parts"][1]["text"].as_str().unwrap();
        assert!(instruction.contains("Return ONLY the text"));
    }

    #[test]
    fn test_structured_body_shape() {
        let schema = json!({"type": "OBJECT"});
        let body = structured_body("be helpful", "translate this", &schema);

        assert_eq!(
            body["system_instruction"]["parts"][0]["text"],
            "be helpful"
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "translate this");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"], schema);
    }

    #[test]
    fn test_speech_body_shape() {
        let body = speech_body("Hello there.", "Kore");

        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello there.");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
    }
}

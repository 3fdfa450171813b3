//! Speech-to-text (STT) processing

use crate::gemini::GeminiClient;
use crate::Result;

/// Transcribes speech to text via a speech-capable generative model
pub struct Transcriber {
    client: GeminiClient,
    model: String,
}

impl Transcriber {
    /// Create a new transcriber bound to a model identifier
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }

    /// Transcribe audio to text
    ///
    /// # Arguments
    ///
    /// * `audio` - Raw audio bytes in the declared format
    /// * `mime_type` - Declared mime type (e.g. `audio/webm;codecs=opus`)
    ///
    /// # Returns
    ///
    /// The trimmed transcript; a response with no text yields an empty
    /// string, not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails
    pub async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        self.client.transcribe(&self.model, audio, mime_type).await
    }
}

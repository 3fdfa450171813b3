//! Intent deduction pipeline
//!
//! Expands a fragmented utterance into complete candidate sentences,
//! personalized with the stored context facts. The model is invoked in
//! strict-JSON mode constrained to a statically declared schema and the
//! payload is validated by typed deserialization.
//!
//! Failure policy: `deduce` surfaces every failure as an `Err`;
//! `deduce_or_fallback` maps any failure to the fixed filler options so the
//! caller-facing contract — three options, never a hard error — holds even
//! when the AI backend is degraded.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::context::format_context;
use crate::db::Fact;
use crate::gemini::GeminiClient;
use crate::{Error, Result};

/// Fixed options returned when intent deduction fails
pub const FALLBACK_OPTIONS: [&str; 3] = [
    "Error processing intent.",
    "Please try again.",
    "Could not understand.",
];

/// Candidate sentences deduced from a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentOptions {
    pub options: Vec<String>,
}

impl IntentOptions {
    /// The fixed degraded-mode result
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            options: FALLBACK_OPTIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Structured-completion seam for the pipeline
///
/// Implemented by the Gemini adapter in production and by scripted doubles
/// in tests.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Run a strict-JSON completion and return the raw JSON text
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails or yields no text
    async fn complete_json(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        response_schema: &Value,
    ) -> Result<String>;
}

/// Gemini-backed completion model
pub struct GeminiModel {
    client: GeminiClient,
    model: String,
}

impl GeminiModel {
    /// Create a completion model bound to a Gemini model identifier
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl CompletionModel for GeminiModel {
    async fn complete_json(
        &self,
        system_instruction: &str,
        user_prompt: &str,
        response_schema: &Value,
    ) -> Result<String> {
        self.client
            .generate_json(&self.model, system_instruction, user_prompt, response_schema)
            .await
    }
}

/// Intent deduction pipeline
pub struct IntentPipeline {
    model: Arc<dyn CompletionModel>,
}

impl IntentPipeline {
    /// Create a new pipeline over a completion model
    #[must_use]
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// Deduce complete candidate sentences for a fragment
    ///
    /// Single best-effort attempt, no retry. A payload that deserializes
    /// with a non-empty `options` array is passed through unmodified, even
    /// when the count differs from the three the prompt demands.
    ///
    /// # Errors
    ///
    /// Returns error if the model call fails, the payload is not the
    /// expected JSON shape, or the options array is empty
    pub async fn deduce(&self, fragment: &str, facts: &[Fact]) -> Result<IntentOptions> {
        let context = format_context(facts);
        let system = system_instruction(&context);
        let user = format!("Translate this fragment: \"{fragment}\"");

        let raw = self
            .model
            .complete_json(&system, &user, &options_schema())
            .await?;

        let parsed: IntentOptions = serde_json::from_str(&raw)?;

        if parsed.options.is_empty() {
            return Err(Error::Intent("model returned no options".to_string()));
        }

        Ok(parsed)
    }

    /// Deduce candidate sentences, degrading to the fixed fallback
    ///
    /// Never fails: any upstream or parse failure is logged and replaced
    /// with [`FALLBACK_OPTIONS`].
    pub async fn deduce_or_fallback(&self, fragment: &str, facts: &[Fact]) -> IntentOptions {
        match self.deduce(fragment, facts).await {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(error = %e, "intent deduction failed, using fallback options");
                IntentOptions::fallback()
            }
        }
    }
}

/// Statically declared schema for the structured output:
/// an object with a required `options` array of strings
fn options_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            }
        },
        "required": ["options"]
    })
}

/// Build the system instruction: persona, stored context verbatim, and the
/// strict output contract
fn system_instruction(context: &str) -> String {
    let mut prompt = String::from(
        "You are an interpreter for a person with aphasia. \
         You will receive fragmented text.",
    );

    if !context.is_empty() {
        let _ = write!(prompt, "\n\nWhat you know about the person: {context}.");
    }

    prompt.push_str(
        "\n\nOutput exactly 3 likely complete sentences. \
         Assume a polite, conversational tone suitable for adults. \
         Format your response as a JSON object with a key 'options' \
         containing a list of strings.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Scripted completion model capturing the prompts it receives
    struct StubModel {
        response: std::result::Result<String, String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubModel {
        fn returning(raw: &str) -> Self {
            Self {
                response: Ok(raw.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for StubModel {
        async fn complete_json(
            &self,
            system_instruction: &str,
            user_prompt: &str,
            _response_schema: &Value,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system_instruction.to_string(), user_prompt.to_string()));

            self.response
                .clone()
                .map_err(Error::Intent)
        }
    }

    fn fact(key: &str, value: &str) -> Fact {
        Fact {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[tokio::test]
    async fn test_prompt_embeds_context_and_fragment() {
        let stub = Arc::new(StubModel::returning(
            r#"{"options": ["My wife will be home late.", "Is my wife home?", "My wife is late."]}"#,
        ));
        let pipeline = IntentPipeline::new(stub.clone());

        let facts = vec![fact("spouse_name", "Sarah")];
        let result = pipeline.deduce("wife... home... late", &facts).await.unwrap();
        assert_eq!(result.options.len(), 3);

        let calls = stub.calls.lock().unwrap();
        let (system, user) = &calls[0];
        assert!(system.contains("spouse_name is Sarah"));
        assert!(system.contains("exactly 3"));
        assert!(user.contains("Translate this fragment: \"wife... home... late\""));
    }

    #[tokio::test]
    async fn test_empty_context_omits_facts_block() {
        let stub = Arc::new(StubModel::returning(r#"{"options": ["Hello."]}"#));
        let pipeline = IntentPipeline::new(stub.clone());

        pipeline.deduce("hello", &[]).await.unwrap();

        let calls = stub.calls.lock().unwrap();
        assert!(!calls[0].0.contains("What you know about the person"));
    }

    #[tokio::test]
    async fn test_option_count_passed_through() {
        let stub = Arc::new(StubModel::returning(
            r#"{"options": ["I am hungry.", "I want dinner."]}"#,
        ));
        let pipeline = IntentPipeline::new(stub);

        let result = pipeline.deduce("food", &[]).await.unwrap();
        assert_eq!(result.options.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back() {
        let stub = Arc::new(StubModel::returning("Sure! Here are three sentences:"));
        let pipeline = IntentPipeline::new(stub);

        assert!(pipeline.deduce("food", &[]).await.is_err());

        let result = pipeline.deduce_or_fallback("food", &[]).await;
        assert_eq!(result, IntentOptions::fallback());
        assert_eq!(
            result.options,
            vec![
                "Error processing intent.",
                "Please try again.",
                "Could not understand.",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_options_key_falls_back() {
        let stub = Arc::new(StubModel::returning(r#"{"sentences": ["I am hungry."]}"#));
        let pipeline = IntentPipeline::new(stub);

        let result = pipeline.deduce_or_fallback("food", &[]).await;
        assert_eq!(result, IntentOptions::fallback());
    }

    #[tokio::test]
    async fn test_empty_options_falls_back() {
        let stub = Arc::new(StubModel::returning(r#"{"options": []}"#));
        let pipeline = IntentPipeline::new(stub);

        let result = pipeline.deduce_or_fallback("food", &[]).await;
        assert_eq!(result, IntentOptions::fallback());
    }

    #[tokio::test]
    async fn test_model_error_falls_back() {
        let stub = Arc::new(StubModel::failing("connection reset"));
        let pipeline = IntentPipeline::new(stub);

        let result = pipeline.deduce_or_fallback("food", &[]).await;
        assert_eq!(result, IntentOptions::fallback());
    }

    #[test]
    fn test_schema_requires_options() {
        let schema = options_schema();
        assert_eq!(schema["required"][0], "options");
        assert_eq!(schema["properties"]["options"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["options"]["items"]["type"], "STRING");
    }
}

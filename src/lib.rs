//! Unmute Relay - backend relay for an aphasia communication assistant
//!
//! This library provides the core functionality for the relay:
//! - Audio transcription via a speech-capable generative model
//! - Intent deduction: expanding fragmented utterances into complete
//!   candidate sentences, personalized with stored facts
//! - Speech synthesis (Gemini voice, `ElevenLabs`, or offline espeak-ng)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    HTTP API                          │
//! │   /transcribe  │  /deduce-intent  │  /speak         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Unmute Relay                         │
//! │   Context Store  │  Intent Pipeline  │  STT/TTS     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              AI Providers                            │
//! │   Gemini  │  ElevenLabs  │  espeak-ng (offline)     │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod gemini;
pub mod intent;
pub mod speech;

pub use config::Config;
pub use context::format_context;
pub use db::{ContextRepo, DbConn, DbPool, Fact};
pub use error::{Error, Result};
pub use gemini::GeminiClient;
pub use intent::{CompletionModel, IntentOptions, IntentPipeline, FALLBACK_OPTIONS};
pub use speech::{SpeechSynthesizer, Transcriber};

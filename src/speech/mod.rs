//! Speech processing: transcription (STT) and synthesis (TTS)

pub mod stt;
pub mod tts;

pub use stt::Transcriber;
pub use tts::SpeechSynthesizer;

//! ASR (Automatic Speech Recognition) Module
//!
//! Streaming recognition over raw PCM chunks. The engine decides utterance
//! boundaries internally; only finalized utterances are surfaced.

pub mod vosk;

use anyhow::Result;

pub use vosk::VoskAsr;

/// A finalized utterance from the recognizer
#[derive(Debug, Clone)]
pub struct AsrResult {
    pub text: String,
}

/// Trait for ASR engines
pub trait AsrEngine: Send {
    /// Process audio samples and return recognized text when an utterance
    /// boundary was detected; partial recognitions yield None
    fn process(&mut self, samples: &[i16]) -> Result<Option<AsrResult>>;

    /// Reset the recognizer state
    fn reset(&mut self);
}

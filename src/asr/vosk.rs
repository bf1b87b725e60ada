//! Vosk-backed speech recognition

use anyhow::{Context, Result};
use tracing::{debug, info};
use vosk::{Model, Recognizer};

/// Vosk-based ASR engine
pub struct VoskAsr {
    recognizer: Recognizer,
}

impl VoskAsr {
    /// Load the model and create a recognizer at the capture sample rate
    pub fn new(model_path: &str, sample_rate: u32) -> Result<Self> {
        let path = std::path::PathBuf::from(model_path);

        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Vosk model not found at {}",
                path.display()
            ));
        }

        info!("Loading Vosk model from: {}", path.display());

        let model_str = path.to_str().ok_or_else(|| {
            anyhow::anyhow!("Vosk model path is not valid UTF-8: {}", path.display())
        })?;

        let model = Model::new(model_str).context("Failed to load Vosk model")?;
        let recognizer = Recognizer::new(&model, sample_rate as f32)
            .context("Failed to create Vosk recognizer")?;

        Ok(Self { recognizer })
    }
}

impl super::AsrEngine for VoskAsr {
    fn process(&mut self, samples: &[i16]) -> Result<Option<super::AsrResult>> {
        let state = self.recognizer.accept_waveform(samples);

        match state {
            vosk::DecodingState::Finalized => {
                let result = self.recognizer.final_result();
                if let Some(single) = result.single() {
                    if let Some(text) = extract_text(single.text) {
                        return Ok(Some(super::AsrResult { text }));
                    }
                }
            }
            vosk::DecodingState::Running => {
                debug!("Partial: {}", self.recognizer.partial_result().partial);
            }
            vosk::DecodingState::Failed => {
                debug!("Decoding failed for this chunk");
            }
        }

        Ok(None)
    }

    fn reset(&mut self) {
        self.recognizer.reset();
    }
}

/// Extract text from Vosk result, filtering empty results
fn extract_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

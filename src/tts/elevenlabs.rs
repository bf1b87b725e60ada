//! ElevenLabs speech synthesis backend
//!
//! Posts reply text to the voice endpoint and writes the returned MP3
//! stream to the configured output path, overwriting the previous reply.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use super::SpeechSynthesizer;
use crate::config::Config;

pub struct ElevenLabsTts {
    client: reqwest::Client,
    url: String,
    api_key: String,
    voice_id: String,
    model: String,
    output_format: String,
    output_path: PathBuf,
}

impl std::fmt::Debug for ElevenLabsTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsTts")
            .field("voice_id", &self.voice_id)
            .field("output_path", &self.output_path)
            .finish()
    }
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsTts {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.tts_url.trim_end_matches('/').to_string(),
            api_key,
            voice_id: config.tts_voice_id.clone(),
            model: config.tts_model.clone(),
            output_format: config.tts_output_format.clone(),
            output_path: PathBuf::from(&config.speech_output_path),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let url = format!(
            "{}/text-to-speech/{}?output_format={}",
            self.url, self.voice_id, self.output_format
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&SynthesisRequest {
                text,
                model_id: &self.model,
            })
            .send()
            .await
            .context("Synthesis request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Synthesis API error ({}): {}", status, body);
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read audio stream")?;
        if audio.is_empty() {
            anyhow::bail!("Synthesis returned an empty audio stream");
        }

        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(&self.output_path, &audio)
            .with_context(|| format!("Failed to write {}", self.output_path.display()))?;

        debug!("Wrote {} bytes to {:?}", audio.len(), self.output_path);
        Ok(self.output_path.clone())
    }

    fn name(&self) -> &str {
        "elevenlabs"
    }
}

//! TTS (Text-to-Speech) Module
//!
//! `SpeechSynthesizer` turns reply text into a playable audio asset;
//! `Voice` wraps synthesis and playback in the echo-avoidance sequence the
//! dialogue coordinator relies on.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::audio::{CaptureEngine, PlaybackEngine};
use crate::dialogue::Speaker;

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsTts;

/// Trait for speech synthesis backends
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + std::fmt::Debug {
    /// Synthesize the text and return the path of the written audio asset
    async fn synthesize(&self, text: &str) -> Result<PathBuf>;

    /// Get the backend name
    fn name(&self) -> &str;
}

/// Synthesis and playback adapter.
///
/// While speaking, the capture side must not hear the assistant: the
/// speaking flag is raised before any sound leaves the speaker and the
/// capture stream is closed, then reopened after a cooldown once playback
/// has fully drained.
#[derive(Debug)]
pub struct Voice {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: PlaybackEngine,
    capture: CaptureEngine,
    speaking: Arc<AtomicBool>,
    cooldown: Duration,
}

impl Voice {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        playback: PlaybackEngine,
        capture: CaptureEngine,
        speaking: Arc<AtomicBool>,
        cooldown: Duration,
    ) -> Self {
        Self {
            synthesizer,
            playback,
            capture,
            speaking,
            cooldown,
        }
    }
}

#[async_trait]
impl Speaker for Voice {
    async fn speak(&self, text: &str) -> Result<()> {
        info!("📢 Speaking: '{}'", text);

        self.speaking.store(true, Ordering::SeqCst);
        if let Err(e) = self.capture.suspend() {
            warn!("Could not suspend capture: {}", e);
        }

        match self.synthesizer.synthesize(text).await {
            Ok(path) => {
                // Playback blocks until the sink drains; move it off the
                // async runtime thread
                let playback = self.playback.clone();
                match tokio::task::spawn_blocking(move || playback.play_file_sync(&path)).await {
                    Ok(Err(e)) => error!("❌ Playback failed: {}", e),
                    Err(e) => error!("❌ Playback task failed: {}", e),
                    Ok(Ok(())) => {}
                }
            }
            // Synthesis failure skips playback; the user hears nothing
            Err(e) => error!("❌ Speech synthesis failed: {}", e),
        }

        self.speaking.store(false, Ordering::SeqCst);
        if let Err(e) = self.capture.resume_after(self.cooldown) {
            warn!("Could not resume capture: {}", e);
        }

        Ok(())
    }
}

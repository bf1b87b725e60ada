//! Dialogue state coordinator
//!
//! The conversational core: wake-word gating, duplicate/echo suppression,
//! conversation history, and sequencing of the completion and speech calls.
//! All state lives here and is only touched from the dialogue loop; the
//! speaking and termination flags are the two atomics shared with other
//! threads.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::completion::{ChatTurn, CompletionBackend};
use crate::config::Config;

/// Whether the assistant is waiting for its wake word or in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    Dormant,
    Active,
}

/// Seam for the synthesis-and-playback adapter
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Speak the reply, returning once playback has finished
    async fn speak(&self, text: &str) -> Result<()>;
}

pub struct DialogueCoordinator {
    state: ListeningState,
    history: Vec<ChatTurn>,
    last_heard: Option<(String, Instant)>,
    speaking: Arc<AtomicBool>,
    terminate: Arc<AtomicBool>,
    wake_word: String,
    farewell_word: String,
    exit_phrase: String,
    min_utterance_len: usize,
    repeat_window: Duration,
    completion: Arc<dyn CompletionBackend>,
    speaker: Arc<dyn Speaker>,
}

impl DialogueCoordinator {
    pub fn new(
        config: &Config,
        speaking: Arc<AtomicBool>,
        terminate: Arc<AtomicBool>,
        completion: Arc<dyn CompletionBackend>,
        speaker: Arc<dyn Speaker>,
    ) -> Self {
        Self {
            state: ListeningState::Dormant,
            history: Vec::new(),
            last_heard: None,
            speaking,
            terminate,
            wake_word: config.wake_word.to_lowercase(),
            farewell_word: config.farewell_word.to_lowercase(),
            exit_phrase: config.exit_phrase.to_lowercase(),
            min_utterance_len: config.min_utterance_len,
            repeat_window: config.repeat_window(),
            completion,
            speaker,
        }
    }

    pub fn state(&self) -> ListeningState {
        self.state
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    /// Handle one finalized transcription from the recognizer
    pub async fn handle_utterance(&mut self, raw: &str) -> Result<()> {
        let text = raw.to_lowercase();

        // Exit command works from any state, even mid-speech
        if text.contains(&self.exit_phrase) {
            info!("Ending call and exiting...");
            self.terminate.store(true, Ordering::SeqCst);
            return Ok(());
        }

        // Ignore input while the assistant is speaking, and fragments too
        // short to be a command
        if self.speaking.load(Ordering::SeqCst)
            || text.chars().count() < self.min_utterance_len
        {
            return Ok(());
        }

        // The same text arriving again inside the window is an echo of the
        // previous utterance, not a new command
        if let Some((last, at)) = &self.last_heard {
            if *last == text && at.elapsed() < self.repeat_window {
                info!("Detected a repeated utterance. Ignoring to prevent a loop.");
                return Ok(());
            }
        }
        self.last_heard = Some((text.clone(), Instant::now()));

        info!("📝 Transcribed: '{}'", text);

        match self.state {
            ListeningState::Dormant => {
                if text.contains(&self.wake_word) {
                    self.state = ListeningState::Active;
                    info!("✨ Activated. Awaiting command...");
                }
                // Anything else while dormant is discarded
            }
            ListeningState::Active => {
                if text.contains(&self.farewell_word) {
                    self.state = ListeningState::Dormant;
                    self.history.clear();
                    info!("👋 Goodbye! Awaiting next wake word...");
                    return Ok(());
                }
                self.relay(text).await?;
            }
        }

        Ok(())
    }

    /// Forward the utterance to the completion service and speak the reply
    async fn relay(&mut self, text: String) -> Result<()> {
        self.history.push(ChatTurn::user(text));

        match self.completion.complete(&self.history).await {
            Some(reply) => {
                info!("🤖 Assistant response: {}", reply);
                self.history.push(ChatTurn::assistant(reply.clone()));
                if let Err(e) = self.speaker.speak(&reply).await {
                    warn!("Speech output failed: {}", e);
                }
            }
            None => {
                // Already logged by the client; stay active, keep listening
                debug!("No reply from completion service");
            }
        }

        Ok(())
    }
}

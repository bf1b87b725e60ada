//! Mock speaker for testing
//!
//! Records all spoken text for verification.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use oracle::dialogue::Speaker;

pub struct MockSpeaker {
    /// All text that was "spoken"
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl MockSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Get all spoken phrases
    pub fn get_spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    /// Check if a phrase was spoken
    pub fn was_spoken(&self, text: &str) -> bool {
        self.spoken.lock().unwrap().iter().any(|s| s.contains(text))
    }
}

#[async_trait]
impl Speaker for MockSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

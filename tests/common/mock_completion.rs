//! Mock completion backend for testing
//!
//! Returns a scripted reply and records every history it was called with.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use oracle::completion::{ChatTurn, CompletionBackend};

pub struct MockCompletion {
    /// Reply to return; None simulates a service failure
    reply: Option<String>,
    /// Every history passed to complete(), for verification
    pub requests: Arc<Mutex<Vec<Vec<ChatTurn>>>>,
}

impl MockCompletion {
    pub fn with_reply(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The history of the most recent call
    pub fn last_request(&self) -> Option<Vec<ChatTurn>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    async fn complete(&self, history: &[ChatTurn]) -> Option<String> {
        self.requests.lock().unwrap().push(history.to_vec());
        self.reply.clone()
    }
}

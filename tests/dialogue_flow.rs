//! Conversation flow tests over the dialogue coordinator
//!
//! Drives the coordinator with finalized transcriptions and verifies state
//! transitions, history bookkeeping, and the calls made through the
//! completion and speaker seams.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

mod common;
use common::mock_completion::MockCompletion;
use common::mock_speaker::MockSpeaker;

use oracle::completion::Role;
use oracle::config::Config;
use oracle::dialogue::{DialogueCoordinator, ListeningState};

fn coordinator(
    config: &Config,
    completion: Arc<MockCompletion>,
    speaker: Arc<MockSpeaker>,
) -> DialogueCoordinator {
    DialogueCoordinator::new(
        config,
        Arc::new(AtomicBool::new(false)),
        Arc::new(AtomicBool::new(false)),
        completion,
        speaker,
    )
}

#[tokio::test]
async fn test_full_conversation_cycle() {
    let completion = MockCompletion::with_reply("four");
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&Config::default(), completion.clone(), speaker.clone());

    for utterance in ["oracle", "what is two plus two", "goodbye"] {
        coord.handle_utterance(utterance).await.unwrap();
    }

    // Exactly one exchange was spoken, and the session closed cleanly
    assert!(speaker.was_spoken("four"));
    assert_eq!(speaker.get_spoken(), vec!["four".to_string()]);
    assert_eq!(coord.state(), ListeningState::Dormant);
    assert!(coord.history().is_empty());
}

#[tokio::test]
async fn test_completion_receives_utterance_as_final_message() {
    let completion = MockCompletion::with_reply("four");
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&Config::default(), completion.clone(), speaker);

    coord.handle_utterance("oracle").await.unwrap();
    coord.handle_utterance("what is two plus two").await.unwrap();

    let request = completion.last_request().expect("one completion call");
    let last = request.last().expect("non-empty history");
    assert_eq!(last.role, Role::User);
    assert_eq!(last.content, "what is two plus two");
}

#[tokio::test]
async fn test_history_accumulates_turn_pairs() {
    let completion = MockCompletion::with_reply("noted");
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&Config::default(), completion.clone(), speaker);

    coord.handle_utterance("oracle").await.unwrap();
    coord.handle_utterance("remember the milk").await.unwrap();
    coord.handle_utterance("also the bread").await.unwrap();

    let roles: Vec<Role> = coord.history().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );

    // The second request carried the whole conversation so far
    let request = completion.last_request().unwrap();
    assert_eq!(request.len(), 3);
}

#[tokio::test]
async fn test_replayed_session_reaches_identical_state() {
    let mut config = Config::default();
    // Expired windows between runs: disable duplicate suppression
    config.repeat_window_secs = 0;

    let completion = MockCompletion::with_reply("four");
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&config, completion, speaker.clone());

    for _ in 0..2 {
        for utterance in ["oracle", "what is two plus two", "goodbye"] {
            coord.handle_utterance(utterance).await.unwrap();
        }
        assert_eq!(coord.state(), ListeningState::Dormant);
        assert!(coord.history().is_empty());
    }

    assert_eq!(speaker.get_spoken().len(), 2);
}

#[tokio::test]
async fn test_wake_word_embedded_in_longer_utterance() {
    let completion = MockCompletion::with_reply("hello");
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&Config::default(), completion.clone(), speaker);

    coord.handle_utterance("hey oracle are you there").await.unwrap();

    assert_eq!(coord.state(), ListeningState::Active);
    // The wake utterance itself never reaches the completion service
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn test_session_survives_service_failure() {
    let mut config = Config::default();
    config.repeat_window_secs = 0;

    let failing = MockCompletion::failing();
    let speaker = MockSpeaker::new();
    let mut coord = coordinator(&config, failing.clone(), speaker.clone());

    coord.handle_utterance("oracle").await.unwrap();
    coord.handle_utterance("what is two plus two").await.unwrap();

    // Failure is silent: nothing spoken, still listening
    assert!(speaker.get_spoken().is_empty());
    assert_eq!(coord.state(), ListeningState::Active);

    coord.handle_utterance("goodbye").await.unwrap();
    assert_eq!(coord.state(), ListeningState::Dormant);
}

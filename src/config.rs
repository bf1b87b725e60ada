use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Dialogue
    pub wake_word: String,
    pub farewell_word: String,
    pub exit_phrase: String,
    pub min_utterance_len: usize,
    pub repeat_window_secs: u64,

    // Speech recognition
    pub vosk_model_path: String,

    // Audio
    pub chunk_samples: usize,
    pub capture_cooldown_secs: u64,

    // Completion service
    pub completion_url: String,
    pub completion_model: String,
    pub max_tokens: u32,

    // Speech synthesis
    pub tts_url: String,
    pub tts_voice_id: String,
    pub tts_model: String,
    pub tts_output_format: String,
    pub speech_output_path: String,

    // Meta
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_word: "oracle".to_string(),
            farewell_word: "goodbye".to_string(),
            exit_phrase: "finish chat".to_string(),
            min_utterance_len: 3,
            repeat_window_secs: 10,
            vosk_model_path: dirs::data_dir()
                .unwrap_or_default()
                .join("oracle/models/vosk-model-small-en-us")
                .to_string_lossy()
                .to_string(),
            chunk_samples: 4000,
            capture_cooldown_secs: 1,
            completion_url: "https://api.openai.com/v1".to_string(),
            completion_model: "gpt-3.5-turbo".to_string(),
            max_tokens: 150,
            tts_url: "https://api.elevenlabs.io/v1".to_string(),
            tts_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            tts_model: "eleven_monolingual_v1".to_string(),
            tts_output_format: "mp3_44100_128".to_string(),
            speech_output_path: "output/speech.mp3".to_string(),
            log_file: "log.txt".to_string(),
        }
    }
}

impl Config {
    /// Load config from file or create default
    pub fn load() -> Result<Self> {
        let config_path = config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = config_path.with_extension("json.corrupt");
                    let _ = std::fs::rename(&config_path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            let config = Self::default();
            let _ = config.save();
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Duration of the duplicate-utterance suppression window
    pub fn repeat_window(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.repeat_window_secs)
    }

    /// Cooldown before the capture stream reopens after playback
    pub fn capture_cooldown(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.capture_cooldown_secs)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("oracle")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.wake_word, "oracle");
        assert_eq!(config.farewell_word, "goodbye");
        assert_eq!(config.exit_phrase, "finish chat");
        assert_eq!(config.min_utterance_len, 3);
        assert_eq!(config.repeat_window_secs, 10);
        assert_eq!(config.max_tokens, 150);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).expect("Failed to serialize");
        let restored: Config = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(config.wake_word, restored.wake_word);
        assert_eq!(config.completion_model, restored.completion_model);
        assert_eq!(config.tts_voice_id, restored.tts_voice_id);
    }

    #[test]
    fn test_config_corrupt_json_handling() {
        // Config::load uses graceful degradation - this tests the parsing path
        let corrupt_json = "{ not valid json";
        let result: Result<Config, _> = serde_json::from_str(corrupt_json);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeat_window_duration() {
        let config = Config::default();
        assert_eq!(config.repeat_window(), std::time::Duration::from_secs(10));
    }
}

//! Playback engine for synthesized speech
//!
//! Uses a channel-based architecture to handle rodio's non-Send stream.
//! The engine spawns a dedicated audio thread that owns the playback
//! infrastructure; callers block on an ack channel until the sink drains.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Commands sent to the audio thread
enum AudioCommand {
    PlayWait(PathBuf, mpsc::Sender<()>),
    Stop,
}

/// Thread-safe handle to the playback engine
#[derive(Clone)]
pub struct PlaybackEngine {
    sender: mpsc::Sender<AudioCommand>,
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine").finish()
    }
}

impl PlaybackEngine {
    pub fn new() -> anyhow::Result<Self> {
        let (sender, receiver) = mpsc::channel::<AudioCommand>();

        // Spawn dedicated audio thread
        thread::spawn(move || {
            Self::audio_thread(receiver);
        });

        Ok(Self { sender })
    }

    fn audio_thread(receiver: mpsc::Receiver<AudioCommand>) {
        use rodio::OutputStream;

        // Initialize audio output on this thread
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(s) => s,
            Err(e) => {
                warn!("🔇 Failed to initialize audio output: {}", e);
                return;
            }
        };

        // Keep stream alive
        let _stream = stream;
        let mut sink = match rodio::Sink::try_new(&stream_handle) {
            Ok(s) => s,
            Err(e) => {
                error!("❌ Failed to create audio sink: {}", e);
                return;
            }
        };

        info!("🔊 Playback thread started");

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                AudioCommand::PlayWait(path, resp) => {
                    debug!("🔊 Playing (blocking): {:?}", path);
                    if let Err(e) = Self::queue_file(&sink, &path) {
                        error!("❌ Audio playback failed for {:?}: {}", path, e);
                    }
                    sink.sleep_until_end();
                    let _ = resp.send(());
                }
                AudioCommand::Stop => {
                    sink.stop();
                    // Re-create sink after stop as it becomes unusable if we want to play again
                    if let Ok(new_sink) = rodio::Sink::try_new(&stream_handle) {
                        sink = new_sink;
                    }
                }
            }
        }

        info!("🔇 Playback thread stopped");
    }

    fn queue_file(sink: &rodio::Sink, path: &PathBuf) -> anyhow::Result<()> {
        use rodio::Decoder;
        use std::fs::File;
        use std::io::BufReader;

        if !path.exists() {
            anyhow::bail!("Audio file not found: {:?}", path);
        }

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))?;
        sink.append(source);
        Ok(())
    }

    /// Play a single audio file and wait for completion (sync/blocking)
    pub fn play_file_sync<P: Into<PathBuf>>(&self, path: P) -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel();
        self.sender
            .send(AudioCommand::PlayWait(path.into(), tx))
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))?;

        let _ = rx.recv();
        Ok(())
    }

    /// Stop all current playback and clear the queue
    pub fn stop(&self) -> anyhow::Result<()> {
        self.sender
            .send(AudioCommand::Stop)
            .map_err(|e| anyhow::anyhow!("Audio thread disconnected: {}", e))
    }
}

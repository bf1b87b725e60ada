//! Oracle - Wake-Word Voice Assistant
//!
//! Captures microphone audio, recognizes speech with Vosk, relays
//! utterances to a remote chat-completion service and speaks the replies.

use anyhow::Result;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use oracle::asr::{AsrEngine, VoskAsr};
use oracle::audio::{self, CaptureEngine, DeviceSelector, PlaybackEngine};
use oracle::completion::CompletionClient;
use oracle::config::Config;
use oracle::dialogue::DialogueCoordinator;
use oracle::error::OracleError;
use oracle::tts::{ElevenLabsTts, SpeechSynthesizer, Voice};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input device (numeric ID or name substring)
    #[arg(short, long)]
    device: Option<String>,

    /// Sampling rate override
    #[arg(short = 'r', long)]
    samplerate: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    init_logging(&config.log_file, args.verbose)?;

    info!("🔮 Oracle v{} starting...", env!("CARGO_PKG_VERSION"));

    // Synthesis credentials are required up front; completion credentials
    // only surface as per-request failures
    let tts_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
        OracleError::Config("ELEVENLABS_API_KEY environment variable not set".to_string())
    })?;
    let completion_key = std::env::var("OPENAI_API_KEY").ok();
    if completion_key.is_none() {
        warn!("OPENAI_API_KEY not set; completion requests will fail");
    }

    // Flags shared across threads: the capture callback reads `speaking`,
    // the coordinator raises `terminate`
    let speaking = Arc::new(AtomicBool::new(false));
    let terminate = Arc::new(AtomicBool::new(false));

    // Resolve the input device first so the recognizer is created at the
    // rate the stream will actually run at
    let spec = audio::capture::resolve_input(
        DeviceSelector::parse(args.device.as_deref()),
        args.samplerate,
    )?;
    let mut asr = VoskAsr::new(&config.vosk_model_path, spec.sample_rate)?;

    // Capture path: callback thread -> unbounded queue -> dialogue loop
    let (chunk_tx, mut chunk_rx) = tokio::sync::mpsc::unbounded_channel();
    let capture = CaptureEngine::start(spec, config.chunk_samples, speaking.clone(), chunk_tx)?;
    debug!("Silence energy probe: {}", audio::rms_energy(&[0i16; 160]));

    let playback = PlaybackEngine::new()?;
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(ElevenLabsTts::new(&config, tts_key));
    let voice = Arc::new(Voice::new(
        synthesizer,
        playback,
        capture.clone(),
        speaking.clone(),
        config.capture_cooldown(),
    ));

    let client = Arc::new(CompletionClient::new(&config, completion_key));
    let mut coordinator =
        DialogueCoordinator::new(&config, speaking, terminate.clone(), client, voice);

    info!("👂 Listening for wake word '{}'...", config.wake_word);

    if let Err(e) = run_loop(&mut chunk_rx, &mut asr, &mut coordinator, &terminate).await {
        error!("Unexpected error: {}", e);
    }

    // Single graceful-shutdown path: exit command, interrupt and
    // unclassified errors all land here
    capture.shutdown();
    info!("Session ended");
    Ok(())
}

/// Drain the frame queue, feed the recognizer, and hand finalized
/// utterances to the coordinator until termination is requested
async fn run_loop(
    chunks: &mut UnboundedReceiver<Vec<i16>>,
    asr: &mut dyn AsrEngine,
    coordinator: &mut DialogueCoordinator,
    terminate: &Arc<AtomicBool>,
) -> Result<()> {
    while !terminate.load(Ordering::SeqCst) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Chat interrupted by user");
                break;
            }
            chunk = chunks.recv() => {
                let Some(chunk) = chunk else { break };
                if let Some(result) = asr.process(&chunk)? {
                    coordinator.handle_utterance(&result.text).await?;
                }
            }
        }
    }

    Ok(())
}

/// Console output plus an append-only log file
fn init_logging(log_file: &str, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();

    Ok(())
}

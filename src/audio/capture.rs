//! Microphone capture using cpal
//!
//! cpal input streams are not Send, so a dedicated thread owns the stream
//! and services a command channel (same architecture as the playback engine).
//! The stream callback runs on the audio driver's realtime thread and must
//! never block: it checks the speaking flag, accumulates samples, and hands
//! completed chunks to the dialogue loop over an unbounded channel.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

const BLOCK_SIZE: u32 = 1024;

/// Input device selector from the command line
#[derive(Debug, Clone)]
pub enum DeviceSelector {
    /// System default input device
    Default,
    /// Numeric device index
    Index(usize),
    /// Case-sensitive name substring
    Name(String),
}

impl DeviceSelector {
    /// Parse the `--device` argument: a numeric ID or a name substring
    pub fn parse(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Default,
            Some(s) => match s.parse::<usize>() {
                Ok(idx) => Self::Index(idx),
                Err(_) => Self::Name(s.to_string()),
            },
        }
    }
}

/// Resolved input device parameters, determined before the recognizer is built
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub selector: DeviceSelector,
    pub device_name: String,
    pub sample_rate: u32,
}

/// Select the input device and determine the capture sample rate.
///
/// Uses the device's default rate unless an override is given, so the
/// recognizer can be created with the rate the stream will actually run at.
pub fn resolve_input(selector: DeviceSelector, sample_rate: Option<u32>) -> Result<InputSpec> {
    let host = cpal::default_host();

    info!("Available audio input devices:");
    for (i, device) in host.input_devices()?.enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("  [{}] {}", i, name);
    }

    let device = find_device(&host, &selector)?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let sample_rate = match sample_rate {
        Some(rate) => rate,
        None => {
            device
                .default_input_config()
                .context("Failed to query default input config")?
                .sample_rate()
                .0
        }
    };

    info!("Using audio device: {} @ {} Hz", device_name, sample_rate);

    Ok(InputSpec {
        selector,
        device_name,
        sample_rate,
    })
}

fn find_device(host: &Host, selector: &DeviceSelector) -> Result<Device> {
    match selector {
        DeviceSelector::Default => host
            .default_input_device()
            .context("No default input device"),
        DeviceSelector::Index(idx) => host
            .input_devices()?
            .nth(*idx)
            .context("Device index out of range"),
        DeviceSelector::Name(needle) => {
            for device in host.input_devices()? {
                if let Ok(name) = device.name() {
                    if name.contains(needle.as_str()) {
                        return Ok(device);
                    }
                }
            }
            anyhow::bail!("No input device matching '{}'", needle)
        }
    }
}

/// Accumulates callback-sized sample slices into fixed-size chunks.
///
/// Mirrors the capture callback contract: extend until the threshold is
/// reached, then hand the accumulated samples over as one unit and reset.
pub struct ChunkAccumulator {
    buf: Vec<i16>,
    threshold: usize,
}

impl ChunkAccumulator {
    pub fn new(threshold: usize) -> Self {
        Self {
            buf: Vec::with_capacity(threshold),
            threshold,
        }
    }

    /// Append samples; returns a completed chunk once the threshold is reached
    pub fn push(&mut self, samples: &[i16]) -> Option<Vec<i16>> {
        self.buf.extend_from_slice(samples);
        if self.buf.len() >= self.threshold {
            Some(std::mem::take(&mut self.buf))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Commands sent to the capture thread
enum CaptureCommand {
    /// Close the stream immediately
    Suspend,
    /// Sleep for the cooldown, then reopen the stream
    ResumeAfter(Duration),
    /// Stop the thread for good
    Shutdown,
}

/// Thread-safe handle to the capture engine
#[derive(Clone)]
pub struct CaptureEngine {
    sender: mpsc::Sender<CaptureCommand>,
}

impl std::fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEngine").finish()
    }
}

impl CaptureEngine {
    /// Spawn the capture thread and start streaming chunks
    pub fn start(
        spec: InputSpec,
        chunk_samples: usize,
        speaking: Arc<AtomicBool>,
        chunks: UnboundedSender<Vec<i16>>,
    ) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<CaptureCommand>();

        thread::spawn(move || {
            Self::capture_thread(spec, chunk_samples, speaking, chunks, receiver);
        });

        Ok(Self { sender })
    }

    fn capture_thread(
        spec: InputSpec,
        chunk_samples: usize,
        speaking: Arc<AtomicBool>,
        chunks: UnboundedSender<Vec<i16>>,
        receiver: mpsc::Receiver<CaptureCommand>,
    ) {
        let host = cpal::default_host();
        let device = match find_device(&host, &spec.selector) {
            Ok(d) => d,
            Err(e) => {
                error!("❌ Capture device unavailable: {}", e);
                return;
            }
        };

        let mut stream =
            match open_stream(&device, spec.sample_rate, chunk_samples, &speaking, &chunks) {
                Ok(s) => Some(s),
                Err(e) => {
                    error!("❌ Failed to open capture stream: {}", e);
                    return;
                }
            };

        info!("🎙️ Capture thread started ({})", spec.device_name);

        while let Ok(cmd) = receiver.recv() {
            match cmd {
                CaptureCommand::Suspend => {
                    // Dropping the stream closes it
                    if stream.take().is_some() {
                        debug!("🔇 Capture suspended");
                    }
                }
                CaptureCommand::ResumeAfter(delay) => {
                    if stream.is_some() {
                        debug!("Capture already running, ignoring resume");
                        continue;
                    }
                    // Settle time: avoids recapturing the tail of played audio
                    thread::sleep(delay);
                    match open_stream(&device, spec.sample_rate, chunk_samples, &speaking, &chunks)
                    {
                        Ok(s) => {
                            stream = Some(s);
                            debug!("🔊 Capture resumed");
                        }
                        Err(e) => error!("❌ Failed to reopen capture stream: {}", e),
                    }
                }
                CaptureCommand::Shutdown => break,
            }
        }

        drop(stream);
        info!("🎙️ Capture thread stopped");
    }

    /// Close the capture stream immediately
    pub fn suspend(&self) -> Result<()> {
        self.sender
            .send(CaptureCommand::Suspend)
            .map_err(|e| anyhow::anyhow!("Capture thread disconnected: {}", e))
    }

    /// Reopen the capture stream after the given cooldown
    pub fn resume_after(&self, delay: Duration) -> Result<()> {
        self.sender
            .send(CaptureCommand::ResumeAfter(delay))
            .map_err(|e| anyhow::anyhow!("Capture thread disconnected: {}", e))
    }

    /// Stop the capture thread for good
    pub fn shutdown(&self) {
        let _ = self.sender.send(CaptureCommand::Shutdown);
    }
}

fn open_stream(
    device: &Device,
    sample_rate: u32,
    chunk_samples: usize,
    speaking: &Arc<AtomicBool>,
    chunks: &UnboundedSender<Vec<i16>>,
) -> Result<Stream> {
    let config = StreamConfig {
        channels: 1,
        sample_rate: SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Fixed(BLOCK_SIZE),
    };

    let speaking = speaking.clone();
    let chunks = chunks.clone();
    let mut accumulator = ChunkAccumulator::new(chunk_samples);

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            // Drop audio while the assistant is speaking, so the recognizer
            // never sees the assistant's own voice
            if speaking.load(Ordering::Relaxed) {
                return;
            }
            if let Some(chunk) = accumulator.push(data) {
                if chunks.send(chunk).is_err() {
                    warn!("Audio receiver dropped");
                }
            }
        },
        |err| {
            warn!("Audio stream error: {}", err);
        },
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_selector_parse() {
        assert!(matches!(DeviceSelector::parse(None), DeviceSelector::Default));
        assert!(matches!(
            DeviceSelector::parse(Some("3")),
            DeviceSelector::Index(3)
        ));
        assert!(matches!(
            DeviceSelector::parse(Some("USB Microphone")),
            DeviceSelector::Name(_)
        ));
    }

    #[test]
    fn test_accumulator_below_threshold() {
        let mut acc = ChunkAccumulator::new(8);
        assert!(acc.push(&[1, 2, 3]).is_none());
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_accumulator_emits_and_resets() {
        let mut acc = ChunkAccumulator::new(4);
        assert!(acc.push(&[1, 2]).is_none());
        let chunk = acc.push(&[3, 4, 5]).expect("chunk ready");
        assert_eq!(chunk, vec![1, 2, 3, 4, 5]);
        assert!(acc.is_empty());
    }

    #[test]
    fn test_accumulator_exact_threshold() {
        let mut acc = ChunkAccumulator::new(2);
        let chunk = acc.push(&[7, 8]).expect("chunk ready");
        assert_eq!(chunk, vec![7, 8]);
        assert!(acc.push(&[9]).is_none());
    }
}

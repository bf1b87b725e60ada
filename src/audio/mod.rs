//! Audio capture and playback
//!
//! Both engines run on dedicated threads behind command channels, since
//! neither cpal input streams nor rodio output streams are Send.

pub mod capture;
pub mod playback;

pub use capture::{CaptureEngine, ChunkAccumulator, DeviceSelector, InputSpec};
pub use playback::PlaybackEngine;

/// Root-mean-square energy of a sample block, used as a capture sanity probe
pub fn rms_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}

//! Audio device parameters shared by all render code.

use crate::audio_buffer::BLOCK_SIZE;

/// Sample rate and block size the engine was prepared with.
///
/// Built once when the output device is opened and passed by value to
/// every render call. Nothing here changes while a stream is running.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioContext {
    /// Frames per second.
    pub sample_rate: f64,
    /// Maximum frames per render block.
    pub buffer_size: u32,
}

impl AudioContext {
    /// Default output rate when a device does not report one.
    pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

    pub fn new(sample_rate: f64, buffer_size: u32) -> Self {
        Self {
            sample_rate,
            buffer_size,
        }
    }

    /// Whether the parameters can drive a render loop.
    pub fn is_valid(&self) -> bool {
        self.sample_rate.is_finite() && self.sample_rate > 0.0 && self.buffer_size > 0
    }

    /// Duration of `frames` frames in seconds.
    pub fn frames_to_seconds(&self, frames: usize) -> f64 {
        frames as f64 / self.sample_rate
    }
}

impl Default for AudioContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SAMPLE_RATE, BLOCK_SIZE as u32)
    }
}

/// Timing of one render block, handed down from the song to its tracks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlockClock {
    /// Song position of the first frame, in seconds.
    pub start_sec: f64,
    /// Tempo in beats per minute.
    pub tempo_bpm: f32,
    /// Frames per second.
    pub sample_rate: f64,
}

impl BlockClock {
    /// Absolute time of frame `i` within the block.
    #[inline]
    pub fn time_at(&self, i: usize) -> f64 {
        self.start_sec + i as f64 / self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_is_valid() {
        let ctx = AudioContext::default();
        assert!(ctx.is_valid());
        assert_eq!(ctx.sample_rate, 44_100.0);
    }

    #[test]
    fn rejects_degenerate_parameters() {
        assert!(!AudioContext::new(0.0, 512).is_valid());
        assert!(!AudioContext::new(f64::NAN, 512).is_valid());
        assert!(!AudioContext::new(48_000.0, 0).is_valid());
    }

    #[test]
    fn clock_steps_by_sample_period() {
        let clock = BlockClock { start_sec: 1.0, tempo_bpm: 120.0, sample_rate: 4.0 };
        assert_eq!(clock.time_at(0), 1.0);
        assert_eq!(clock.time_at(2), 1.5);
    }
}

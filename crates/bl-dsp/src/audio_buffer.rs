//! Multichannel f32 audio buffer with planar layout.

use alloc::vec;
use alloc::vec::Vec;

/// Maximum number of audio channels per buffer.
pub const MAX_CHANNELS: usize = 8;

/// Default block size for audio processing.
pub const BLOCK_SIZE: usize = 512;

/// A multichannel f32 audio buffer in planar layout.
///
/// Data is stored as `channels` contiguous planes of `frames` samples each.
/// `data[ch * frames + frame]` gives the sample for channel `ch` at `frame`.
///
/// The frame count is the buffer's capacity. Block operations take the
/// number of frames to touch so a block shorter than the capacity never
/// requires a resize.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: usize,
    frames: usize,
}

impl AudioBuffer {
    /// Create a new silent buffer with the given dimensions.
    ///
    /// `channels` is clamped to `1..=MAX_CHANNELS`.
    pub fn new(channels: usize, frames: usize) -> Self {
        let channels = channels.clamp(1, MAX_CHANNELS);
        Self {
            data: vec![0.0; channels * frames],
            channels,
            frames,
        }
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of frames (capacity per channel).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Read-only access to one channel's sample data.
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Mutable access to one channel's sample data.
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.frames;
        let len = self.frames;
        &mut self.data[start..start + len]
    }

    /// Add a mono signal into channel `ch` with gain.
    ///
    /// Only the overlapping frames are touched.
    pub fn add_mono(&mut self, ch: usize, source: &[f32], gain: f32) {
        if ch >= self.channels {
            return;
        }
        let dst = self.channel_mut(ch);
        for (d, s) in dst.iter_mut().zip(source) {
            *d += s * gain;
        }
    }

    /// Scale the first `frames` samples of every channel by `gain`.
    pub fn apply_gain(&mut self, gain: f32, frames: usize) {
        let n = frames.min(self.frames);
        for ch in 0..self.channels {
            for s in &mut self.channel_mut(ch)[..n] {
                *s *= gain;
            }
        }
    }

    /// Interleave the first `frames` frames into `out`, which holds
    /// `out_channels` samples per frame.
    ///
    /// A mono destination receives the average of all planes. Destination
    /// channels this buffer does not have are zero-filled.
    pub fn write_interleaved(&self, out: &mut [f32], out_channels: usize, frames: usize) {
        if out_channels == 0 {
            return;
        }
        let n = frames.min(self.frames).min(out.len() / out_channels);
        let scale = 1.0 / self.channels as f32;
        for (i, frame) in out.chunks_exact_mut(out_channels).take(n).enumerate() {
            if out_channels == 1 {
                let sum: f32 = (0..self.channels).map(|ch| self.channel(ch)[i]).sum();
                frame[0] = sum * scale;
                continue;
            }
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = if ch < self.channels {
                    self.data[ch * self.frames + i]
                } else {
                    0.0
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let buf = AudioBuffer::new(2, 4);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.frames(), 4);
        assert!(buf.channel(0).iter().all(|&s| s == 0.0));
        assert!(buf.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn channel_mut_writes_correctly() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.channel_mut(0)[0] = 1.0;
        buf.channel_mut(1)[1] = -0.5;
        assert_eq!(buf.channel(0), &[1.0, 0.0]);
        assert_eq!(buf.channel(1), &[0.0, -0.5]);
    }

    #[test]
    fn silence_clears_data() {
        let mut buf = AudioBuffer::new(1, 2);
        buf.channel_mut(0)[0] = 1.0;
        buf.silence();
        assert_eq!(buf.channel(0), &[0.0, 0.0]);
    }

    #[test]
    fn add_mono_accumulates_with_gain() {
        let mut buf = AudioBuffer::new(2, 3);
        buf.add_mono(0, &[1.0, 2.0], 1.0);
        buf.add_mono(0, &[1.0, 2.0], 0.5);
        buf.add_mono(5, &[1.0], 1.0);
        assert_eq!(buf.channel(0), &[1.5, 3.0, 0.0]);
        assert_eq!(buf.channel(1), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn apply_gain_only_touches_requested_frames() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.channel_mut(0).copy_from_slice(&[1.0, 1.0]);
        buf.channel_mut(1).copy_from_slice(&[-0.5, -0.5]);
        buf.apply_gain(2.0, 1);
        assert_eq!(buf.channel(0), &[2.0, 1.0]);
        assert_eq!(buf.channel(1), &[-1.0, -0.5]);
    }

    #[test]
    fn write_interleaved_stereo_and_extra_channels() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.channel_mut(0).copy_from_slice(&[0.1, 0.2]);
        buf.channel_mut(1).copy_from_slice(&[0.3, 0.4]);

        let mut out = [9.0; 6];
        buf.write_interleaved(&mut out, 3, 2);
        assert_eq!(out, [0.1, 0.3, 0.0, 0.2, 0.4, 0.0]);
    }

    #[test]
    fn write_interleaved_mono_averages() {
        let mut buf = AudioBuffer::new(2, 1);
        buf.channel_mut(0)[0] = 1.0;
        buf.channel_mut(1)[0] = 0.5;

        let mut out = [0.0; 1];
        buf.write_interleaved(&mut out, 1, 1);
        assert!((out[0] - 0.75).abs() < 1e-6);
    }
}

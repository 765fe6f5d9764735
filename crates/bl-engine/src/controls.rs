//! Per-track mixer controls shared between the control and render threads.
//!
//! Memory model: every control is a single atomic word written with
//! `Relaxed` stores and read with `Relaxed` loads. The render thread reads
//! each control once per block, so a change becomes audible at the latest
//! one block after the store. Controls are independent of each other; no
//! ordering between them is promised.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Volume, pan and mute of one track.
#[derive(Debug)]
pub struct TrackControls {
    volume: AtomicU32,
    pan: AtomicU32,
    muted: AtomicBool,
}

impl TrackControls {
    pub const DEFAULT_VOLUME: f32 = 0.4;

    pub fn new() -> Self {
        Self {
            volume: AtomicU32::new(Self::DEFAULT_VOLUME.to_bits()),
            pan: AtomicU32::new(0.0f32.to_bits()),
            muted: AtomicBool::new(false),
        }
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    /// Store `volume` clamped to `[0, 1]` (NaN counts as 0). Returns the
    /// stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let v = clamp_or_zero(volume, 0.0, 1.0);
        self.volume.store(v.to_bits(), Ordering::Relaxed);
        v
    }

    pub fn pan(&self) -> f32 {
        f32::from_bits(self.pan.load(Ordering::Relaxed))
    }

    /// Store `pan` clamped to `[-1, 1]` (NaN counts as centre). Returns the
    /// stored value.
    pub fn set_pan(&self, pan: f32) -> f32 {
        let p = clamp_or_zero(pan, -1.0, 1.0);
        self.pan.store(p.to_bits(), Ordering::Relaxed);
        p
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    /// Left/right gains for the current pan.
    ///
    /// Balance law: the far side is attenuated linearly, the near side stays
    /// at unity. Centre pan is exactly `(1.0, 1.0)`.
    pub fn pan_gains(&self) -> (f32, f32) {
        let pan = self.pan();
        ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
    }
}

impl Default for TrackControls {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_or_zero(v: f32, min: f32, max: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TrackControls::new();
        assert_eq!(c.volume(), 0.4);
        assert_eq!(c.pan(), 0.0);
        assert!(!c.is_muted());
        assert_eq!(c.pan_gains(), (1.0, 1.0));
    }

    #[test]
    fn volume_and_pan_are_clamped() {
        let c = TrackControls::new();
        assert_eq!(c.set_volume(2.0), 1.0);
        assert_eq!(c.set_volume(-0.5), 0.0);
        assert_eq!(c.set_volume(f32::NAN), 0.0);
        assert_eq!(c.set_pan(-3.0), -1.0);
        assert_eq!(c.pan(), -1.0);
    }

    #[test]
    fn hard_pan_silences_far_side() {
        let c = TrackControls::new();
        c.set_pan(-1.0);
        assert_eq!(c.pan_gains(), (1.0, 0.0));
        c.set_pan(0.5);
        assert_eq!(c.pan_gains(), (0.5, 1.0));
    }
}

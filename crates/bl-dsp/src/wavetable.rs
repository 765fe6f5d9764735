//! Precomputed single-period waveform tables.
//!
//! A table holds one period of a waveform. Oscillators look up samples by
//! phase in radians instead of evaluating trigonometry per sample. Tables
//! are immutable once built and are shared between tracks through `Arc`.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::f32::consts::{PI, TAU};

/// Number of samples in a table unless stated otherwise.
pub const DEFAULT_TABLE_SIZE: usize = 2048;

/// Waveform shapes with a closed-form generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
    ];

    /// Value of the waveform at table slot `i` of `n`.
    fn generate(self, i: usize, n: usize) -> f32 {
        let phase = TAU * i as f32 / n as f32;
        match self {
            Waveform::Sine => libm::sinf(phase),
            Waveform::Square => {
                if phase < PI {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * (i as f32 / n as f32) - 1.0,
            Waveform::Triangle => {
                if phase < PI {
                    -1.0 + 2.0 * phase / PI
                } else {
                    3.0 - 2.0 * phase / PI
                }
            }
        }
    }

    /// Lowercase name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        }
    }
}

/// One period of a waveform, sampled at `len()` evenly spaced phases.
#[derive(Clone, Debug)]
pub struct WaveTable {
    samples: Vec<f32>,
    waveform: Waveform,
}

impl WaveTable {
    /// Build a table of `DEFAULT_TABLE_SIZE` samples.
    pub fn new(waveform: Waveform) -> Self {
        Self::with_size(waveform, DEFAULT_TABLE_SIZE)
    }

    /// Build a table with `size` samples (at least 2).
    pub fn with_size(waveform: Waveform, size: usize) -> Self {
        let n = size.max(2);
        let samples = (0..n).map(|i| waveform.generate(i, n)).collect();
        Self { samples, waveform }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw table contents.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Map a phase in radians to a fractional index in `[0, len)`.
    ///
    /// Phases within a few periods wrap by add/subtract. Anything further
    /// out goes through `fmodf` so the cost stays bounded.
    #[inline]
    fn wrap_index(&self, phase: f32) -> f32 {
        let n = self.samples.len() as f32;
        let mut index = phase / TAU * n;
        if !index.is_finite() {
            return 0.0;
        }
        if index.abs() > 4.0 * n {
            index = libm::fmodf(index, n);
            if index < 0.0 {
                index += n;
            }
        } else {
            while index >= n {
                index -= n;
            }
            while index < 0.0 {
                index += n;
            }
        }
        // -tiny + n rounds up to n in f32
        if index >= n {
            0.0
        } else {
            index
        }
    }

    /// Sample at `phase` radians with linear interpolation between slots.
    #[inline]
    pub fn sample_interpolated(&self, phase: f32) -> f32 {
        let index = self.wrap_index(phase);
        let i0 = index as usize;
        let i1 = (i0 + 1) % self.samples.len();
        let frac = index - i0 as f32;
        let a = self.samples[i0];
        a + frac * (self.samples[i1] - a)
    }

    /// Sample at `phase` radians from the slot at or below it.
    #[inline]
    pub fn sample_nearest(&self, phase: f32) -> f32 {
        let index = self.wrap_index(phase);
        self.samples[index as usize]
    }
}

/// One shared table per waveform.
#[derive(Clone, Debug)]
pub struct WaveTableBank {
    tables: [Arc<WaveTable>; 4],
}

impl WaveTableBank {
    pub fn new() -> Self {
        Self::with_size(DEFAULT_TABLE_SIZE)
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            tables: Waveform::ALL.map(|w| Arc::new(WaveTable::with_size(w, size))),
        }
    }

    /// Shared handle to the table for `waveform`.
    pub fn get(&self, waveform: Waveform) -> Arc<WaveTable> {
        let idx = match waveform {
            Waveform::Sine => 0,
            Waveform::Square => 1,
            Waveform::Saw => 2,
            Waveform::Triangle => 3,
        };
        Arc::clone(&self.tables[idx])
    }
}

impl Default for WaveTableBank {
    fn default() -> Self {
        Self::new()
    }
}

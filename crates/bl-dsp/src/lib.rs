//! Core DSP types for the beatloom engine.
//!
//! Value types shared by the render engine and its controllers: the
//! planar mix buffer, device context, wavetables, the ADSR envelope and
//! entity ids. Everything here is immutable or owned by a single thread;
//! cross-thread publication lives in `bl-engine`.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_buffer;
mod context;
mod envelope;
mod id;
mod wavetable;

pub use audio_buffer::{AudioBuffer, BLOCK_SIZE, MAX_CHANNELS};
pub use context::{AudioContext, BlockClock};
pub use envelope::Adsr;
pub use id::{SongId, TrackId, MAX_ID_LEN};
pub use wavetable::{WaveTable, WaveTableBank, Waveform, DEFAULT_TABLE_SIZE};

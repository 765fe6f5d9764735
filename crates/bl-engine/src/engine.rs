//! The render engine, split into a render half and a control half.
//!
//! `EngineCore` is owned by the audio device callback and is the only thing
//! that renders. `EngineHandle` is the control surface: transport, master
//! volume and the active song. Both sides share `EngineShared`, which holds
//! nothing but atomics and an `ArcSwapOption`, so the callback never waits
//! on the control side.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use bl_dsp::{AudioBuffer, AudioContext};

use crate::error::EngineError;
use crate::retire::RetireList;
use crate::song::Song;
use crate::transport::{AtomicTransport, TransportState};

/// Master volume before anyone sets it.
pub const DEFAULT_MASTER_VOLUME: f32 = 0.5;

/// Mix bus width. Devices with more channels get zeros on the extras.
const MIX_CHANNELS: usize = 2;

struct EngineShared {
    transport: AtomicTransport,
    master_volume: AtomicU32,
    active_song: ArcSwapOption<Song>,
    /// Songs swapped out of `active_song`, freed by the control side.
    retired: RetireList<Song>,
    /// Published by `prepare`; zero buffer size means not prepared.
    sample_rate_bits: AtomicU64,
    buffer_size: AtomicU32,
}

/// Render half. Lives in the audio callback.
pub struct EngineCore {
    shared: Arc<EngineShared>,
    ctx: Option<AudioContext>,
    mix: AudioBuffer,
    scratch: Vec<f32>,
}

/// Control half. Cheap to clone; every method takes `&self`.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<EngineShared>,
}

impl EngineCore {
    /// Create an unprepared engine and its control handle.
    pub fn new() -> (EngineCore, EngineHandle) {
        let shared = Arc::new(EngineShared {
            transport: AtomicTransport::default(),
            master_volume: AtomicU32::new(DEFAULT_MASTER_VOLUME.to_bits()),
            active_song: ArcSwapOption::const_empty(),
            retired: RetireList::new(),
            sample_rate_bits: AtomicU64::new(AudioContext::DEFAULT_SAMPLE_RATE.to_bits()),
            buffer_size: AtomicU32::new(0),
        });
        let core = EngineCore {
            shared: Arc::clone(&shared),
            ctx: None,
            mix: AudioBuffer::new(MIX_CHANNELS, 0),
            scratch: Vec::new(),
        };
        (core, EngineHandle { shared })
    }

    /// Size the render buffers for a device. Not realtime-safe; call before
    /// the stream starts.
    ///
    /// Blocks longer than `buffer_size_frames` are still rendered, in
    /// chunks of that size.
    pub fn prepare(&mut self, buffer_size_frames: usize, sample_rate: f64) -> Result<(), EngineError> {
        if buffer_size_frames == 0 || buffer_size_frames > u32::MAX as usize {
            return Err(EngineError::invalid("buffer size", buffer_size_frames as f64));
        }
        let ctx = AudioContext::new(sample_rate, buffer_size_frames as u32);
        if !ctx.is_valid() {
            return Err(EngineError::invalid("sample rate", sample_rate));
        }

        self.mix = AudioBuffer::new(MIX_CHANNELS, buffer_size_frames);
        self.scratch = vec![0.0; buffer_size_frames];
        self.ctx = Some(ctx);

        self.shared
            .sample_rate_bits
            .store(sample_rate.to_bits(), Ordering::Relaxed);
        self.shared
            .buffer_size
            .store(ctx.buffer_size, Ordering::Release);

        log::info!("engine prepared: {sample_rate} Hz, {buffer_size_frames} frames");
        Ok(())
    }

    pub fn context(&self) -> Option<AudioContext> {
        self.ctx
    }

    /// Fill `output`, interleaved with `channels` channels, with the next
    /// block of the active song.
    ///
    /// Realtime entry point: no allocation, no locks, no errors. Writes
    /// silence when stopped, paused, or without a song. Calling this before
    /// `prepare` is a bug and panics in debug builds.
    pub fn render_block(&mut self, output: &mut [f32], channels: usize) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.render_inner(output, channels));
        #[cfg(not(feature = "alloc_check"))]
        self.render_inner(output, channels);
    }

    fn render_inner(&mut self, output: &mut [f32], channels: usize) {
        let Some(ctx) = self.ctx else {
            if cfg!(debug_assertions) {
                panic!("render_block called before prepare");
            }
            output.fill(0.0);
            return;
        };
        if channels == 0 || self.shared.transport.load() != TransportState::Playing {
            output.fill(0.0);
            return;
        }
        let guard = self.shared.active_song.load();
        let Some(song) = &*guard else {
            output.fill(0.0);
            return;
        };

        let gain = f32::from_bits(self.shared.master_volume.load(Ordering::Relaxed));
        let capacity = self.mix.frames();

        for chunk in output.chunks_mut(capacity * channels) {
            let frames = chunk.len() / channels;
            self.mix.silence();
            song.render(&mut self.mix, &mut self.scratch, frames, &ctx);
            self.mix.apply_gain(gain, frames);
            self.mix.write_interleaved(chunk, channels, frames);
            // trailing partial frame
            chunk[frames * channels..].fill(0.0);
        }

        // A stop that landed after the transport check above may have
        // rewound before this block's position update, which then undid
        // the rewind. Stop stores the transport first, so seeing Stopped
        // here means the rewind has to be repeated.
        if self.shared.transport.load() == TransportState::Stopped {
            song.rewind();
        }
    }
}

impl EngineHandle {
    pub fn state(&self) -> TransportState {
        self.shared.transport.load()
    }

    pub fn is_playing(&self) -> bool {
        self.state() == TransportState::Playing
    }

    pub fn play(&self) -> TransportState {
        self.transition("play", TransportState::played)
    }

    pub fn pause(&self) -> TransportState {
        self.transition("pause", TransportState::paused)
    }

    /// Stop and rewind the active song to the start.
    ///
    /// The song is picked before the transport changes so a concurrent
    /// `load_song` cannot redirect the rewind. The transport store comes
    /// before the rewind; the render side relies on that order.
    pub fn stop(&self) -> TransportState {
        let song = self.shared.active_song.load_full();
        let state = self.transition("stop", |_| TransportState::Stopped);
        if let Some(song) = song {
            song.rewind();
        }
        state
    }

    /// Playing goes to paused, anything else to playing.
    pub fn toggle(&self) -> TransportState {
        self.transition("toggle", TransportState::toggled)
    }

    fn transition(
        &self,
        name: &str,
        f: impl Fn(TransportState) -> TransportState,
    ) -> TransportState {
        if !self.has_song() {
            log::debug!("{name} ignored: no song loaded");
            return self.state();
        }
        let (before, after) = self.shared.transport.update(f);
        if before != after {
            log::debug!("transport {before} -> {after}");
        }
        after
    }

    /// Make `song` the active song from the next block on. Its position is
    /// kept. The previous song is freed once the render thread lets go.
    pub fn load_song(&self, song: Arc<Song>) {
        log::info!("loading song {} ({})", song.id(), song.title());
        let incoming = Arc::clone(&song);
        if let Some(old) = self.shared.active_song.swap(Some(song)) {
            if !Arc::ptr_eq(&old, &incoming) {
                self.shared.retired.retire(old);
            }
        }
        self.shared.retired.collect();
    }

    /// Clear the active song and stop. The unloaded song is rewound like
    /// on `stop`.
    pub fn unload_song(&self) -> Option<Arc<Song>> {
        self.shared.transport.store(TransportState::Stopped);
        let old = self.shared.active_song.swap(None)?;
        old.rewind();
        log::info!("unloaded song {}", old.id());
        self.shared.retired.retire(Arc::clone(&old));
        Some(old)
    }

    pub fn active_song(&self) -> Option<Arc<Song>> {
        self.shared.active_song.load_full()
    }

    pub fn has_song(&self) -> bool {
        self.shared.active_song.load().is_some()
    }

    pub fn master_volume(&self) -> f32 {
        f32::from_bits(self.shared.master_volume.load(Ordering::Relaxed))
    }

    /// Store `volume` clamped to `[0, 1]`. Returns the stored value.
    pub fn set_master_volume(&self, volume: f32) -> f32 {
        let v = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        self.shared.master_volume.store(v.to_bits(), Ordering::Relaxed);
        v
    }

    /// Device parameters published by `EngineCore::prepare`.
    pub fn context(&self) -> Result<AudioContext, EngineError> {
        let buffer_size = self.shared.buffer_size.load(Ordering::Acquire);
        if buffer_size == 0 {
            return Err(EngineError::NotReady);
        }
        let sample_rate = f64::from_bits(self.shared.sample_rate_bits.load(Ordering::Relaxed));
        Ok(AudioContext::new(sample_rate, buffer_size))
    }

    /// Free songs and track collections the render thread has released.
    /// Returns how many objects were dropped.
    pub fn collect_garbage(&self) -> usize {
        let mut freed = self.shared.retired.collect();
        if let Some(song) = self.active_song() {
            freed += song.collect_retired();
        }
        freed
    }

    /// Songs waiting to be freed.
    pub fn pending_retired(&self) -> usize {
        self.shared.retired.len()
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("state", &self.state())
            .field("master_volume", &self.master_volume())
            .field("song", &self.active_song().map(|s| s.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::BeatTrack;
    use bl_dsp::{WaveTable, Waveform};

    fn prepared() -> (EngineCore, EngineHandle) {
        let (mut core, handle) = EngineCore::new();
        core.prepare(128, 48_000.0).unwrap();
        (core, handle)
    }

    fn song_with_beat() -> Arc<Song> {
        let song = Song::new("beat");
        song.add_track(BeatTrack::new(440.0, Arc::new(WaveTable::new(Waveform::Sine))));
        Arc::new(song)
    }

    #[test]
    fn prepare_rejects_bad_parameters() {
        let (mut core, handle) = EngineCore::new();
        assert!(core.prepare(0, 48_000.0).is_err());
        assert!(core.prepare(256, 0.0).is_err());
        assert!(core.prepare(256, f64::NAN).is_err());
        assert_eq!(handle.context(), Err(EngineError::NotReady));

        core.prepare(256, 48_000.0).unwrap();
        assert_eq!(handle.context(), Ok(AudioContext::new(48_000.0, 256)));
        assert_eq!(core.context(), Some(AudioContext::new(48_000.0, 256)));
    }

    #[test]
    fn transport_is_ignored_without_song() {
        let (_core, handle) = prepared();
        assert_eq!(handle.play(), TransportState::Stopped);
        assert_eq!(handle.toggle(), TransportState::Stopped);
        assert!(!handle.is_playing());
    }

    #[test]
    fn transport_transitions() {
        let (_core, handle) = prepared();
        handle.load_song(song_with_beat());
        assert_eq!(handle.play(), TransportState::Playing);
        assert_eq!(handle.pause(), TransportState::Paused);
        assert_eq!(handle.pause(), TransportState::Paused);
        assert_eq!(handle.toggle(), TransportState::Playing);
        assert_eq!(handle.toggle(), TransportState::Paused);
        assert_eq!(handle.stop(), TransportState::Stopped);
        assert_eq!(handle.pause(), TransportState::Stopped);
    }

    #[test]
    fn renders_only_while_playing() {
        let (mut core, handle) = prepared();
        let song = song_with_beat();
        handle.load_song(Arc::clone(&song));

        let mut out = vec![1.0; 256];
        core.render_block(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(song.position(), 0.0);

        handle.play();
        core.render_block(&mut out, 2);
        assert!(out.iter().any(|&s| s != 0.0));
        assert_eq!(song.position(), 128.0 / 48_000.0);

        handle.pause();
        core.render_block(&mut out, 2);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(song.position(), 128.0 / 48_000.0);
    }

    #[test]
    fn master_volume_is_clamped() {
        let (_core, handle) = prepared();
        assert_eq!(handle.master_volume(), DEFAULT_MASTER_VOLUME);
        assert_eq!(handle.set_master_volume(2.0), 1.0);
        assert_eq!(handle.set_master_volume(-1.0), 0.0);
        assert_eq!(handle.set_master_volume(f32::NAN), 0.0);
    }

    #[test]
    fn replaced_songs_are_freed_on_the_control_side() {
        let (_core, handle) = prepared();
        handle.load_song(song_with_beat());
        handle.load_song(song_with_beat());
        assert_eq!(handle.pending_retired(), 0);

        let held = handle.active_song().unwrap();
        handle.load_song(song_with_beat());
        assert_eq!(handle.pending_retired(), 1);
        drop(held);
        assert_eq!(handle.collect_garbage(), 1);
    }

    #[test]
    fn switching_back_and_forth_does_not_leak_songs() {
        let (_core, handle) = prepared();
        let a = song_with_beat();
        let b = song_with_beat();
        for i in 0..100 {
            handle.load_song(Arc::clone(if i % 2 == 0 { &a } else { &b }));
        }
        handle.load_song(Arc::clone(&b));
        assert!(handle.pending_retired() <= 1);

        handle.unload_song();
        drop(a);
        drop(b);
        handle.collect_garbage();
        assert_eq!(handle.pending_retired(), 0);
    }

    #[test]
    fn reloading_the_active_song_does_not_retire_it() {
        let (_core, handle) = prepared();
        let song = song_with_beat();
        handle.load_song(Arc::clone(&song));
        handle.load_song(Arc::clone(&song));
        assert_eq!(handle.pending_retired(), 0);
        assert!(Arc::ptr_eq(&handle.active_song().unwrap(), &song));
    }

    #[test]
    fn stop_rewinds_the_song_it_stopped() {
        let (mut core, handle) = prepared();
        let song = song_with_beat();
        handle.load_song(Arc::clone(&song));
        handle.play();
        let mut out = vec![0.0; 256];
        core.render_block(&mut out, 2);
        assert!(song.position() > 0.0);

        handle.stop();
        assert_eq!(song.position(), 0.0);
        core.render_block(&mut out, 2);
        assert_eq!(song.position(), 0.0);
    }

    #[test]
    fn unload_stops_and_clears() {
        let (_core, handle) = prepared();
        let song = song_with_beat();
        handle.load_song(Arc::clone(&song));
        handle.play();
        let old = handle.unload_song().unwrap();
        assert!(Arc::ptr_eq(&old, &song));
        assert_eq!(handle.state(), TransportState::Stopped);
        assert!(!handle.has_song());
        assert!(handle.unload_song().is_none());
    }
}

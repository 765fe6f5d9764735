//! A song: tempo, playback position and a track collection.
//!
//! All state the render thread reads is either an atomic scalar or an
//! `ArcSwap` pointer, so every method takes `&self` and a song can be
//! edited while it plays.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use arrayvec::ArrayString;
use bl_dsp::{AudioBuffer, AudioContext, BlockClock, SongId, TrackId};

use crate::aggregator::TrackAggregator;
use crate::error::EngineError;
use crate::retire::RetireList;
use crate::track::Track;

/// Longest title kept; longer titles are cut at a char boundary.
pub const MAX_TITLE_LEN: usize = 32;

pub struct Song {
    id: SongId,
    title: ArrayString<MAX_TITLE_LEN>,
    tempo_bits: AtomicU32,
    position_bits: AtomicU64,
    tracks: ArcSwap<TrackAggregator>,
    retired: RetireList<TrackAggregator>,
}

impl Song {
    pub const DEFAULT_TEMPO: f32 = 120.0;

    pub fn new(title: &str) -> Self {
        Self {
            id: SongId::generate(),
            title: truncate_title(title),
            tempo_bits: AtomicU32::new(Self::DEFAULT_TEMPO.to_bits()),
            position_bits: AtomicU64::new(0.0f64.to_bits()),
            tracks: ArcSwap::from_pointee(TrackAggregator::new()),
            retired: RetireList::new(),
        }
    }

    pub fn with_tempo(title: &str, bpm: f32) -> Result<Self, EngineError> {
        let song = Self::new(title);
        song.set_tempo(bpm)?;
        Ok(song)
    }

    pub fn id(&self) -> SongId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tempo(&self) -> f32 {
        f32::from_bits(self.tempo_bits.load(Ordering::Relaxed))
    }

    /// Tempo in BPM. Must be finite and positive.
    pub fn set_tempo(&self, bpm: f32) -> Result<(), EngineError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(EngineError::invalid("tempo", bpm));
        }
        self.tempo_bits.store(bpm.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Playback position in seconds.
    pub fn position(&self) -> f64 {
        f64::from_bits(self.position_bits.load(Ordering::Acquire))
    }

    pub fn set_position(&self, seconds: f64) -> Result<(), EngineError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(EngineError::invalid("position", seconds));
        }
        self.position_bits.store(seconds.to_bits(), Ordering::Release);
        Ok(())
    }

    pub fn rewind(&self) {
        self.position_bits.store(0.0f64.to_bits(), Ordering::Release);
    }

    /// Append a track. Safe while the song is playing: the track is heard
    /// from the next block on.
    pub fn add_track(&self, track: impl Into<Track>) -> Arc<Track> {
        let track = Arc::new(track.into());
        let old = self.tracks.rcu(|current| {
            let mut next = TrackAggregator::clone(current);
            next.add_track(Arc::clone(&track));
            next
        });
        self.retire(old);
        log::debug!("song {}: added track {}", self.id, track.id());
        track
    }

    pub fn remove_track(&self, id: &TrackId) -> Option<Arc<Track>> {
        let current = self.tracks.load_full();
        let mut next = TrackAggregator::clone(&current);
        let removed = next.remove_track(id)?;
        // Control mutations are serialised by the caller, so a plain swap
        // cannot lose a concurrent edit.
        let old = self.tracks.swap(Arc::new(next));
        drop(current);
        self.retire(old);
        log::debug!("song {}: removed track {}", self.id, id);
        Some(removed)
    }

    pub fn track(&self, id: &TrackId) -> Option<Arc<Track>> {
        self.tracks.load().track(id).cloned()
    }

    /// Snapshot of the current track collection.
    pub fn tracks(&self) -> Arc<TrackAggregator> {
        self.tracks.load_full()
    }

    pub fn track_count(&self) -> usize {
        self.tracks.load().len()
    }

    /// Free replaced track collections the render thread no longer sees.
    pub fn collect_retired(&self) -> usize {
        self.retired.collect()
    }

    /// Mix `num_samples` frames of every track into `mix` starting at the
    /// current position, then advance the position.
    ///
    /// Realtime-safe. If the position was changed from another thread
    /// during the block, that change is kept and the advance is dropped.
    pub fn render(
        &self,
        mix: &mut AudioBuffer,
        scratch: &mut [f32],
        num_samples: usize,
        ctx: &AudioContext,
    ) {
        let start_bits = self.position_bits.load(Ordering::Acquire);
        let clock = BlockClock {
            start_sec: f64::from_bits(start_bits),
            tempo_bpm: self.tempo(),
            sample_rate: ctx.sample_rate,
        };

        self.tracks.load().render_tracks(mix, scratch, num_samples, &clock);

        let next = clock.start_sec + ctx.frames_to_seconds(num_samples);
        let _ = self.position_bits.compare_exchange(
            start_bits,
            next.to_bits(),
            Ordering::AcqRel,
            Ordering::Relaxed,
        );
    }

    fn retire(&self, old: Arc<TrackAggregator>) {
        self.retired.retire(old);
        self.retired.collect();
    }
}

impl std::fmt::Debug for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Song")
            .field("id", &self.id)
            .field("title", &self.title.as_str())
            .field("tempo", &self.tempo())
            .field("position", &self.position())
            .field("tracks", &self.track_count())
            .finish()
    }
}

fn truncate_title(title: &str) -> ArrayString<MAX_TITLE_LEN> {
    let mut out = ArrayString::new();
    for c in title.chars() {
        if out.try_push(c).is_err() {
            break;
        }
    }
    out
}

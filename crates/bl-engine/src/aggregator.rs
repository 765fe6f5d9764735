//! Ordered track collection that renders and sums its tracks.

use std::sync::Arc;

use bl_dsp::{AudioBuffer, BlockClock, TrackId};

use crate::track::Track;

/// The tracks of one song, in mix order.
///
/// An aggregator is never mutated while the render thread can see it:
/// `Song` clones it, edits the clone and swaps the clone in. Cloning only
/// copies `Arc` handles, so control-side handles keep pointing at the
/// tracks being rendered.
#[derive(Clone, Debug, Default)]
pub struct TrackAggregator {
    tracks: Vec<Arc<Track>>,
}

impl TrackAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, track: Arc<Track>) {
        self.tracks.push(track);
    }

    /// Remove a track by id, keeping the order of the rest.
    pub fn remove_track(&mut self, id: &TrackId) -> Option<Arc<Track>> {
        let idx = self.tracks.iter().position(|t| t.id() == *id)?;
        Some(self.tracks.remove(idx))
    }

    pub fn track(&self, id: &TrackId) -> Option<&Arc<Track>> {
        self.tracks.iter().find(|t| t.id() == *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Track>> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Render every unmuted track into `scratch` and add it to each channel
    /// of `mix` with its pan gains. No clipping.
    ///
    /// `num_samples` is clipped to the scratch and mix capacity.
    pub fn render_tracks(
        &self,
        mix: &mut AudioBuffer,
        scratch: &mut [f32],
        num_samples: usize,
        clock: &BlockClock,
    ) {
        let n = num_samples.min(scratch.len()).min(mix.frames());
        let scratch = &mut scratch[..n];

        for track in &self.tracks {
            if track.is_muted() {
                continue;
            }
            scratch.fill(0.0);
            track.render_block(scratch, 0, n, clock);

            let (left, right) = track.controls().pan_gains();
            for ch in 0..mix.channels() {
                let gain = match ch {
                    0 => left,
                    1 => right,
                    _ => 1.0,
                };
                mix.add_mono(ch, scratch, gain);
            }
        }
    }
}

//! Songs known to the controller, addressed by a stable key.

use std::sync::Arc;

use bl_dsp::{SongId, TrackId};
use slotmap::{Key, KeyData, SlotMap};

use crate::song::Song;
use crate::track::Track;

slotmap::new_key_type! {
    /// Stable handle to a song in a `SongRegistry`.
    pub struct SongKey;
}

impl SongKey {
    /// Integer form for crossing a command boundary.
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Inverse of `to_raw`. Any value is accepted; lookups of keys that
    /// were never issued simply miss.
    pub fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

/// Owns every loaded song. Control-side only.
#[derive(Debug, Default)]
pub struct SongRegistry {
    songs: SlotMap<SongKey, Arc<Song>>,
}

impl SongRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, song: Song) -> SongKey {
        self.insert_shared(Arc::new(song))
    }

    pub fn insert_shared(&mut self, song: Arc<Song>) -> SongKey {
        let id = song.id();
        let key = self.songs.insert(song);
        log::debug!("registered song {id} as {}", key.to_raw());
        key
    }

    pub fn get(&self, key: SongKey) -> Option<&Arc<Song>> {
        self.songs.get(key)
    }

    pub fn get_raw(&self, raw: u64) -> Option<&Arc<Song>> {
        self.get(SongKey::from_raw(raw))
    }

    pub fn remove(&mut self, key: SongKey) -> Option<Arc<Song>> {
        self.songs.remove(key)
    }

    pub fn find(&self, id: &SongId) -> Option<(SongKey, &Arc<Song>)> {
        self.songs.iter().find(|(_, song)| song.id() == *id)
    }

    /// Key of a registered song, compared by identity.
    pub fn key_of(&self, song: &Arc<Song>) -> Option<SongKey> {
        self.songs
            .iter()
            .find(|(_, s)| Arc::ptr_eq(s, song))
            .map(|(key, _)| key)
    }

    /// Search every song for a track.
    pub fn find_track(&self, id: &TrackId) -> Option<Arc<Track>> {
        self.songs.values().find_map(|song| song.track(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SongKey, &Arc<Song>)> {
        self.songs.iter()
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

//! Plain snapshots of engine objects for reporting.

use bl_dsp::{SongId, TrackId, Waveform};
use bl_engine::{Song, SongKey, Track, TransportState};

#[derive(Clone, Debug, PartialEq)]
pub struct TrackSummary {
    pub id: TrackId,
    pub frequency_hz: f32,
    pub waveform: Waveform,
    pub volume: f32,
    pub pan: f32,
    pub muted: bool,
}

impl TrackSummary {
    pub fn of(track: &Track) -> Self {
        let Track::Beat(beat) = track;
        Self {
            id: track.id(),
            frequency_hz: beat.frequency_hz(),
            waveform: beat.waveform(),
            volume: track.volume(),
            pan: track.pan(),
            muted: track.is_muted(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SongSummary {
    pub key: u64,
    pub id: SongId,
    pub title: String,
    pub tempo: f32,
    pub position: f64,
    pub active: bool,
    pub tracks: Vec<TrackSummary>,
}

impl SongSummary {
    pub fn of(key: SongKey, song: &Song, active: bool) -> Self {
        Self {
            key: key.to_raw(),
            id: song.id(),
            title: song.title().to_owned(),
            tempo: song.tempo(),
            position: song.position(),
            active,
            tracks: song.tracks().iter().map(|t| TrackSummary::of(t)).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatusReport {
    pub state: TransportState,
    pub master_volume: f32,
    /// Registry key of the active song, if it is registered.
    pub active_song: Option<u64>,
    /// Position of the active song in seconds.
    pub position: Option<f64>,
}

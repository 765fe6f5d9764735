//! Commands accepted by the controller and what they answer.

use bl_dsp::{Adsr, TrackId, Waveform};
use bl_engine::{EngineError, TransportState};
use thiserror::Error;

use crate::summary::{SongSummary, StatusReport};

/// Everything needed to build a beat track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatTrackParams {
    pub frequency_hz: f32,
    pub waveform: Waveform,
    pub envelope: Adsr,
    pub note_duration: f32,
    pub volume: f32,
    pub pan: f32,
}

impl Default for BeatTrackParams {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            waveform: Waveform::Sine,
            envelope: Adsr::default(),
            note_duration: 0.2,
            volume: 0.4,
            pan: 0.0,
        }
    }
}

/// Songs are addressed by the raw form of their registry key.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    TogglePlayback,
    SwitchSong { song: u64 },
    SetVolume { track: TrackId, volume: f32 },
    SetMute { track: TrackId, muted: bool },
    SetPan { track: TrackId, pan: f32 },
    /// Tempo of the active song.
    SetTempo { bpm: f32 },
    SetMasterVolume { volume: f32 },
    CreateSong { title: String, tempo: Option<f32> },
    RemoveSong { song: u64 },
    AddTrack { song: u64, track: BeatTrackParams },
    RemoveTrack { song: u64, track: TrackId },
    ListSongs,
    Status,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Stop => "stop",
            Command::TogglePlayback => "toggle",
            Command::SwitchSong { .. } => "switch-song",
            Command::SetVolume { .. } => "set-volume",
            Command::SetMute { .. } => "set-mute",
            Command::SetPan { .. } => "set-pan",
            Command::SetTempo { .. } => "set-tempo",
            Command::SetMasterVolume { .. } => "set-master-volume",
            Command::CreateSong { .. } => "create-song",
            Command::RemoveSong { .. } => "remove-song",
            Command::AddTrack { .. } => "add-track",
            Command::RemoveTrack { .. } => "remove-track",
            Command::ListSongs => "list-songs",
            Command::Status => "status",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// Transport state after the command.
    Transport(TransportState),
    /// The value actually stored, after clamping.
    Value(f32),
    SongCreated { song: u64 },
    TrackAdded { track: TrackId },
    Songs(Vec<SongSummary>),
    Status(StatusReport),
    Done,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("no song with id {0}")]
    InvalidSongId(u64),
    #[error("no track with id {0}")]
    UnknownTrack(String),
    #[error("no active song")]
    NoActiveSong,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CommandError {
    pub(crate) fn unknown_track(id: &TrackId) -> Self {
        CommandError::UnknownTrack(id.as_str().to_owned())
    }
}

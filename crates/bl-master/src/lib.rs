//! Headless controller for beatloom.
//!
//! The command boundary between whatever drives the engine (the CLI, a
//! network layer) and the engine itself. It owns the song registry and the
//! engine's control handle and executes one `Command` at a time.

mod command;
mod summary;

use std::sync::Arc;

use bl_audio::{AudioOutput, CpalOutput};
use bl_dsp::{TrackId, WaveTableBank};
use bl_engine::{
    BeatTrack, EngineCore, EngineError, EngineHandle, Song, SongKey, SongRegistry, Track,
};

pub use bl_audio::AudioError;
pub use command::{BeatTrackParams, Command, CommandError, Response};
pub use summary::{SongSummary, StatusReport, TrackSummary};

/// Owns every song and drives one engine.
pub struct Controller {
    songs: SongRegistry,
    engine: EngineHandle,
    tables: WaveTableBank,
    output: Option<CpalOutput>,
}

impl Controller {
    /// Controller over an engine whose `EngineCore` is driven elsewhere.
    pub fn new(engine: EngineHandle) -> Self {
        Self {
            songs: SongRegistry::new(),
            engine,
            tables: WaveTableBank::new(),
            output: None,
        }
    }

    /// Engine plus controller with no device attached. The caller renders
    /// by calling `EngineCore::render_block` itself.
    pub fn headless() -> (Self, EngineCore) {
        let (core, handle) = EngineCore::new();
        (Self::new(handle), core)
    }

    /// Controller playing through the default output device.
    pub fn with_default_output() -> Result<Self, AudioError> {
        let (core, handle) = EngineCore::new();
        let mut output = CpalOutput::open(core)?;
        output.start()?;
        let mut controller = Self::new(handle);
        controller.output = Some(output);
        Ok(controller)
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    pub fn songs(&self) -> &SongRegistry {
        &self.songs
    }

    pub fn output(&self) -> Option<&dyn AudioOutput> {
        self.output.as_ref().map(|o| o as &dyn AudioOutput)
    }

    /// Register `song` and make it the active song.
    pub fn load_song(&mut self, song: Arc<Song>) -> SongKey {
        let key = match self.songs.key_of(&song) {
            Some(key) => key,
            None => self.songs.insert_shared(Arc::clone(&song)),
        };
        self.engine.load_song(song);
        key
    }

    /// Build a beat track from `params` using the shared wave tables.
    pub fn build_track(&self, params: &BeatTrackParams) -> Result<BeatTrack, CommandError> {
        if !params.frequency_hz.is_finite() || params.frequency_hz <= 0.0 {
            return Err(EngineError::InvalidParameter {
                name: "frequency",
                value: params.frequency_hz as f64,
            }
            .into());
        }
        let track = BeatTrack::new(params.frequency_hz, self.tables.get(params.waveform))
            .with_envelope(params.envelope)
            .with_note_duration(params.note_duration);
        track.controls().set_volume(params.volume);
        track.controls().set_pan(params.pan);
        Ok(track)
    }

    /// Free objects the render thread has released. Call periodically.
    pub fn maintain(&self) -> usize {
        let mut freed = self.engine.collect_garbage();
        for (_, song) in self.songs.iter() {
            freed += song.collect_retired();
        }
        freed
    }

    pub fn execute(&mut self, command: Command) -> Result<Response, CommandError> {
        log::debug!("command: {}", command.name());
        let result = self.dispatch(command);
        if let Err(e) = &result {
            log::warn!("command failed: {e}");
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<Response, CommandError> {
        match command {
            Command::Play => Ok(Response::Transport(self.engine.play())),
            Command::Pause => Ok(Response::Transport(self.engine.pause())),
            Command::Stop => Ok(Response::Transport(self.engine.stop())),
            Command::TogglePlayback => Ok(Response::Transport(self.engine.toggle())),

            Command::SwitchSong { song } => {
                let song = Arc::clone(self.song(song)?);
                self.engine.load_song(song);
                Ok(Response::Transport(self.engine.state()))
            }

            Command::SetVolume { track, volume } => {
                Ok(Response::Value(self.track(&track)?.set_volume(volume)))
            }
            Command::SetMute { track, muted } => {
                self.track(&track)?.set_mute(muted);
                Ok(Response::Done)
            }
            Command::SetPan { track, pan } => Ok(Response::Value(self.track(&track)?.set_pan(pan))),

            Command::SetTempo { bpm } => {
                let song = self.engine.active_song().ok_or(CommandError::NoActiveSong)?;
                song.set_tempo(bpm)?;
                Ok(Response::Done)
            }
            Command::SetMasterVolume { volume } => {
                Ok(Response::Value(self.engine.set_master_volume(volume)))
            }

            Command::CreateSong { title, tempo } => {
                let song = match tempo {
                    Some(bpm) => Song::with_tempo(&title, bpm)?,
                    None => Song::new(&title),
                };
                let key = self.songs.insert(song);
                Ok(Response::SongCreated { song: key.to_raw() })
            }
            Command::RemoveSong { song } => {
                let key = SongKey::from_raw(song);
                let removed = self.songs.remove(key).ok_or(CommandError::InvalidSongId(song))?;
                if self
                    .engine
                    .active_song()
                    .is_some_and(|active| Arc::ptr_eq(&active, &removed))
                {
                    self.engine.unload_song();
                }
                log::info!("removed song {}", removed.id());
                Ok(Response::Done)
            }

            Command::AddTrack { song, track } => {
                let target = Arc::clone(self.song(song)?);
                let beat = self.build_track(&track)?;
                let added = target.add_track(beat);
                Ok(Response::TrackAdded { track: added.id() })
            }
            Command::RemoveTrack { song, track } => {
                self.song(song)?
                    .remove_track(&track)
                    .ok_or_else(|| CommandError::unknown_track(&track))?;
                Ok(Response::Done)
            }

            Command::ListSongs => Ok(Response::Songs(self.list_songs())),
            Command::Status => Ok(Response::Status(self.status())),
        }
    }

    pub fn list_songs(&self) -> Vec<SongSummary> {
        let active = self.engine.active_song();
        self.songs
            .iter()
            .map(|(key, song)| {
                let is_active = active.as_ref().is_some_and(|a| Arc::ptr_eq(a, song));
                SongSummary::of(key, song, is_active)
            })
            .collect()
    }

    pub fn status(&self) -> StatusReport {
        let active = self.engine.active_song();
        StatusReport {
            state: self.engine.state(),
            master_volume: self.engine.master_volume(),
            active_song: active
                .as_ref()
                .and_then(|s| self.songs.key_of(s))
                .map(SongKey::to_raw),
            position: active.as_ref().map(|s| s.position()),
        }
    }

    fn song(&self, raw: u64) -> Result<&Arc<Song>, CommandError> {
        self.songs.get_raw(raw).ok_or(CommandError::InvalidSongId(raw))
    }

    fn track(&self, id: &TrackId) -> Result<Arc<Track>, CommandError> {
        self.songs
            .find_track(id)
            .ok_or_else(|| CommandError::unknown_track(id))
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(output) = self.output.as_mut() {
            if let Err(e) = output.stop() {
                log::warn!("failed to stop output: {e}");
            }
        }
    }
}

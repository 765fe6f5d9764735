//! Tracks: one tone generator each, with mixer controls.
//!
//! Track kinds form a closed enum. A beat track has no per-instance phase:
//! the envelope position and oscillator phase are recomputed from absolute
//! song time and the current tempo for every sample, so a track can be
//! evaluated at any instant and is shared read-only with the render thread.
//! A tempo change moves the beat grid retroactively.

use std::f32::consts::TAU;
use std::sync::Arc;

use bl_dsp::{Adsr, BlockClock, TrackId, WaveTable, Waveform};

use crate::controls::TrackControls;

/// A tone re-triggered on every beat, shaped by an ADSR envelope.
#[derive(Debug)]
pub struct BeatTrack {
    id: TrackId,
    controls: TrackControls,
    frequency_hz: f32,
    note_duration: f32,
    envelope: Adsr,
    wave_table: Arc<WaveTable>,
}

impl BeatTrack {
    pub const DEFAULT_NOTE_DURATION: f32 = 0.2;

    pub fn new(frequency_hz: f32, wave_table: Arc<WaveTable>) -> Self {
        Self {
            id: TrackId::generate(),
            controls: TrackControls::new(),
            frequency_hz,
            note_duration: Self::DEFAULT_NOTE_DURATION,
            envelope: Adsr::default(),
            wave_table,
        }
    }

    pub fn with_envelope(mut self, envelope: Adsr) -> Self {
        self.envelope = envelope;
        self
    }

    /// Gate length of each note in seconds (negative becomes zero).
    pub fn with_note_duration(mut self, seconds: f32) -> Self {
        self.note_duration = if seconds > 0.0 { seconds } else { 0.0 };
        self
    }

    pub fn with_id(mut self, id: TrackId) -> Self {
        self.id = id;
        self
    }

    pub fn controls(&self) -> &TrackControls {
        &self.controls
    }

    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    pub fn note_duration(&self) -> f32 {
        self.note_duration
    }

    pub fn envelope(&self) -> Adsr {
        self.envelope
    }

    pub fn waveform(&self) -> Waveform {
        self.wave_table.waveform()
    }

    /// Unscaled voice output at `time_sec` for `tempo_bpm`.
    fn voice_sample(&self, time_sec: f64, tempo_bpm: f32) -> f32 {
        if tempo_bpm.is_nan() || tempo_bpm <= 0.0 {
            return 0.0;
        }
        let interval = 60.0 / tempo_bpm as f64;
        let since_beat = time_sec.rem_euclid(interval);
        let tail_end = self.envelope.tail_end(self.note_duration) as f64;
        if since_beat.is_nan() || since_beat >= tail_end {
            return 0.0;
        }

        let level = self.envelope.level(since_beat as f32, self.note_duration);

        // Whole cycles are dropped in f64 so the table lookup stays within
        // one period however long the beat is.
        let cycles = self.frequency_hz as f64 * since_beat;
        let phase = TAU * (cycles - cycles.floor()) as f32;

        level * self.wave_table.sample_interpolated(phase)
    }
}

/// Every track kind the engine can render.
#[derive(Debug)]
pub enum Track {
    Beat(BeatTrack),
}

impl Track {
    pub fn id(&self) -> TrackId {
        match self {
            Track::Beat(beat) => beat.id,
        }
    }

    pub fn controls(&self) -> &TrackControls {
        match self {
            Track::Beat(beat) => beat.controls(),
        }
    }

    pub fn volume(&self) -> f32 {
        self.controls().volume()
    }

    /// Clamp to `[0, 1]` and store. Returns the stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        self.controls().set_volume(volume)
    }

    pub fn pan(&self) -> f32 {
        self.controls().pan()
    }

    pub fn set_pan(&self, pan: f32) -> f32 {
        self.controls().set_pan(pan)
    }

    pub fn is_muted(&self) -> bool {
        self.controls().is_muted()
    }

    pub fn set_mute(&self, muted: bool) {
        self.controls().set_muted(muted)
    }

    /// Output at absolute song time `time_sec`.
    ///
    /// A muted track returns exactly `0.0` without evaluating the voice.
    pub fn sample_at(&self, time_sec: f64, tempo_bpm: f32) -> f32 {
        let controls = self.controls();
        if controls.is_muted() {
            return 0.0;
        }
        self.voice_sample(time_sec, tempo_bpm) * controls.volume()
    }

    /// Write `num_samples` samples starting at `buffer[start_sample]`, the
    /// first one at `clock.start_sec`.
    ///
    /// The range is clipped to the buffer. Realtime-safe: no allocation, no
    /// locking.
    pub fn render_block(
        &self,
        buffer: &mut [f32],
        start_sample: usize,
        num_samples: usize,
        clock: &BlockClock,
    ) {
        let end = start_sample.saturating_add(num_samples).min(buffer.len());
        let Some(out) = buffer.get_mut(start_sample..end) else {
            return;
        };

        let controls = self.controls();
        if controls.is_muted() {
            out.fill(0.0);
            return;
        }
        let volume = controls.volume();

        for (i, sample) in out.iter_mut().enumerate() {
            *sample = self.voice_sample(clock.time_at(i), clock.tempo_bpm) * volume;
        }
    }

    fn voice_sample(&self, time_sec: f64, tempo_bpm: f32) -> f32 {
        match self {
            Track::Beat(beat) => beat.voice_sample(time_sec, tempo_bpm),
        }
    }
}

impl From<BeatTrack> for Track {
    fn from(beat: BeatTrack) -> Self {
        Track::Beat(beat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 44_100.0;
    const TEMPO: f32 = 120.0;

    fn sine() -> Arc<WaveTable> {
        Arc::new(WaveTable::new(Waveform::Sine))
    }

    fn scenario_track() -> Track {
        BeatTrack::new(440.0, sine())
            .with_envelope(Adsr::new(0.01, 0.02, 0.8, 0.02))
            .with_note_duration(0.15)
            .into()
    }

    fn rms(track: &Track, start: f64, samples: usize) -> f32 {
        let sum: f32 = (0..samples)
            .map(|i| {
                let s = track.sample_at(start + i as f64 / SAMPLE_RATE, TEMPO);
                s * s
            })
            .sum();
        (sum / samples as f32).sqrt()
    }

    #[test]
    fn default_track_is_audible_on_the_beat() {
        let track: Track = BeatTrack::new(440.0, sine()).into();
        assert!(rms(&track, 0.0, 200) > 0.01);
    }

    #[test]
    fn muted_track_is_exactly_silent() {
        let track = scenario_track();
        track.set_mute(true);
        for i in 0..2000 {
            let t = i as f64 * 0.00037;
            assert_eq!(track.sample_at(t, TEMPO).to_bits(), 0.0f32.to_bits());
        }

        let mut buf = [1.0; 64];
        let clock = BlockClock { start_sec: 0.05, tempo_bpm: TEMPO, sample_rate: SAMPLE_RATE };
        track.render_block(&mut buf, 0, 64, &clock);
        assert!(buf.iter().all(|s| s.to_bits() == 0.0f32.to_bits()));
    }

    #[test]
    fn attack_grows_louder() {
        let track = scenario_track();
        let a = rms(&track, 0.001, 50);
        let b = rms(&track, 0.005, 50);
        let c = rms(&track, 0.008, 50);
        assert!(b > a);
        assert!(c > b);
    }

    #[test]
    fn sustain_plateau_is_stable() {
        let track = scenario_track();
        let early = rms(&track, 0.05, 100);
        let late = rms(&track, 0.08, 100);
        assert!(early > 0.01);
        assert!((early - late).abs() < early * 0.2);
        assert!(track.sample_at(0.2, TEMPO).abs() < 0.01);
    }

    #[test]
    fn release_fades_out() {
        let track = scenario_track();
        let start = rms(&track, 0.150, 40);
        let mid = rms(&track, 0.160, 40);
        assert!(mid < start);
        assert!(rms(&track, 0.169, 40) < 0.1);
    }

    #[test]
    fn silence_between_notes() {
        let track = scenario_track();
        // note + release ends at 0.17 s, next beat at 0.5 s
        for i in 0..1000 {
            let t = 0.171 + 0.328 * i as f64 / 1000.0;
            assert_eq!(track.sample_at(t, TEMPO), 0.0, "t = {t}");
        }
    }

    #[test]
    fn output_repeats_every_beat() {
        let track = scenario_track();
        let interval = 60.0 / TEMPO as f64;
        for i in 0..500 {
            let t = i as f64 * 0.00091;
            let a = track.sample_at(t, TEMPO);
            let b = track.sample_at(t + interval, TEMPO);
            let c = track.sample_at(t + 3.0 * interval, TEMPO);
            assert!((a - b).abs() < 1e-3, "t = {t}: {a} vs {b}");
            assert!((a - c).abs() < 1e-3, "t = {t}: {a} vs {c}");
        }
    }

    #[test]
    fn beats_follow_tempo() {
        let track = scenario_track();
        let peak = |start: f64, tempo: f32| {
            (0..200)
                .map(|i| track.sample_at(start + i as f64 / SAMPLE_RATE, tempo).abs())
                .fold(0.0f32, f32::max)
        };
        // 120 BPM: beats at 0.5 s and 1.0 s. 60 BPM: only at 1.0 s.
        assert!(peak(0.55, 120.0) > 0.01);
        assert_eq!(peak(0.55, 60.0), 0.0);
        assert!(peak(1.05, 60.0) > 0.01);
    }

    #[test]
    fn volume_scales_rms_linearly() {
        let track = scenario_track();
        track.set_volume(0.25);
        let quiet = rms(&track, 0.05, 400);
        track.set_volume(0.5);
        let loud = rms(&track, 0.05, 400);
        assert!((loud / quiet - 2.0).abs() < 1e-3);
    }

    #[test]
    fn non_positive_tempo_is_silent() {
        let track = scenario_track();
        assert_eq!(track.sample_at(0.05, 0.0), 0.0);
        assert_eq!(track.sample_at(0.05, -120.0), 0.0);
        assert_eq!(track.sample_at(0.05, f32::NAN), 0.0);
    }

    #[test]
    fn render_block_matches_sample_at() {
        let track = scenario_track();
        let clock = BlockClock { start_sec: 0.04, tempo_bpm: TEMPO, sample_rate: SAMPLE_RATE };
        let mut buf = [0.0; 40];
        track.render_block(&mut buf, 8, 32, &clock);

        assert!(buf[..8].iter().all(|&s| s == 0.0));
        for (i, &s) in buf[8..].iter().enumerate() {
            assert_eq!(s, track.sample_at(clock.time_at(i), TEMPO));
        }
    }

    #[test]
    fn render_block_clips_to_buffer() {
        let track = scenario_track();
        let clock = BlockClock { start_sec: 0.05, tempo_bpm: TEMPO, sample_rate: SAMPLE_RATE };
        let mut buf = [0.0; 16];
        track.render_block(&mut buf, 10, 100, &clock);
        track.render_block(&mut buf, 100, 4, &clock);
        assert!(buf[10..].iter().any(|&s| s != 0.0));
    }
}

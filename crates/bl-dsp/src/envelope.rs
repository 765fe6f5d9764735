//! Stateless linear ADSR envelope.
//!
//! The level is a pure function of the time since the note started, so a
//! voice can be evaluated at any instant without walking a state machine
//! from the note start.
//!
//! ```text
//!   1.0 ┐  ╱╲
//!       │ ╱  ╲______
//!     S │╱          ╲
//!   0.0 └────────────╲──→ t
//!        A  D   S     R
//!                 ↑ note_duration
//! ```

/// Attack, decay and release durations in seconds, sustain as a level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    /// Durations below zero become zero, sustain is clamped to `[0, 1]`.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: non_negative(attack),
            decay: non_negative(decay),
            sustain: if sustain.is_nan() { 0.0 } else { sustain.clamp(0.0, 1.0) },
            release: non_negative(release),
        }
    }

    /// Time after note start at which the envelope is silent for good.
    pub fn tail_end(&self, note_duration: f32) -> f32 {
        note_duration + self.release
    }

    /// Envelope level `t` seconds after note start for a note held for
    /// `note_duration` seconds.
    ///
    /// Zero-length segments are skipped without dividing: `t < start + 0`
    /// is never true. Release ramps from whatever level the note held at
    /// `note_duration`, which is `sustain` for notes longer than
    /// `attack + decay`.
    pub fn level(&self, t: f32, note_duration: f32) -> f32 {
        if t.is_nan() || t < 0.0 {
            return 0.0;
        }
        let level = if t < note_duration {
            self.held_level(t)
        } else {
            let into_release = t - note_duration;
            if into_release >= self.release {
                return 0.0;
            }
            self.held_level(note_duration) * (1.0 - into_release / self.release)
        };
        level.clamp(0.0, 1.0)
    }

    /// Attack/decay/sustain portion, ignoring the gate.
    fn held_level(&self, t: f32) -> f32 {
        if t < self.attack {
            t / self.attack
        } else if t < self.attack + self.decay {
            1.0 + (self.sustain - 1.0) * (t - self.attack) / self.decay
        } else {
            self.sustain
        }
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(0.02, 0.02, 1.0, 0.02)
    }
}

fn non_negative(v: f32) -> f32 {
    if v > 0.0 {
        v
    } else {
        0.0
    }
}

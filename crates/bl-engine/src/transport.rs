//! Transport state machine.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Playback state of the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransportState {
    #[default]
    Stopped = 0,
    Playing = 1,
    Paused = 2,
}

impl TransportState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => TransportState::Playing,
            2 => TransportState::Paused,
            _ => TransportState::Stopped,
        }
    }

    /// State after `play`.
    pub fn played(self) -> Self {
        TransportState::Playing
    }

    /// State after `pause`: only a playing transport pauses.
    pub fn paused(self) -> Self {
        match self {
            TransportState::Playing => TransportState::Paused,
            other => other,
        }
    }

    /// State after `toggle`.
    pub fn toggled(self) -> Self {
        match self {
            TransportState::Playing => TransportState::Paused,
            TransportState::Stopped | TransportState::Paused => TransportState::Playing,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
        }
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lock-free cell holding a `TransportState`.
#[derive(Debug, Default)]
pub(crate) struct AtomicTransport(AtomicU8);

impl AtomicTransport {
    pub(crate) fn load(&self) -> TransportState {
        TransportState::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub(crate) fn store(&self, state: TransportState) {
        self.0.store(state as u8, Ordering::Relaxed);
    }

    /// Apply `f` atomically. Returns `(before, after)`.
    pub(crate) fn update(
        &self,
        f: impl Fn(TransportState) -> TransportState,
    ) -> (TransportState, TransportState) {
        let mut after = TransportState::Stopped;
        let before = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                after = f(TransportState::from_u8(v));
                Some(after as u8)
            })
            .map_or(TransportState::Stopped, TransportState::from_u8);
        (before, after)
    }
}

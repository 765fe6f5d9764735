//! Audio output trait and error types.

use bl_engine::EngineError;
use thiserror::Error;

/// Error type for audio operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Trait for audio output backends.
pub trait AudioOutput {
    /// Device sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Output channel count.
    fn channels(&self) -> u16;

    /// Start pulling blocks from the engine.
    fn start(&mut self) -> Result<(), AudioError>;

    /// Stop the device. The engine keeps its transport state.
    fn stop(&mut self) -> Result<(), AudioError>;
}

//! CPAL-based audio output backend.

use bl_engine::EngineCore;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, Stream, StreamConfig};

use crate::traits::{AudioError, AudioOutput};

/// Block size the engine is prepared with. The device may call back with
/// more frames; the engine splits those into several blocks.
const PREFERRED_BLOCK: u32 = 512;

/// Default output device driving an `EngineCore`.
pub struct CpalOutput {
    config: StreamConfig,
    stream: Stream,
}

impl CpalOutput {
    /// Open the default output device, prepare `engine` for it and move the
    /// engine into the device callback. The stream starts paused.
    pub fn open(mut engine: EngineCore) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;
        check_sample_format(supported.sample_format())?;
        let block = match supported.buffer_size() {
            cpal::SupportedBufferSize::Range { min, max } => PREFERRED_BLOCK.clamp(*min, *max),
            cpal::SupportedBufferSize::Unknown => PREFERRED_BLOCK,
        };

        let mut config: StreamConfig = supported.into();
        config.buffer_size = BufferSize::Fixed(block);

        engine.prepare(block as usize, config.sample_rate.0 as f64)?;

        let channels = config.channels as usize;
        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    engine.render_block(data, channels);
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        // Some hosts start streams on creation. The engine renders silence
        // until its transport plays, so a host that cannot pause is fine.
        if let Err(e) = stream.pause() {
            log::warn!("could not pause new stream: {e}");
        }

        log::info!(
            "opened output device {:?}: {} Hz, {} channels, {} frames",
            device.name().unwrap_or_default(),
            config.sample_rate.0,
            config.channels,
            block
        );

        Ok(Self { config, stream })
    }
}

/// The render callback writes `f32` frames only.
fn check_sample_format(format: SampleFormat) -> Result<(), AudioError> {
    match format {
        SampleFormat::F32 => Ok(()),
        other => Err(AudioError::DeviceInit(format!("unsupported sample format {other:?}"))),
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn channels(&self) -> u16 {
        self.config.channels
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::Playback(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::Playback(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_f32_devices_are_accepted() {
        assert!(check_sample_format(SampleFormat::F32).is_ok());
        for format in [SampleFormat::I16, SampleFormat::U16, SampleFormat::F64] {
            assert!(matches!(check_sample_format(format), Err(AudioError::DeviceInit(_))));
        }
    }
}

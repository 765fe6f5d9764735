//! Audio output backends for beatloom.
//!
//! A backend owns the `EngineCore` and calls `render_block` from the device
//! callback. Control happens through the `EngineHandle` kept by the caller.

mod cpal_backend;
mod traits;

pub use cpal_backend::CpalOutput;
pub use traits::{AudioError, AudioOutput};

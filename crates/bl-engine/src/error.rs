//! Engine error types.

use thiserror::Error;

/// Errors reported to control-side callers.
///
/// The render path never produces these; it degrades to silence instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A setter received a value outside its domain.
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    /// The engine has not been prepared for a device yet.
    #[error("engine has not been prepared")]
    NotReady,
}

impl EngineError {
    pub(crate) fn invalid(name: &'static str, value: impl Into<f64>) -> Self {
        EngineError::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}

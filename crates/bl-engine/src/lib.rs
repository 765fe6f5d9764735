//! Real-time render engine for beatloom.
//!
//! Songs hold beat tracks; the engine renders the active song into the
//! device buffer. The crate is split along the thread boundary:
//! `EngineCore` runs inside the audio callback, `EngineHandle`, `Song`,
//! `Track` and `SongRegistry` are used from control threads. Everything the
//! two sides share is an atomic or an `arc-swap` pointer.

mod aggregator;
mod controls;
mod engine;
mod error;
mod registry;
mod retire;
mod song;
mod track;
mod transport;

pub use aggregator::TrackAggregator;
pub use controls::TrackControls;
pub use engine::{EngineCore, EngineHandle, DEFAULT_MASTER_VOLUME};
pub use error::EngineError;
pub use registry::{SongKey, SongRegistry};
pub use song::{Song, MAX_TITLE_LEN};
pub use track::{BeatTrack, Track};
pub use transport::TransportState;
